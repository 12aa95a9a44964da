use crate::config::RelayConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "contact-relay")]
#[command(about = "Relays contact form submissions to an inbox over SMTP")]
pub struct CliArgs {
    #[arg(long, help = "TOML configuration file (environment variables are used otherwise)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Bind address, overrides HOST")]
    pub host: Option<String>,

    #[arg(long, help = "Listen port, overrides PORT")]
    pub port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
