use clap::Parser;
use contact_relay::utils::{logger, validation::Validate};
use contact_relay::{CliArgs, RelayConfig, RelayError};

fn load_dotenv() -> Option<&'static str> {
    // APP_ENV=production 時改讀 .env.production
    let file = match std::env::var("APP_ENV").as_deref() {
        Ok("production") => ".env.production",
        _ => ".env",
    };
    dotenvy::from_filename(file).ok().map(|_| file)
}

fn load_config(args: &CliArgs) -> contact_relay::Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = RelayConfig::from_file(path)?;
            // 環境變數仍然可以覆蓋檔案中的設定
            config.apply_lookup(&|key: &str| std::env::var(key).ok())?;
            config
        }
        None => RelayConfig::from_env()?,
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let dotenv_file = load_dotenv();

    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("Starting contact-relay");
    if let Some(file) = dotenv_file {
        tracing::debug!("Loaded environment from {file}");
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            let exit_code = match e {
                RelayError::IoError(_) => 3,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    };

    if args.verbose {
        tracing::debug!(
            mode = config.mode.as_str(),
            origins = ?config.allowed_origins(),
            smtp_configured = config.smtp.is_some(),
            "Relay config"
        );
    }

    contact_relay::server::run(config).await?;
    Ok(())
}
