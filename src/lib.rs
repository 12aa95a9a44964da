pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use api::{create_router, AppState};
pub use config::RelayConfig;
pub use core::relay::RelayEngine;
pub use utils::error::{RelayError, Result};
