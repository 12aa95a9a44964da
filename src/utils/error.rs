use crate::domain::model::{FieldError, LimitScope};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Validation failed: {} field(s) rejected", errors.len())]
    ValidationError { errors: Vec<FieldError> },

    #[error("Rate limit exceeded ({scope})")]
    RateLimited { scope: LimitScope },

    #[error("Mail transport failure: {0}")]
    TransportError(#[from] TransportError),

    #[error("Subscription hand-off failed: {message}")]
    SubscriptionError { message: String },

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 郵件傳輸層錯誤，只寫進日誌，不回傳給呼叫端
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Transport rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
