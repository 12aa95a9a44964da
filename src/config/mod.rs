#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::rate_limit::RateLimitPolicy;
use crate::domain::model::Mode;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{
    is_valid_email, validate_non_empty_string, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const PRODUCTION_ORIGINS: &[&str] = &["https://meanx.ai", "https://www.meanx.ai"];
pub const DEVELOPMENT_ORIGINS: &[&str] = &["http://localhost:5173"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub mode: Mode,
    pub server: ServerSettings,
    pub smtp: Option<SmtpSettings>,
    pub disposable: DisposableSettings,
    pub mail: MailSettings,
    pub cors: CorsSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Number of reverse-proxy hops whose `X-Forwarded-For` entries are trusted.
    pub trust_proxy: usize,
    pub body_limit_bytes: usize,
    pub sweep_interval_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            trust_proxy: 1,
            body_limit_bytes: 10 * 1024 * 1024,
            sweep_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    #[default]
    Starttls,
    Tls,
    None,
}

impl FromStr for TlsMode {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(TlsMode::Starttls),
            "tls" | "ssl" => Ok(TlsMode::Tls),
            "none" | "plain" => Ok(TlsMode::None),
            other => Err(RelayError::InvalidConfigValueError {
                field: "SMTP_TLS".to_string(),
                value: other.to_string(),
                reason: "Expected 'starttls', 'tls' or 'none'".to_string(),
            }),
        }
    }
}

/// Authenticated SMTP relay. Present only when host, user and password are all set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_smtp_port() -> u16 {
    587
}

/// Disposable test sink used outside production when no SMTP relay is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisposableSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub preview_base: String,
}

impl Default for DisposableSettings {
    fn default() -> Self {
        Self {
            host: "smtp.ethereal.email".to_string(),
            port: 587,
            user: None,
            password: None,
            preview_base: "https://ethereal.email/message/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub from: String,
    pub recipient: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: "Meanx AI Contact <contact@meanx.ai>".to_string(),
            recipient: "contact@meanx.ai".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Empty means the built-in allow-list for the active mode.
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub global: RateLimitPolicy,
    pub contact: RateLimitPolicy,
    pub newsletter: RateLimitPolicy,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            global: RateLimitPolicy::global(),
            contact: RateLimitPolicy::contact(),
            newsletter: RateLimitPolicy::newsletter(),
        }
    }
}

impl RelayConfig {
    /// 從環境變數載入配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(&lookup)?;
        Ok(config)
    }

    /// Overlays any variables that are set on top of the current values.
    pub fn apply_lookup<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(mode) = var("APP_ENV") {
            self.mode = mode.parse()?;
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&var, "PORT")? {
            self.server.port = port;
        }
        if let Some(hops) = parse_var(&var, "TRUST_PROXY")? {
            self.server.trust_proxy = hops;
        }
        if let Some(limit) = parse_var(&var, "BODY_LIMIT_BYTES")? {
            self.server.body_limit_bytes = limit;
        }

        // SMTP 主機、帳號、密碼三者齊全才啟用正式傳輸
        if let (Some(host), Some(user), Some(password)) =
            (var("SMTP_HOST"), var("SMTP_USER"), var("SMTP_PASS"))
        {
            self.smtp = Some(SmtpSettings {
                host,
                port: parse_var(&var, "SMTP_PORT")?.unwrap_or_else(default_smtp_port),
                user,
                password,
                tls: parse_var(&var, "SMTP_TLS")?.unwrap_or_default(),
                timeout_seconds: parse_var(&var, "SMTP_TIMEOUT_SECS")?,
            });
        }

        if let Some(user) = var("ETHEREAL_USER") {
            self.disposable.user = Some(user);
        }
        if let Some(password) = var("ETHEREAL_PASS") {
            self.disposable.password = Some(password);
        }

        if let Some(recipient) = var("CONTACT_EMAIL") {
            self.mail.recipient = recipient;
        }
        if let Some(from) = var("MAIL_FROM") {
            self.mail.from = from;
        }

        if let Some(origins) = var("CORS_ORIGINS") {
            self.cors.origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(())
    }

    /// Origins allowed by CORS for the active mode.
    pub fn allowed_origins(&self) -> Vec<String> {
        if !self.cors.origins.is_empty() {
            return self.cors.origins.clone();
        }

        let mut origins: Vec<String> = PRODUCTION_ORIGINS.iter().map(|o| o.to_string()).collect();
        if !self.mode.is_production() {
            origins.extend(DEVELOPMENT_ORIGINS.iter().map(|o| o.to_string()));
        }
        origins
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| RelayError::InvalidConfigValueError {
                    field: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validate_positive_number(
            "server.body_limit_bytes",
            self.server.body_limit_bytes as u64,
            1024,
        )?;
        validate_positive_number(
            "server.sweep_interval_seconds",
            self.server.sweep_interval_seconds,
            1,
        )?;

        validate_non_empty_string("mail.from", &self.mail.from)?;
        if !is_valid_email(self.mail.recipient.trim()) {
            return Err(RelayError::InvalidConfigValueError {
                field: "mail.recipient".to_string(),
                value: self.mail.recipient.clone(),
                reason: "Recipient must be a valid email address".to_string(),
            });
        }

        for origin in self.allowed_origins() {
            validate_url("cors.origins", &origin)?;
        }

        for (name, policy) in [
            ("limits.global", self.limits.global),
            ("limits.contact", self.limits.contact),
            ("limits.newsletter", self.limits.newsletter),
        ] {
            validate_positive_number(
                &format!("{}.max_requests", name),
                u64::from(policy.max_requests),
                1,
            )?;
            validate_positive_number(&format!("{}.window_seconds", name), policy.window_seconds, 1)?;
        }

        match &self.smtp {
            Some(smtp) => {
                validate_non_empty_string("smtp.host", &smtp.host)?;
                validate_range("smtp.port", smtp.port, 1, u16::MAX)?;
                validate_non_empty_string("smtp.user", &smtp.user)?;
                if let Some(timeout) = smtp.timeout_seconds {
                    validate_positive_number("smtp.timeout_seconds", timeout, 1)?;
                }
            }
            None if self.mode.is_production() => {
                return Err(RelayError::MissingConfigError {
                    field: "SMTP_HOST, SMTP_USER and SMTP_PASS (required in production)"
                        .to_string(),
                });
            }
            None => {
                validate_non_empty_string("disposable.host", &self.disposable.host)?;
                validate_url("disposable.preview_base", &self.disposable.preview_base)?;
            }
        }

        tracing::debug!("✅ Relay configuration validation passed");
        Ok(())
    }
}
