//! SMTP transports built on lettre.
//!
//! Two kinds exist: an authenticated relay for real delivery and a
//! disposable test sink (Ethereal-style) that hands back preview links.
//! Which one runs is decided once at startup by [`select_transport`].

use crate::config::{RelayConfig, TlsMode};
use crate::domain::model::{Delivery, OutgoingMail};
use crate::domain::ports::MailTransport;
use crate::utils::error::{RelayError, Result, TransportError};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

static PREVIEW_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MSGID=([^\s\]]+)").expect("preview token pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Authenticated,
    Disposable,
}

impl TransportKind {
    /// Picks the transport for a configuration, refusing to fall back in production.
    pub fn for_config(config: &RelayConfig) -> Result<Self> {
        match (&config.smtp, config.mode.is_production()) {
            (Some(_), _) => Ok(TransportKind::Authenticated),
            (None, true) => Err(RelayError::ConfigError {
                message: "production mode requires SMTP_HOST, SMTP_USER and SMTP_PASS".to_string(),
            }),
            (None, false) => Ok(TransportKind::Disposable),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::Authenticated => "smtp",
            TransportKind::Disposable => "disposable",
        }
    }
}

pub struct SmtpMailTransport {
    kind: TransportKind,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    preview_base: Option<Url>,
}

impl SmtpMailTransport {
    pub fn authenticated(config: &RelayConfig) -> Result<Self> {
        let smtp = config.smtp.as_ref().ok_or_else(|| RelayError::MissingConfigError {
            field: "smtp".to_string(),
        })?;

        let mailer = build_mailer(
            &smtp.host,
            smtp.port,
            smtp.tls,
            Some(Credentials::new(smtp.user.clone(), smtp.password.clone())),
            smtp.timeout_seconds.map(Duration::from_secs),
        )?;

        Ok(Self {
            kind: TransportKind::Authenticated,
            mailer,
            preview_base: None,
        })
    }

    pub fn disposable(config: &RelayConfig) -> Result<Self> {
        let settings = &config.disposable;
        let credentials = match (&settings.user, &settings.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => {
                tracing::warn!(
                    "ETHEREAL_USER/ETHEREAL_PASS not set; the disposable transport will likely reject sends"
                );
                None
            }
        };

        let preview_base =
            Url::parse(&settings.preview_base).map_err(|e| RelayError::InvalidConfigValueError {
                field: "disposable.preview_base".to_string(),
                value: settings.preview_base.clone(),
                reason: e.to_string(),
            })?;

        let mailer = build_mailer(
            &settings.host,
            settings.port,
            TlsMode::Starttls,
            credentials,
            None,
        )?;

        Ok(Self {
            kind: TransportKind::Disposable,
            mailer,
            preview_base: Some(preview_base),
        })
    }

    fn preview_url(&self, response: &Response) -> Option<String> {
        let base = self.preview_base.as_ref()?;
        response
            .message()
            .find_map(preview_token)
            .and_then(|token| base.join(token).ok())
            .map(String::from)
    }
}

fn build_mailer(
    host: &str,
    port: u16,
    tls: TlsMode,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match tls {
        TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
        TlsMode::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
    }
    .map_err(TransportError::from)?;

    let mut builder = builder.port(port);
    if let Some(credentials) = credentials {
        builder = builder.credentials(credentials);
    }
    // 未設定就沿用 lettre 的預設逾時
    if let Some(timeout) = timeout {
        builder = builder.timeout(Some(timeout));
    }

    Ok(builder.build())
}

fn preview_token(line: &str) -> Option<&str> {
    PREVIEW_TOKEN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn build_message(mail: &OutgoingMail) -> std::result::Result<Message, TransportError> {
    let message = Message::builder()
        .from(mail.from.parse::<Mailbox>()?)
        .reply_to(mail.reply_to.parse::<Mailbox>()?)
        .to(mail.to.parse::<Mailbox>()?)
        .subject(mail.subject.clone())
        .message_id(Some(mail.message_id.clone()))
        .multipart(MultiPart::alternative_plain_html(
            mail.text_body.clone(),
            mail.html_body.clone(),
        ))?;
    Ok(message)
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn kind(&self) -> &'static str {
        self.kind.label()
    }

    async fn send(&self, mail: &OutgoingMail) -> std::result::Result<Delivery, TransportError> {
        let message = build_message(mail)?;

        if !self.mailer.test_connection().await? {
            return Err(TransportError::Rejected(
                "SMTP connection verification failed".to_string(),
            ));
        }

        let response = self.mailer.send(message).await?;
        tracing::debug!(code = %response.code(), "SMTP server accepted message");

        Ok(Delivery {
            message_id: mail.message_id.clone(),
            preview_url: self.preview_url(&response),
        })
    }
}

/// Builds the one transport this process will use.
pub fn select_transport(config: &RelayConfig) -> Result<Arc<dyn MailTransport>> {
    let transport = match TransportKind::for_config(config)? {
        TransportKind::Authenticated => SmtpMailTransport::authenticated(config)?,
        TransportKind::Disposable => {
            tracing::warn!("No SMTP relay configured; using the disposable test transport");
            SmtpMailTransport::disposable(config)?
        }
    };
    Ok(Arc::new(transport))
}
