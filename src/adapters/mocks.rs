//! In-memory doubles for the mail and subscription ports.
//!
//! Used by the test suites to assert how many dispatches happened and to
//! simulate transport failures without a mail server.

use crate::domain::model::{Delivery, NewsletterSignup, OutgoingMail};
use crate::domain::ports::{MailTransport, SubscriptionSink};
use crate::utils::error::{RelayError, Result, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Accepts every message and keeps a copy.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    preview_base: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a disposable sink and returns a preview link per message.
    pub fn with_previews(preview_base: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            preview_base: Some(preview_base.into()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, mail: &OutgoingMail) -> std::result::Result<Delivery, TransportError> {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(mail.clone());

        Ok(Delivery {
            message_id: mail.message_id.clone(),
            preview_url: self
                .preview_base
                .as_ref()
                .map(|base| format!("{}{}", base, sent.len())),
        })
    }
}

/// Fails every send with the given reason, counting attempts.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    reason: String,
    attempts: Arc<Mutex<usize>>,
}

impl FailingTransport {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: Arc::default(),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MailTransport for FailingTransport {
    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn send(&self, _mail: &OutgoingMail) -> std::result::Result<Delivery, TransportError> {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Err(TransportError::Rejected(self.reason.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    signups: Arc<Mutex<Vec<NewsletterSignup>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            signups: Arc::default(),
            fail: true,
        }
    }

    pub fn signups(&self) -> Vec<NewsletterSignup> {
        self.signups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SubscriptionSink for RecordingSink {
    async fn subscribe(&self, signup: &NewsletterSignup) -> Result<()> {
        if self.fail {
            return Err(RelayError::SubscriptionError {
                message: "subscription backend unavailable".to_string(),
            });
        }
        self.signups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signup.clone());
        Ok(())
    }
}
