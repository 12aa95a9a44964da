use crate::domain::model::{Delivery, NewsletterSignup, OutgoingMail};
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Outbound mail transport. One `send` call is one delivery attempt.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short label for logs, e.g. `"smtp"` or `"disposable"`.
    fn kind(&self) -> &'static str;

    async fn send(&self, mail: &OutgoingMail) -> std::result::Result<Delivery, TransportError>;
}

/// Hand-off point for newsletter addresses.
#[async_trait]
pub trait SubscriptionSink: Send + Sync {
    async fn subscribe(&self, signup: &NewsletterSignup) -> Result<()>;
}

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Counter storage for fixed-window rate limiting.
///
/// `hit` must increment atomically per key and return the count inside the
/// window that is current at `now`, together with when that window ends.
pub trait CounterStore: Send + Sync + Debug {
    fn hit(&self, key: &str, now: Instant, window: Duration) -> (u32, Instant);

    /// Drop windows that ended before `now`; returns how many were removed.
    fn purge_expired(&self, now: Instant) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
