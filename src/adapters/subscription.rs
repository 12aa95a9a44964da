use crate::domain::model::NewsletterSignup;
use crate::domain::ports::SubscriptionSink;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Records signups in the log for an external subscription system to pick up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriptionSink;

#[async_trait]
impl SubscriptionSink for LogSubscriptionSink {
    async fn subscribe(&self, signup: &NewsletterSignup) -> Result<()> {
        tracing::info!(email = %signup.email, "Newsletter signup");
        Ok(())
    }
}
