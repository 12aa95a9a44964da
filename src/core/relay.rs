use crate::core::compose::MailComposer;
use crate::core::rate_limit::RateLimiter;
use crate::domain::model::{
    ContactForm, ContactReceipt, ContactSubmission, Mode, NewsletterForm, NewsletterSignup,
};
use crate::domain::ports::{MailTransport, SubscriptionSink};
use crate::utils::error::Result;
use std::sync::Arc;

/// The submission path: validate → rate-limit → compose → send.
///
/// Validation runs before the per-route limiter so rejected payloads do not
/// consume the submission quota. Every failure is terminal; nothing retries.
#[derive(Clone)]
pub struct RelayEngine {
    mode: Mode,
    composer: MailComposer,
    transport: Arc<dyn MailTransport>,
    subscriptions: Arc<dyn SubscriptionSink>,
    contact_limiter: RateLimiter,
    newsletter_limiter: RateLimiter,
}

impl RelayEngine {
    pub fn new(
        mode: Mode,
        composer: MailComposer,
        transport: Arc<dyn MailTransport>,
        subscriptions: Arc<dyn SubscriptionSink>,
        contact_limiter: RateLimiter,
        newsletter_limiter: RateLimiter,
    ) -> Self {
        Self {
            mode,
            composer,
            transport,
            subscriptions,
            contact_limiter,
            newsletter_limiter,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn transport_kind(&self) -> &'static str {
        self.transport.kind()
    }

    pub fn limiters(&self) -> Vec<RateLimiter> {
        vec![self.contact_limiter.clone(), self.newsletter_limiter.clone()]
    }

    pub async fn submit_contact(&self, client: &str, form: ContactForm) -> Result<ContactReceipt> {
        let submission = ContactSubmission::try_from(form)?;
        self.contact_limiter.acquire(client)?;

        let mail = self.composer.compose(&submission);
        tracing::debug!(
            client,
            message_id = %mail.message_id,
            transport = self.transport.kind(),
            "dispatching contact submission"
        );

        let delivery = self.transport.send(&mail).await?;
        tracing::info!(message_id = %delivery.message_id, "Email sent");

        // 預覽連結只在非正式環境回傳
        let preview_url = if self.mode.is_production() {
            None
        } else {
            delivery.preview_url
        };
        if let Some(url) = &preview_url {
            tracing::info!(preview_url = %url, "Preview URL");
        }

        Ok(ContactReceipt {
            message_id: delivery.message_id,
            preview_url,
        })
    }

    pub async fn subscribe(&self, client: &str, form: NewsletterForm) -> Result<()> {
        let signup = NewsletterSignup::try_from(form)?;
        self.newsletter_limiter.acquire(client)?;

        self.subscriptions.subscribe(&signup).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mocks::{FailingTransport, RecordingSink, RecordingTransport};
    use crate::core::rate_limit::RateLimitPolicy;
    use crate::domain::model::LimitScope;
    use crate::utils::error::RelayError;

    fn engine(mode: Mode, transport: Arc<dyn MailTransport>, sink: RecordingSink) -> RelayEngine {
        RelayEngine::new(
            mode,
            MailComposer::new(
                "Meanx AI Contact <contact@meanx.ai>".to_string(),
                "contact@meanx.ai".to_string(),
            ),
            transport,
            Arc::new(sink),
            RateLimiter::new(LimitScope::Contact, RateLimitPolicy::contact()),
            RateLimiter::new(LimitScope::Newsletter, RateLimitPolicy::newsletter()),
        )
    }

    fn form() -> ContactForm {
        ContactForm {
            name: Some("Jane Doe".to_string()),
            email: Some("jane@acme.io".to_string()),
            company: None,
            message: Some("Hello, I would like a demo.".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_contact_sends_once() {
        let transport = RecordingTransport::with_previews("https://ethereal.email/message/");
        let engine = engine(
            Mode::Development,
            Arc::new(transport.clone()),
            RecordingSink::new(),
        );

        let receipt = engine.submit_contact("1.2.3.4", form()).await.unwrap();

        assert_eq!(transport.sent_count(), 1);
        assert_eq!(receipt.message_id, transport.sent()[0].message_id);
        assert!(receipt.preview_url.is_some());
    }

    #[tokio::test]
    async fn test_production_drops_preview_url() {
        let transport = RecordingTransport::with_previews("https://ethereal.email/message/");
        let engine = engine(Mode::Production, Arc::new(transport), RecordingSink::new());

        let receipt = engine.submit_contact("1.2.3.4", form()).await.unwrap();
        assert!(receipt.preview_url.is_none());
    }

    #[tokio::test]
    async fn test_validation_error_skips_transport() {
        let transport = RecordingTransport::new();
        let engine = engine(
            Mode::Development,
            Arc::new(transport.clone()),
            RecordingSink::new(),
        );

        let mut bad = form();
        bad.message = Some("too short".to_string());
        let result = engine.submit_contact("1.2.3.4", bad).await;

        assert!(matches!(result, Err(RelayError::ValidationError { .. })));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_still_counts_against_quota() {
        let transport = FailingTransport::new("connection refused");
        let engine = engine(
            Mode::Development,
            Arc::new(transport.clone()),
            RecordingSink::new(),
        );

        for _ in 0..5 {
            let result = engine.submit_contact("1.2.3.4", form()).await;
            assert!(matches!(result, Err(RelayError::TransportError(_))));
        }
        let result = engine.submit_contact("1.2.3.4", form()).await;

        assert!(matches!(
            result,
            Err(RelayError::RateLimited {
                scope: LimitScope::Contact
            })
        ));
        assert_eq!(transport.attempts(), 5);
    }

    #[tokio::test]
    async fn test_subscribe_hands_signup_to_sink() {
        let sink = RecordingSink::new();
        let engine = engine(
            Mode::Development,
            Arc::new(RecordingTransport::new()),
            sink.clone(),
        );

        let form = NewsletterForm {
            email: Some("Reader@Example.org".to_string()),
        };
        engine.subscribe("1.2.3.4", form).await.unwrap();

        assert_eq!(sink.signups()[0].email, "reader@example.org");
    }
}
