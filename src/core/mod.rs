pub mod compose;
pub mod rate_limit;
pub mod relay;

pub use crate::domain::model::{ContactSubmission, Delivery, OutgoingMail};
pub use crate::domain::ports::{Clock, CounterStore, MailTransport, SubscriptionSink};
pub use crate::utils::error::Result;
