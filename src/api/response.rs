//! JSON envelopes shared by every route.
//!
//! Success: `{ success: true, message, data? }`.
//! Failure: `{ success: false, message, errors? }` where `errors` carries
//! field-level validation failures only.

use crate::domain::model::FieldError;
use crate::utils::error::RelayError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const CONTACT_SUCCESS: &str =
    "Thank you for your message. We will get back to you within 24 hours.";
pub const CONTACT_FAILURE: &str = "Failed to send message. Please try again later.";
pub const NEWSLETTER_SUCCESS: &str = "Successfully subscribed to our newsletter!";
pub const NEWSLETTER_FAILURE: &str = "Failed to subscribe. Please try again later.";
pub const HEALTH_MESSAGE: &str = "Server is running";
pub const VALIDATION_FAILED: &str = "Validation failed";
pub const INVALID_PAYLOAD: &str = "Invalid request payload";
pub const NOT_FOUND: &str = "Endpoint not found";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_data(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

/// Error response with its HTTP status.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<Vec<FieldError>>,
}

impl ApiFailure {
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            errors: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
    }

    /// Maps a relay error to its public response.
    ///
    /// Server-side failures are logged with full detail here and replaced by
    /// `failure_message`; nothing from the underlying error reaches the body.
    pub fn from_relay(error: RelayError, failure_message: &str) -> Self {
        match error {
            RelayError::ValidationError { errors } => {
                tracing::debug!(?errors, "submission rejected by validation");
                Self {
                    status: StatusCode::BAD_REQUEST,
                    message: VALIDATION_FAILED.to_string(),
                    errors: Some(errors),
                }
            }
            RelayError::RateLimited { scope } => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, scope.advisory())
            }
            RelayError::MalformedPayload { message } => {
                tracing::debug!(reason = %message, "malformed request payload");
                Self::new(StatusCode::BAD_REQUEST, INVALID_PAYLOAD)
            }
            other => {
                tracing::error!(error = %other, "❌ request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure_message)
            }
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = FailureBody {
            success: false,
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}
