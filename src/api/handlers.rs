use crate::api::extract::{ClientAddr, Payload};
use crate::api::response::{
    ApiFailure, ApiResponse, HealthResponse, CONTACT_FAILURE, CONTACT_SUCCESS, HEALTH_MESSAGE,
    NEWSLETTER_FAILURE, NEWSLETTER_SUCCESS,
};
use crate::api::AppState;
use crate::domain::model::{ContactForm, ContactReceipt, NewsletterForm};
use axum::extract::State;
use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.engine.mode().as_str().to_string(),
    })
}

/// POST /api/contact
pub async fn contact(
    State(state): State<AppState>,
    Extension(client): Extension<ClientAddr>,
    Payload(form): Payload<ContactForm>,
) -> Result<Json<ApiResponse<ContactReceipt>>, ApiFailure> {
    let receipt = state
        .engine
        .submit_contact(client.as_str(), form)
        .await
        .map_err(|e| ApiFailure::from_relay(e, CONTACT_FAILURE))?;

    Ok(Json(ApiResponse::with_data(CONTACT_SUCCESS, receipt)))
}

/// POST /api/newsletter
pub async fn newsletter(
    State(state): State<AppState>,
    Extension(client): Extension<ClientAddr>,
    Payload(form): Payload<NewsletterForm>,
) -> Result<Json<ApiResponse<()>>, ApiFailure> {
    state
        .engine
        .subscribe(client.as_str(), form)
        .await
        .map_err(|e| ApiFailure::from_relay(e, NEWSLETTER_FAILURE))?;

    Ok(Json(ApiResponse::message(NEWSLETTER_SUCCESS)))
}

pub async fn not_found() -> ApiFailure {
    ApiFailure::not_found()
}
