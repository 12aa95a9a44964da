//! HTTP surface of the relay.
//!
//! | Method | Path | Handler | Limits |
//! |--------|------|---------|--------|
//! | GET | /api/health | `health` | global |
//! | POST | /api/contact | `contact` | contact + global |
//! | POST | /api/newsletter | `newsletter` | newsletter + global |
//!
//! Everything else answers with the JSON 404 envelope.

pub mod extract;
pub mod handlers;
pub mod response;

use crate::adapters::clock::SystemClock;
use crate::adapters::counter_store::InMemoryCounterStore;
use crate::adapters::smtp::select_transport;
use crate::adapters::subscription::LogSubscriptionSink;
use crate::config::RelayConfig;
use crate::core::compose::MailComposer;
use crate::core::rate_limit::{RateDecision, RateLimiter};
use crate::core::relay::RelayEngine;
use crate::domain::model::LimitScope;
use crate::domain::ports::{Clock, MailTransport, SubscriptionSink};
use crate::utils::error::{RelayError, Result};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::{self, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use extract::ClientAddr;
use response::ApiFailure;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub const HEALTH_PATH: &str = "/api/health";
pub const CONTACT_PATH: &str = "/api/contact";
pub const NEWSLETTER_PATH: &str = "/api/newsletter";

const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; img-src 'self' data: https:",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-xss-protection", "0"),
];

#[derive(Clone)]
pub struct AppState {
    pub engine: RelayEngine,
    pub global_limiter: RateLimiter,
    pub trust_proxy: usize,
}

impl AppState {
    /// Wires the production adapters: configured transport, log sink, system clock.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let transport = select_transport(config)?;
        Ok(Self::assemble(
            config,
            transport,
            Arc::new(LogSubscriptionSink),
            Arc::new(SystemClock::new()),
        ))
    }

    pub fn assemble(
        config: &RelayConfig,
        transport: Arc<dyn MailTransport>,
        subscriptions: Arc<dyn SubscriptionSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = |scope, policy| {
            RateLimiter::with_parts(
                scope,
                policy,
                Arc::new(InMemoryCounterStore::new()),
                Arc::clone(&clock),
            )
        };

        let engine = RelayEngine::new(
            config.mode,
            MailComposer::new(config.mail.from.clone(), config.mail.recipient.clone()),
            transport,
            subscriptions,
            limiter(LimitScope::Contact, config.limits.contact),
            limiter(LimitScope::Newsletter, config.limits.newsletter),
        );

        Self {
            engine,
            global_limiter: limiter(LimitScope::Global, config.limits.global),
            trust_proxy: config.server.trust_proxy,
        }
    }

    pub fn limiters(&self) -> Vec<RateLimiter> {
        let mut limiters = self.engine.limiters();
        limiters.push(self.global_limiter.clone());
        limiters
    }
}

pub fn create_router(state: AppState, config: &RelayConfig) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(handlers::health))
        .route(CONTACT_PATH, post(handlers::contact))
        .route(NEWSLETTER_PATH, post(handlers::newsletter))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(config))
        .layer(middleware::map_response(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "skipping invalid CORS origin: {}", e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Blanket abuse guard shared by every route, health included. Also
/// resolves the caller's address for the handlers.
async fn global_rate_limit(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = ClientAddr::of_request(&request, state.trust_proxy);

    if let RateDecision::Limited = state.global_limiter.check(client.as_str()) {
        return ApiFailure::from_relay(
            RelayError::RateLimited {
                scope: LimitScope::Global,
            },
            response::INTERNAL_ERROR,
        )
        .into_response();
    }

    request.extensions_mut().insert(client);
    next.run(request).await
}

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for &(name, value) in SECURITY_HEADERS {
        headers
            .entry(HeaderName::from_static(name))
            .or_insert_with(|| HeaderValue::from_static(value));
    }
    headers.remove(header::SERVER);
    response
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "Server error");
    ApiFailure::internal().into_response()
}
