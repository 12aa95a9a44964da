#![allow(dead_code)]

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use contact_relay::adapters::clock::ManualClock;
use contact_relay::adapters::mocks::{RecordingSink, RecordingTransport};
use contact_relay::domain::ports::{MailTransport, SubscriptionSink};
use contact_relay::{create_router, AppState, RelayConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub const PEER: &str = "10.0.0.2:51000";

/// Development config trusting one proxy hop, so each test picks its
/// client through `X-Forwarded-For`.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.server.trust_proxy = 1;
    config
}

pub struct TestApp {
    pub router: Router,
    pub transport: RecordingTransport,
    pub sink: RecordingSink,
    pub clock: ManualClock,
}

impl TestApp {
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_transport(config, RecordingTransport::new())
    }

    pub fn with_transport(config: &RelayConfig, transport: RecordingTransport) -> Self {
        let sink = RecordingSink::new();
        let clock = ManualClock::default();
        let router = build_router(
            config,
            Arc::new(transport.clone()),
            Arc::new(sink.clone()),
            clock.clone(),
        );
        Self {
            router,
            transport,
            sink,
            clock,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value, client: &str) -> (StatusCode, Value) {
        let request = request_builder("POST", path, client)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.router, request).await
    }

    pub async fn get(&self, path: &str, client: &str) -> (StatusCode, Value) {
        let request = request_builder("GET", path, client)
            .body(Body::empty())
            .unwrap();
        send(&self.router, request).await
    }
}

pub fn build_router(
    config: &RelayConfig,
    transport: Arc<dyn MailTransport>,
    sink: Arc<dyn SubscriptionSink>,
    clock: ManualClock,
) -> Router {
    let state = AppState::assemble(config, transport, sink, Arc::new(clock));
    create_router(state, config)
}

/// Request carrying a socket peer and an `X-Forwarded-For` entry for `client`.
pub fn request_builder(method: &str, path: &str, client: &str) -> axum::http::request::Builder {
    let peer: SocketAddr = PEER.parse().unwrap();
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("x-forwarded-for", client);
    if let Some(extensions) = builder.extensions_mut() {
        extensions.insert(ConnectInfo(peer));
    }
    builder
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn jane_doe() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@acme.io",
        "company": "Acme",
        "message": "Hello, I would like a demo."
    })
}
