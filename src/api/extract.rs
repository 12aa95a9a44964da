use crate::api::response::{ApiFailure, INVALID_PAYLOAD};
use crate::utils::error::RelayError;
use axum::extract::{ConnectInfo, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit key for the caller, resolved once per request by the
/// global limiter middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    /// Resolves the client address the way a proxy-aware server does:
    /// the socket peer first, then `X-Forwarded-For` entries from right to
    /// left, trusting at most `trust_proxy` hops.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: usize) -> Self {
        let mut chain: Vec<String> = vec![peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())];

        if trust_proxy > 0 {
            let forwarded = headers
                .get_all(FORWARDED_FOR)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|hop| !hop.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            chain.extend(forwarded.into_iter().rev());
        }

        let index = trust_proxy.min(chain.len() - 1);
        Self(chain.swap_remove(index))
    }

    pub fn of_request(request: &Request, trust_proxy: usize) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::resolve(request.headers(), peer, trust_proxy)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Request body accepted as JSON or as an URL-encoded form.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let result = if is_form {
            Form::<T>::from_request(request, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| rejection.body_text())
        } else {
            Json::<T>::from_request(request, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text())
        };

        result.map(Payload).map_err(|message| {
            ApiFailure::from_relay(RelayError::MalformedPayload { message }, INVALID_PAYLOAD)
        })
    }
}
