// SPDX-License-Identifier: MIT

//! Bearer-token auth (§4.6): a request is authorized iff the configured
//! token is empty, or it matches the `X-Relay-Token` header, the `token`
//! query parameter, or a `Bearer` `Authorization` header. Grounded on the
//! teacher's `coop_mux::transport::auth` (constant-time comparison),
//! generalized to the three accepted carriers this spec requires.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::RelayError;
use crate::store::RelayStore;

/// Constant-time string comparison to avoid a timing side-channel on the
/// configured token.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-relay-token").and_then(|v| v.to_str().ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get("authorization").and_then(|v| v.to_str().ok())?.strip_prefix("Bearer ")
}

fn query_token(query: Option<&str>) -> Option<&str> {
    query?.split('&').find_map(|pair| pair.strip_prefix("token="))
}

/// §4.6 auth rule, exercised directly by HTTP handlers and by this
/// module's middleware layer alike.
pub fn is_authorized(headers: &HeaderMap, query: Option<&str>, expected: Option<&str>) -> bool {
    let expected = match expected {
        Some(t) if !t.is_empty() => t,
        _ => return true,
    };
    [header_token(headers), bearer_token(headers), query_token(query)]
        .into_iter()
        .flatten()
        .any(|candidate| constant_time_eq(candidate, expected))
}

/// Axum middleware enforcing §4.6 auth. Exempt: `/healthz` and `/`.
pub async fn auth_layer(
    state: State<Arc<RelayStore>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/healthz" || path == "/" {
        return next.run(req).await;
    }

    let query = req.uri().query();
    if !is_authorized(req.headers(), query, state.config_token()) {
        let (status, body) = RelayError::Unauthorized.to_http_response("missing or invalid token");
        return (StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::UNAUTHORIZED), body)
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
