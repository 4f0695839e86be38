// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Require the configured API key on every request, accepted either as an
/// `X-Api-Key` header or as a bearer token. With no key configured all
/// requests pass.
pub async fn auth_middleware(
    State(api_key): State<Option<String>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if is_authorized(&headers, api_key.as_deref()) {
        return next.run(request).await;
    }

    debug!(target: "auth", "rejecting request without valid api key");
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

fn is_authorized(headers: &HeaderMap, api_key: Option<&str>) -> bool {
    let Some(expected) = api_key else {
        return true;
    };

    if let Some(header) = headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) {
        return header == expected;
    }

    if let Some(auth) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return token == expected;
        }
    }

    false
}
