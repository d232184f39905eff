use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

const TOKEN_HEADER: &str = "x-digest-token";

/// Proof that the caller presented the shared digest token. When no token
/// is configured every request passes.
pub struct DigestAuth;

impl FromRequestParts<Arc<AppState>> for DigestAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.digest_token.as_deref() else {
            return Ok(DigestAuth);
        };

        match presented_token(parts) {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(DigestAuth),
            presented => {
                warn!(
                    path = %parts.uri.path(),
                    token_present = presented.is_some(),
                    "Rejected digest request"
                );
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "missing or invalid digest token"})),
                )
                    .into_response())
            }
        }
    }
}

/// `Authorization: Bearer <token>` first, then `x-digest-token`.
fn presented_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    bearer.or_else(|| {
        parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
