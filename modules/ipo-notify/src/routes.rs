use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use ipo_common::{digest_json_schema, validate_digest, Digest};
use mailer::EmailMessage;

use crate::auth::DigestAuth;
use crate::render::{render_digest, RenderedDigest};
use crate::webhook::WebhookOutcome;
use crate::AppState;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn api_digest_schema() -> Json<Value> {
    Json(digest_json_schema())
}

/// Validate, render, email and forward one digest.
pub async fn api_digest(
    State(state): State<Arc<AppState>>,
    _auth: DigestAuth,
    body: Bytes,
) -> Response {
    let digest = match parse_digest(&body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let rendered = render_digest(&digest);

    let message = EmailMessage {
        from: state.email_from.clone(),
        to: state.email_to.clone(),
        subject: rendered.subject.clone(),
        html: rendered.html.clone(),
        text: rendered.text.clone(),
    };
    let receipt = match state.mailer.send(&message).await {
        Ok(r) => r,
        Err(e) => {
            error!(run_id = %digest.run_id, provider = state.mailer.provider(), error = %e, "Email delivery failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "email delivery failed", "detail": e.to_string()})),
            )
                .into_response();
        }
    };

    let webhook = forward(&state, &rendered, &digest).await;

    info!(
        run_id = %digest.run_id,
        ipos = digest.ipos.len(),
        provider = receipt.provider,
        message_id = receipt.message_id.as_deref().unwrap_or(""),
        webhook = ?webhook,
        "Digest delivered"
    );

    Json(json!({
        "status": "sent",
        "ipos": digest.ipos.len(),
        "provider": receipt.provider,
        "message_id": receipt.message_id,
        "webhook": webhook,
    }))
    .into_response()
}

/// Render a digest exactly as it would be emailed, without sending it.
pub async fn api_digest_preview(_auth: DigestAuth, body: Bytes) -> Response {
    match parse_digest(&body) {
        Ok(digest) => Html(render_digest(&digest).html).into_response(),
        Err(resp) => resp,
    }
}

async fn forward(state: &AppState, rendered: &RenderedDigest, digest: &Digest) -> WebhookOutcome {
    match &state.webhook {
        Some(hook) => hook.forward(&rendered.text, digest).await,
        None => WebhookOutcome::Skipped,
    }
}

fn parse_digest(body: &[u8]) -> Result<Digest, Response> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Digest body is not JSON");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "body must be JSON", "detail": e.to_string()})),
        )
            .into_response()
    })?;

    validate_digest(&value).map_err(|issues| {
        warn!(issues = issues.len(), "Digest failed validation");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "invalid digest", "issues": issues})),
        )
            .into_response()
    })
}
