use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use ipo_common::Digest;

/// Result of forwarding a digest, reported back to the scout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookOutcome {
    Delivered,
    Failed,
    Skipped,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    digest: &'a Digest,
}

/// Forwards each digest to a chat-style incoming webhook.
pub struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            url: url.into(),
        }
    }

    /// Never fails the request that triggered it; the outcome is logged and
    /// returned instead.
    pub async fn forward(&self, text: &str, digest: &Digest) -> WebhookOutcome {
        let payload = WebhookPayload { text, digest };
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(run_id = %digest.run_id, "Digest forwarded to webhook");
                WebhookOutcome::Delivered
            }
            Ok(resp) => {
                warn!(run_id = %digest.run_id, status = %resp.status(), "Webhook rejected digest");
                WebhookOutcome::Failed
            }
            Err(e) => {
                warn!(run_id = %digest.run_id, error = %e, "Webhook request failed");
                WebhookOutcome::Failed
            }
        }
    }
}
