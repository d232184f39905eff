use std::time::Duration;

use thiserror::Error;
use tracing::info;

use ipo_common::{retry_with_backoff, Digest, IpoError, RetryPolicy, Retryable};

#[derive(Error, Debug)]
enum PublishError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Notify server returned {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },
}

impl Retryable for PublishError {
    fn is_retryable(&self) -> bool {
        match self {
            PublishError::Network(_) => true,
            PublishError::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            PublishError::Rejected { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Posts finished digests to the notify server.
pub struct Publisher {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl Publisher {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, retry: RetryPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
            token,
            retry,
        }
    }

    pub async fn publish(&self, digest: &Digest) -> Result<(), IpoError> {
        retry_with_backoff(&self.retry, "publish", || self.post(digest))
            .await
            .map_err(|e| IpoError::Delivery(e.to_string()))?;

        info!(
            run_id = %digest.run_id,
            ipos = digest.ipos.len(),
            endpoint = self.endpoint.as_str(),
            "Digest delivered"
        );
        Ok(())
    }

    async fn post(&self, digest: &Digest) -> Result<(), PublishError> {
        let mut request = self.client.post(&self.endpoint).json(digest);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Rejected {
            status: status.as_u16(),
            message: body.chars().take(500).collect(),
            retry_after,
        })
    }
}
