use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewsError>;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Quota exhausted: {0}")]
    Quota(String),
}

impl NewsError {
    /// Network failures, 429 and 5xx. A quota error is final for the day.
    pub fn is_retryable(&self) -> bool {
        match self {
            NewsError::Network(_) => true,
            NewsError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            NewsError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        NewsError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NewsError {
    fn from(err: serde_json::Error) -> Self {
        NewsError::Parse(err.to_string())
    }
}
