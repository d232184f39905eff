use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

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

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
}

impl AiError {
    /// Rate limits, server errors and dropped connections are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Network(_) => true,
            AiError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Seconds the provider asked us to wait, if it said.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AiError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

/// Turn a non-2xx response into `AiError::Api`, keeping any `Retry-After` hint.
pub(crate) async fn api_error(response: reqwest::Response) -> AiError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let message = response.text().await.unwrap_or_default();
    AiError::Api {
        status,
        message,
        retry_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        let rate_limited = AiError::Api {
            status: 429,
            message: String::new(),
            retry_after: Some(7),
        };
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.retry_after(), Some(7));

        let overloaded = AiError::Api {
            status: 529,
            message: String::new(),
            retry_after: None,
        };
        assert!(overloaded.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let bad_request = AiError::Api {
            status: 400,
            message: "bad schema".into(),
            retry_after: None,
        };
        assert!(!bad_request.is_retryable());
        assert!(!AiError::Parse("x".into()).is_retryable());
    }
}
