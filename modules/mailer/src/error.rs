use thiserror::Error;

pub type Result<T> = std::result::Result<T, MailerError>;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

impl From<reqwest::Error> for MailerError {
    fn from(err: reqwest::Error) -> Self {
        MailerError::Network(err.to_string())
    }
}

pub(crate) async fn api_error(provider: &'static str, response: reqwest::Response) -> MailerError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    MailerError::Api {
        provider,
        status,
        message,
    }
}
