use thiserror::Error;

pub type Result<T> = std::result::Result<T, IpoError>;

#[derive(Error, Debug)]
pub enum IpoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
