pub mod config;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod retry;
pub mod sanitize;
pub mod types;
pub mod validate;

pub use config::{NotifyConfig, ScoutConfig};
pub use error::IpoError;
pub use merge::merge_records;
pub use normalize::normalize_company_name;
pub use retry::{retry_with_backoff, RetryPolicy, Retryable};
pub use sanitize::sanitize_raw;
pub use types::*;
pub use validate::{digest_json_schema, is_source_url, validate_digest, ValidationIssue};
