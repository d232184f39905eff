pub mod claude;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod schema;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use error::{AiError, Result};
pub use gemini::Gemini;
pub use openai::OpenAi;
pub use provider::Provider;
pub use schema::{sanitize_gemini_schema, StructuredOutput};
pub use traits::ChatModel;
pub use util::{extract_json_block, json_blocks, strip_code_blocks, truncate_to_char_boundary};

use std::time::Duration;

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}
