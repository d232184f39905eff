use std::sync::Arc;
use std::time::Duration;

use ai_client::{json_blocks, strip_code_blocks, truncate_to_char_boundary, ChatModel, StructuredOutput};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use ipo_common::{
    retry_with_backoff, sanitize_raw, ExtractionResponse, IpoError, IpoRecord, RawIpo, RetryPolicy,
};

use crate::collector::Article;
use crate::prompts;

/// Article bodies beyond this are cut before prompting.
const MAX_CONTENT_BYTES: usize = 12_000;

/// Records extracted from a batch of articles.
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    pub records: Vec<IpoRecord>,
    pub failed: usize,
}

/// Turns news articles into IPO records with one LLM round-trip each.
pub struct Extractor {
    chat: Arc<dyn ChatModel>,
    schema: Value,
    retry: RetryPolicy,
    request_delay: Duration,
}

impl Extractor {
    pub fn new(chat: Arc<dyn ChatModel>, retry: RetryPolicy, request_delay: Duration) -> Self {
        Self {
            chat,
            schema: ExtractionResponse::openai_schema(),
            retry,
            request_delay,
        }
    }

    pub async fn extract(&self, article: &Article, today: NaiveDate) -> Result<Vec<IpoRecord>, IpoError> {
        let content = truncate_to_char_boundary(&article.body, MAX_CONTENT_BYTES);
        let system = prompts::extraction_system_prompt(today);
        let user = prompts::extraction_user_prompt(article, content);

        let reply = retry_with_backoff(&self.retry, "llm_extract", || {
            self.chat.json_completion(&system, &user, &self.schema)
        })
        .await
        .map_err(|e| IpoError::Extraction(format!("{} request failed: {e}", self.chat.provider())))?;

        let raw = parse_extraction(&reply)?;
        let source = article.source_ref();
        let records: Vec<IpoRecord> = raw
            .into_iter()
            .filter_map(|r| sanitize_raw(r, &source, today))
            .collect();

        debug!(url = article.link.as_str(), records = records.len(), "Extracted IPO records");
        Ok(records)
    }

    /// Extract from every article in turn, pausing between calls. A failed
    /// article is logged and counted, never fatal.
    pub async fn extract_all(&self, articles: &[Article], today: NaiveDate) -> ExtractionBatch {
        let mut batch = ExtractionBatch::default();

        for (i, article) in articles.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.extract(article, today).await {
                Ok(records) => batch.records.extend(records),
                Err(e) => {
                    warn!(url = article.link.as_str(), error = %e, "Extraction failed, skipping article");
                    batch.failed += 1;
                }
            }
        }

        info!(
            articles = articles.len(),
            records = batch.records.len(),
            failed = batch.failed,
            provider = self.chat.provider(),
            model = self.chat.model(),
            "Extraction complete"
        );
        batch
    }
}

/// Parse a model reply into raw IPOs, tolerating the shapes models
/// actually produce: the requested object, a bare array, fenced code,
/// JSON embedded in prose, or `ipos` as a stringified array.
pub fn parse_extraction(reply: &str) -> Result<Vec<RawIpo>, IpoError> {
    let trimmed = reply.trim();
    let fenced = strip_code_blocks(trimmed);
    // Whole reply, then fenced body, then each embedded block in order.
    [trimmed, fenced]
        .into_iter()
        .chain(json_blocks(trimmed))
        .find_map(parse_candidate)
        .ok_or_else(|| {
            let preview = truncate_to_char_boundary(trimmed, 200);
            IpoError::Extraction(format!("unparseable model reply: {preview}"))
        })
}

fn parse_candidate(text: &str) -> Option<Vec<RawIpo>> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value {
        Value::Array(_) => serde_json::from_value(value).ok(),
        Value::Object(ref obj) if !obj.contains_key("ipos") && obj.contains_key("company") => {
            serde_json::from_value::<RawIpo>(value).ok().map(|r| vec![r])
        }
        Value::Object(_) => serde_json::from_value::<ExtractionResponse>(value)
            .ok()
            .map(|r| r.ipos),
        _ => None,
    }
}
