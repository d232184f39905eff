use std::sync::Arc;

use ai_client::ChatModel;
use tracing::{info, warn};

use ipo_common::{retry_with_backoff, IpoRecord, RetryPolicy};

use crate::prompts;

const MAX_SUMMARY_CHARS: usize = 1_500;

/// Writes the digest's opening paragraph.
pub struct Summarizer {
    chat: Arc<dyn ChatModel>,
    retry: RetryPolicy,
    enabled: bool,
}

impl Summarizer {
    pub fn new(chat: Arc<dyn ChatModel>, retry: RetryPolicy, enabled: bool) -> Self {
        Self { chat, retry, enabled }
    }

    /// A short overview of `records`, or `None` when disabled, empty, or the
    /// model call fails. The digest goes out either way.
    pub async fn summarize(&self, records: &[IpoRecord]) -> Option<String> {
        if !self.enabled || records.is_empty() {
            return None;
        }

        let lines: Vec<String> = records.iter().map(describe).collect();
        let user = prompts::summary_user_prompt(&lines);

        match retry_with_backoff(&self.retry, "llm_summary", || {
            self.chat.chat_completion(prompts::SUMMARY_SYSTEM_PROMPT, &user)
        })
        .await
        {
            Ok(text) => {
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    return None;
                }
                info!(chars = text.len(), "Digest summary written");
                Some(truncate(&text))
            }
            Err(e) => {
                warn!(error = %e, "Summary generation failed, sending digest without it");
                None
            }
        }
    }
}

fn describe(record: &IpoRecord) -> String {
    let mut parts = vec![format!("{} ({})", record.company, record.status.as_str())];
    if let Some(exchange) = &record.exchange {
        parts.push(exchange.clone());
    }
    match (record.open_date, record.close_date) {
        (Some(open), Some(close)) => parts.push(format!("bidding {open} to {close}")),
        (Some(open), None) => parts.push(format!("opens {open}")),
        _ => {}
    }
    if let Some(listing) = record.listing_date {
        parts.push(format!("listing {listing}"));
    }
    if let Some(band) = &record.price_band {
        parts.push(format!("price band {band}"));
    }
    if let Some(size) = &record.issue_size {
        parts.push(format!("issue size {size}"));
    }
    if let Some(gmp) = &record.gmp {
        parts.push(format!("GMP {gmp}"));
    }
    format!("- {}", parts.join(", "))
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::OpenAi;
    use chrono::NaiveDate;
    use ipo_common::IpoStatus;
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn records() -> Vec<IpoRecord> {
        let mut acme = IpoRecord::new("Acme Solutions", IpoStatus::Open);
        acme.open_date = NaiveDate::from_ymd_opt(2026, 10, 14);
        acme.close_date = NaiveDate::from_ymd_opt(2026, 10, 17);
        acme.price_band = Some("₹340-360".to_string());
        vec![acme, IpoRecord::new("Beta Foods", IpoStatus::Filed)]
    }

    #[test]
    fn describe_includes_known_fields() {
        let line = describe(&records()[0]);
        assert_eq!(
            line,
            "- Acme Solutions (open), bidding 2026-10-14 to 2026-10-17, price band ₹340-360"
        );
    }

    #[tokio::test]
    async fn disabled_or_empty_skips_the_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/chat/completions").expect(0).create_async().await;
        let chat = Arc::new(OpenAi::new("sk-test", "gpt-4o-mini").with_base_url(server.url()));

        let disabled = Summarizer::new(chat.clone(), policy(), false);
        assert_eq!(disabled.summarize(&records()).await, None);

        let enabled = Summarizer::new(chat, policy(), true);
        assert_eq!(enabled.summarize(&[]).await, None);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn returns_collapsed_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex("Acme Solutions \\(open\\)".into()))
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Acme Solutions is open.\n\nBeta Foods filed its DRHP."}}]}"#,
            )
            .create_async()
            .await;
        let chat = Arc::new(OpenAi::new("sk-test", "gpt-4o-mini").with_base_url(server.url()));

        let summary = Summarizer::new(chat, policy(), true).summarize(&records()).await;
        mock.assert_async().await;
        assert_eq!(summary.as_deref(), Some("Acme Solutions is open. Beta Foods filed its DRHP."));
    }

    #[tokio::test]
    async fn failure_yields_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("down")
            .create_async()
            .await;
        let chat = Arc::new(OpenAi::new("sk-test", "gpt-4o-mini").with_base_url(server.url()));

        let summary = Summarizer::new(chat, policy(), true).summarize(&records()).await;
        assert_eq!(summary, None);
    }
}
