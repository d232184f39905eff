pub mod error;
pub mod types;

pub use error::{NewsError, Result};
pub use types::{NewsArticle, NewsPage, NewsQuery};

use std::time::Duration;

use types::ErrorEnvelope;

const BASE_URL: &str = "https://newsdata.io";

/// Error codes NewsData uses when the daily credit allowance is spent.
const QUOTA_CODES: &[&str] = &["RateLimitExceeded", "ApiLimitExceeded", "DailyLimitExceeded"];

pub struct NewsDataClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsDataClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("ipo-radar/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch one page of the latest-news endpoint. No retries here; callers own the policy.
    pub async fn latest(&self, query: &NewsQuery) -> Result<NewsPage> {
        let url = format!("{}/api/1/latest", self.base_url);
        tracing::debug!(q = %query.q, page = ?query.page, "NewsData request");

        let resp = self
            .client
            .get(&url)
            .query(&query.params(&self.api_key))
            .send()
            .await?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => envelope_error(envelope, status.as_u16(), retry_after),
                Err(_) => NewsError::Api {
                    status: status.as_u16(),
                    message: body,
                    retry_after,
                },
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        if value.get("status").and_then(|s| s.as_str()) == Some("error") {
            let envelope: ErrorEnvelope = serde_json::from_value(value)?;
            return Err(envelope_error(envelope, status.as_u16(), retry_after));
        }

        let page: NewsPage = serde_json::from_value(value)?;
        tracing::debug!(
            q = %query.q,
            results = page.results.len(),
            total = page.total_results,
            has_next = page.next_page.is_some(),
            "NewsData page received"
        );
        Ok(page)
    }
}

/// Quota codes win over the HTTP status, whatever status they arrive with.
fn envelope_error(envelope: ErrorEnvelope, status: u16, retry_after: Option<u64>) -> NewsError {
    let body = envelope.results;
    if QUOTA_CODES.contains(&body.code.as_str()) {
        return NewsError::Quota(body.message);
    }
    NewsError::Api {
        status,
        message: format!("{}: {}", body.code, body.message),
        retry_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn ipo_query() -> NewsQuery {
        NewsQuery {
            q: "IPO".into(),
            country: Some("in".into()),
            language: Some("en".into()),
            category: None,
            timeframe_hours: None,
            page: None,
        }
    }

    #[tokio::test]
    async fn latest_parses_results_and_cursor() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("apikey".into(), "nd-key".into()),
                Matcher::UrlEncoded("q".into(), "IPO".into()),
                Matcher::UrlEncoded("country".into(), "in".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"success","totalResults":2,"results":[
                    {"article_id":"1","title":"Acme IPO opens","link":"https://x.test/1","description":"d","content":null,"pubDate":"2026-10-14 08:30:00","source_id":"mint","keywords":null},
                    {"article_id":"2","title":"Beta DRHP","link":"https://x.test/2","pubDate":"2026-10-13 10:00:00"}
                ],"nextPage":"abc123"}"#,
            )
            .create_async()
            .await;

        let client = NewsDataClient::new("nd-key").with_base_url(server.url());
        let page = client.latest(&ipo_query()).await.unwrap();

        assert_eq!(page.results.len(), 2);
        assert_eq!(page.next_page.as_deref(), Some("abc123"));
        assert_eq!(page.results[1].title, "Beta DRHP");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_429_is_retryable_with_hint() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "30")
            .with_body(r#"{"status":"error","results":{"message":"Too many requests","code":"TooManyRequests"}}"#)
            .create_async()
            .await;

        let client = NewsDataClient::new("nd-key").with_base_url(server.url());
        let err = client.latest(&ipo_query()).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(30));
        assert!(err.to_string().contains("TooManyRequests"));
    }

    #[tokio::test]
    async fn quota_error_in_success_envelope_is_final() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"error","results":{"message":"Daily limit reached","code":"RateLimitExceeded"}}"#)
            .create_async()
            .await;

        let client = NewsDataClient::new("nd-key").with_base_url(server.url());
        let err = client.latest(&ipo_query()).await.unwrap_err();

        assert!(matches!(err, NewsError::Quota(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn quota_code_on_error_status_is_final() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"status":"error","results":{"message":"Daily limit reached","code":"DailyLimitExceeded"}}"#)
            .create_async()
            .await;

        let client = NewsDataClient::new("nd-key").with_base_url(server.url());
        let err = client.latest(&ipo_query()).await.unwrap_err();

        assert!(matches!(err, NewsError::Quota(ref m) if m == "Daily limit reached"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = NewsDataClient::new("nd-key").with_base_url(server.url());
        let err = client.latest(&ipo_query()).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
