use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use ipo_common::{is_source_url, retry_with_backoff, RetryPolicy, ScoutConfig, SourceRef};
use newsdata_client::{NewsArticle, NewsDataClient, NewsError, NewsQuery};

static RELEVANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bIPOs?\b|initial public offering|\bDRHP\b|red herring|\bSME IPO\b|grey market",
    )
    .expect("valid regex")
});

/// A news article that passed the relevance filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub body: String,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    fn from_news(article: NewsArticle) -> Self {
        Self {
            title: article.title.trim().to_string(),
            body: article.body_text().to_string(),
            published_at: article.published_at(),
            source_name: article.source_name.or(article.source_id),
            link: article.link,
        }
    }

    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            url: self.link.clone(),
            title: Some(self.title.chars().take(300).collect::<String>()).filter(|t| !t.is_empty()),
            published_at: self.published_at,
        }
    }
}

/// Does the headline or body talk about an IPO at all?
pub fn is_relevant(title: &str, body: &str) -> bool {
    RELEVANCE.is_match(title) || RELEVANCE.is_match(body)
}

/// Syndicated copies of a story differ only in punctuation and case.
fn title_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Gathers recent IPO news across the configured queries.
pub struct Collector {
    client: NewsDataClient,
    queries: Vec<String>,
    country: String,
    language: String,
    category: Option<String>,
    max_pages: u32,
    lookback_hours: u32,
    max_articles: usize,
    request_delay: Duration,
    retry: RetryPolicy,
}

impl Collector {
    pub fn new(client: NewsDataClient, config: &ScoutConfig) -> Self {
        Self {
            client,
            queries: config.news_queries.clone(),
            country: config.news_country.clone(),
            language: config.news_language.clone(),
            category: config.news_category.clone(),
            max_pages: config.news_max_pages.max(1),
            lookback_hours: config.news_lookback_hours,
            max_articles: config.news_max_articles,
            request_delay: config.news_request_delay,
            retry: config.retry,
        }
    }

    pub fn lookback_hours(&self) -> u32 {
        self.lookback_hours
    }

    /// Relevant, deduplicated articles from the lookback window, newest first.
    pub async fn collect(&self, now: DateTime<Utc>) -> Vec<Article> {
        let cutoff = now - chrono::Duration::hours(i64::from(self.lookback_hours));
        let mut seen_links: HashSet<String> = HashSet::new();
        let mut seen_titles: HashSet<String> = HashSet::new();
        let mut articles: Vec<Article> = Vec::new();
        let mut fetched = 0usize;
        let mut first_request = true;

        'queries: for q in &self.queries {
            let mut query = NewsQuery {
                country: Some(self.country.clone()),
                language: Some(self.language.clone()),
                category: self.category.clone(),
                timeframe_hours: Some(self.lookback_hours),
                ..NewsQuery::new(q.as_str())
            };

            for page_no in 1..=self.max_pages {
                if !first_request {
                    tokio::time::sleep(self.request_delay).await;
                }
                first_request = false;

                let page = match retry_with_backoff(&self.retry, "newsdata", || {
                    self.client.latest(&query)
                })
                .await
                {
                    Ok(page) => page,
                    Err(NewsError::Quota(message)) => {
                        warn!(query = q.as_str(), detail = %message, "News API quota exhausted, stopping collection");
                        break 'queries;
                    }
                    Err(e) => {
                        warn!(query = q.as_str(), page = page_no, error = %e, "News query failed, skipping");
                        continue 'queries;
                    }
                };

                debug!(query = q.as_str(), page = page_no, results = page.results.len(), "Fetched news page");
                fetched += page.results.len();

                for raw in page.results {
                    if !is_source_url(&raw.link) {
                        debug!(link = raw.link.as_str(), "Skipping article with unusable link");
                        continue;
                    }
                    if !seen_links.insert(raw.link.clone()) {
                        continue;
                    }
                    let article = Article::from_news(raw);
                    if article.published_at.is_some_and(|at| at < cutoff) {
                        continue;
                    }
                    if !is_relevant(&article.title, &article.body) {
                        continue;
                    }
                    let key = title_key(&article.title);
                    if !key.is_empty() && !seen_titles.insert(key) {
                        continue;
                    }
                    articles.push(article);
                }

                match page.next_page {
                    Some(cursor) if !cursor.is_empty() => query = query.next(cursor),
                    _ => break,
                }
            }
        }

        // Newest first; undated articles sink to the end.
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(self.max_articles);

        info!(
            fetched,
            kept = articles.len(),
            queries = self.queries.len(),
            "News collection complete"
        );
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::collections::HashMap;

    fn config(queries: &str, max_pages: &str, max_articles: &str) -> ScoutConfig {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("NEWSDATA_API_KEY", "pub_test"),
            ("LLM_API_KEY", "sk-test"),
            ("NEWS_QUERIES", queries),
            ("NEWS_MAX_PAGES", max_pages),
            ("NEWS_MAX_ARTICLES", max_articles),
            ("NEWS_REQUEST_DELAY_SECS", "0"),
            ("RETRY_MAX_ATTEMPTS", "2"),
            ("RETRY_BASE_DELAY_SECS", "0"),
        ]);
        ScoutConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn article_json(id: &str, title: &str, pub_date: &str) -> serde_json::Value {
        serde_json::json!({
            "article_id": id,
            "title": title,
            "link": format!("https://news.example.com/{id}"),
            "description": "Market news",
            "content": null,
            "pubDate": pub_date,
            "source_id": "example",
            "source_name": "Example News",
            "keywords": null
        })
    }

    #[test]
    fn relevance_filter() {
        assert!(is_relevant("Acme IPO opens today", ""));
        assert!(is_relevant("Markets", "The company filed its DRHP with SEBI"));
        assert!(is_relevant("Grey market signals strong listing", ""));
        assert!(is_relevant("Three IPOs this week", ""));
        assert!(!is_relevant("Sensex closes higher", "Banks rally on rate hopes"));
        assert!(!is_relevant("Tipo hits record", "Shipowners gain"));
    }

    #[test]
    fn title_keys_ignore_punctuation() {
        assert_eq!(title_key("Acme IPO: Day 1 - subscribed 2x!"), title_key("acme ipo day 1 subscribed 2x"));
    }

    #[tokio::test]
    async fn collects_filters_and_sorts() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "status": "success",
            "totalResults": 5,
            "results": [
                article_json("a1", "Acme IPO opens for subscription", "2026-10-15 08:00:00"),
                article_json("a2", "Sensex ends flat", "2026-10-16 09:00:00"),
                article_json("a3", "Beta Foods files DRHP with SEBI", "2026-10-16 10:00:00"),
                article_json("a4", "Acme IPO opens for subscription!", "2026-10-15 09:00:00"),
                article_json("a5", "Old IPO news", "2026-10-10 09:00:00")
            ],
            "nextPage": null
        });
        let mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "IPO India".into()),
                Matcher::UrlEncoded("country".into(), "in".into()),
                Matcher::UrlEncoded("timeframe".into(), "48".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("IPO India", "1", "10"));
        let articles = collector.collect(now()).await;

        mock.assert_async().await;
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta Foods files DRHP with SEBI", "Acme IPO opens for subscription"]);
        assert_eq!(articles[0].source_name.as_deref(), Some("Example News"));
    }

    #[tokio::test]
    async fn follows_next_page_and_dedups_links() {
        let mut server = mockito::Server::new_async().await;
        let first = serde_json::json!({
            "status": "success",
            "totalResults": 2,
            "results": [article_json("a1", "Acme IPO GMP rises", "2026-10-16 08:00:00")],
            "nextPage": "cursor-2"
        });
        let second = serde_json::json!({
            "status": "success",
            "totalResults": 2,
            "results": [
                article_json("a1", "Acme IPO GMP rises", "2026-10-16 08:00:00"),
                article_json("b1", "Gamma SME IPO subscribed 40 times", "2026-10-16 07:00:00")
            ],
            "nextPage": "cursor-3"
        });
        let page_one = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Regex("timeframe=48$".into()))
            .with_body(first.to_string())
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("page".into(), "cursor-2".into()))
            .with_body(second.to_string())
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("IPO India", "2", "10"));
        let articles = collector.collect(now()).await;

        page_one.assert_async().await;
        page_two.assert_async().await;
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn failed_query_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("q".into(), "broken".into()))
            .with_status(500)
            .with_body("boom")
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("q".into(), "SME IPO".into()))
            .with_body(
                serde_json::json!({
                    "status": "success",
                    "results": [article_json("s1", "Delta SME IPO lists at premium", "2026-10-16 06:00:00")],
                    "nextPage": null
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("broken;SME IPO", "1", "10"));
        let articles = collector.collect(now()).await;

        failing.assert_async().await;
        ok.assert_async().await;
        assert_eq!(articles.len(), 1);
    }

    #[tokio::test]
    async fn caps_article_count() {
        let mut server = mockito::Server::new_async().await;
        let results: Vec<serde_json::Value> = (0..5)
            .map(|i| article_json(&format!("c{i}"), &format!("Company {i} IPO"), &format!("2026-10-16 0{i}:00:00")))
            .collect();
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_body(serde_json::json!({"status": "success", "results": results}).to_string())
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("IPO", "1", "3"));
        let articles = collector.collect(now()).await;

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Company 4 IPO", "Company 3 IPO", "Company 2 IPO"]);
    }

    #[tokio::test]
    async fn quota_stops_remaining_queries() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("q".into(), "first".into()))
            .with_body(
                serde_json::json!({
                    "status": "success",
                    "results": [article_json("q1", "Acme IPO opens", "2026-10-16 06:00:00")],
                    "nextPage": null
                })
                .to_string(),
            )
            .create_async()
            .await;
        let exhausted = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("q".into(), "second".into()))
            .with_status(429)
            .with_body(
                r#"{"status":"error","results":{"message":"Daily limit reached","code":"DailyLimitExceeded"}}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let never = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::UrlEncoded("q".into(), "third".into()))
            .with_body(r#"{"status":"success","results":[]}"#)
            .expect(0)
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("first;second;third", "1", "10"));
        let articles = collector.collect(now()).await;

        first.assert_async().await;
        exhausted.assert_async().await;
        never.assert_async().await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Acme IPO opens");
    }

    #[tokio::test]
    async fn unusable_links_are_skipped() {
        let mut server = mockito::Server::new_async().await;
        let mut spaced = article_json("acme", "Acme IPO opens", "2026-10-16 06:00:00");
        spaced["link"] = serde_json::json!("https://news.example.com/acme ipo");
        let mut relative = article_json("gamma", "Gamma IPO allotment", "2026-10-16 05:00:00");
        relative["link"] = serde_json::json!("/markets/gamma");
        let _mock = server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_body(
                serde_json::json!({
                    "status": "success",
                    "results": [
                        spaced,
                        article_json("beta", "Beta Foods IPO price band fixed", "2026-10-16 07:00:00"),
                        relative
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = NewsDataClient::new("pub_test").with_base_url(server.url());
        let collector = Collector::new(client, &config("IPO", "1", "10"));
        let articles = collector.collect(now()).await;

        let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["https://news.example.com/beta"]);
        assert!(is_source_url(&articles[0].source_ref().url));
    }
}
