use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder NewsData returns in `content` on free plans.
const PAID_PLAN_PLACEHOLDER: &str = "ONLY AVAILABLE IN PAID PLANS";

/// Parameters for one `/api/1/latest` request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub q: String,
    pub country: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    /// Restrict to articles from the last N hours (NewsData caps this at 48).
    pub timeframe_hours: Option<u32>,
    /// Opaque cursor from a previous page's `nextPage`.
    pub page: Option<String>,
}

impl NewsQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            country: None,
            language: None,
            category: None,
            timeframe_hours: None,
            page: None,
        }
    }

    pub fn next(&self, page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            ..self.clone()
        }
    }

    pub(crate) fn params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("apikey", api_key.to_string()), ("q", self.q.clone())];
        if let Some(ref c) = self.country {
            params.push(("country", c.clone()));
        }
        if let Some(ref l) = self.language {
            params.push(("language", l.clone()));
        }
        if let Some(ref c) = self.category {
            params.push(("category", c.clone()));
        }
        if let Some(h) = self.timeframe_hours {
            params.push(("timeframe", h.min(48).to_string()));
        }
        if let Some(ref p) = self.page {
            params.push(("page", p.clone()));
        }
        params
    }
}

/// One page of search results.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsPage {
    pub status: String,
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<NewsArticle>,
    #[serde(rename = "nextPage", default)]
    pub next_page: Option<String>,
}

/// A single article as NewsData returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub article_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

impl NewsArticle {
    /// Best body text available: full content, else description, else title.
    pub fn body_text(&self) -> &str {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.contains(PAID_PLAN_PLACEHOLDER))
            .or_else(|| {
                self.description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
            })
            .unwrap_or(&self.title)
    }

    /// `pubDate` is "YYYY-MM-DD HH:MM:SS" in UTC.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.pub_date.as_deref()?.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.and_utc())
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            })
    }
}

/// Error envelope: `{"status": "error", "results": {"message": ..., "code": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub results: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
}

/// NewsData sends `null` for fields it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
