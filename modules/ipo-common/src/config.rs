use std::env;
use std::str::FromStr;
use std::time::Duration;

use ai_client::Provider;
use mailer::{is_email, MailProvider};
use tracing::info;

use crate::error::{IpoError, Result};
use crate::retry::RetryPolicy;

const DEFAULT_QUERIES: &[&str] = &[
    "IPO India",
    "SEBI DRHP IPO",
    "IPO GMP grey market premium",
    "IPO subscription status",
    "IPO listing NSE BSE",
    "SME IPO",
];

const DEFAULT_EMAIL_FROM: &str = "IPO Radar <digest@ipo-radar.local>";

/// Scout configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    // News API
    pub newsdata_api_key: String,
    pub newsdata_base_url: Option<String>,
    pub news_queries: Vec<String>,
    pub news_country: String,
    pub news_language: String,
    pub news_category: Option<String>,
    pub news_max_pages: u32,
    pub news_lookback_hours: u32,
    pub news_max_articles: usize,
    pub news_request_delay: Duration,

    // LLM
    pub llm_provider: Provider,
    pub llm_model: String,
    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    pub llm_request_delay: Duration,
    pub digest_summary: bool,

    pub retry: RetryPolicy,

    // Delivery
    pub digest_endpoint_url: Option<String>,
    pub digest_token: Option<String>,
    pub send_empty_digest: bool,
    pub interval_hours: u64,
}

impl ScoutConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let llm_provider = Provider::from_str_loose(
            &vars.optional("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string()),
        )
        .map_err(|e| IpoError::Config(e.to_string()))?;
        let llm_api_key = vars
            .optional("LLM_API_KEY")
            .or_else(|| vars.optional(llm_provider.api_key_env()))
            .ok_or_else(|| {
                IpoError::Config(format!(
                    "LLM_API_KEY or {} environment variable is required",
                    llm_provider.api_key_env()
                ))
            })?;

        let news_queries: Vec<String> = match vars.optional("NEWS_QUERIES") {
            Some(raw) => raw
                .split(';')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
        };
        if news_queries.is_empty() {
            return Err(IpoError::Config("NEWS_QUERIES contains no queries".into()));
        }

        let max_attempts: u32 = vars.parse("RETRY_MAX_ATTEMPTS", 4)?;
        let interval_hours: u64 = vars.parse("SCOUT_INTERVAL_HOURS", 12)?;
        if interval_hours == 0 {
            return Err(IpoError::Config("SCOUT_INTERVAL_HOURS must be at least 1".into()));
        }

        let digest_endpoint_url = vars.optional("DIGEST_ENDPOINT_URL");
        if let Some(url) = &digest_endpoint_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(IpoError::Config(format!(
                    "DIGEST_ENDPOINT_URL must be an http(s) URL, got {url}"
                )));
            }
        }

        Ok(Self {
            newsdata_api_key: vars.required("NEWSDATA_API_KEY")?,
            newsdata_base_url: vars.optional("NEWSDATA_BASE_URL"),
            news_queries,
            news_country: vars.optional("NEWS_COUNTRY").unwrap_or_else(|| "in".to_string()),
            news_language: vars.optional("NEWS_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            news_category: match vars.optional("NEWS_CATEGORY") {
                Some(c) if c.eq_ignore_ascii_case("none") => None,
                Some(c) => Some(c),
                None => Some("business".to_string()),
            },
            news_max_pages: vars.parse("NEWS_MAX_PAGES", 2)?,
            news_lookback_hours: vars.parse("NEWS_LOOKBACK_HOURS", 48)?,
            news_max_articles: vars.parse("NEWS_MAX_ARTICLES", 40)?,
            news_request_delay: Duration::from_secs(vars.parse("NEWS_REQUEST_DELAY_SECS", 2)?),
            llm_model: vars
                .optional("LLM_MODEL")
                .unwrap_or_else(|| llm_provider.default_model().to_string()),
            llm_provider,
            llm_api_key,
            llm_base_url: vars.optional("LLM_BASE_URL"),
            llm_request_delay: Duration::from_secs(vars.parse("LLM_REQUEST_DELAY_SECS", 4)?),
            digest_summary: vars.flag("DIGEST_SUMMARY", true)?,
            retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                base_delay: Duration::from_secs(vars.parse("RETRY_BASE_DELAY_SECS", 5)?),
                max_delay: Duration::from_secs(vars.parse("RETRY_MAX_DELAY_SECS", 60)?),
            },
            digest_endpoint_url,
            digest_token: vars.optional("DIGEST_TOKEN"),
            send_empty_digest: vars.flag("SEND_EMPTY_DIGEST", false)?,
            interval_hours,
        })
    }

    /// The notify endpoint, required whenever digests are actually sent.
    pub fn endpoint(&self) -> Result<&str> {
        self.digest_endpoint_url
            .as_deref()
            .ok_or_else(|| IpoError::Config("DIGEST_ENDPOINT_URL environment variable is required".into()))
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            newsdata_api_key = %redact(&self.newsdata_api_key),
            newsdata_base_url = ?self.newsdata_base_url,
            queries = ?self.news_queries,
            country = %self.news_country,
            language = %self.news_language,
            category = ?self.news_category,
            max_pages = self.news_max_pages,
            lookback_hours = self.news_lookback_hours,
            max_articles = self.news_max_articles,
            llm_provider = %self.llm_provider,
            llm_model = %self.llm_model,
            llm_api_key = %redact(&self.llm_api_key),
            digest_summary = self.digest_summary,
            retry_attempts = self.retry.max_attempts,
            endpoint = ?self.digest_endpoint_url,
            digest_token = %self.digest_token.as_deref().map(redact).unwrap_or_default(),
            send_empty_digest = self.send_empty_digest,
            interval_hours = self.interval_hours,
            "Scout configuration"
        );
    }
}

/// Notify server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub host: String,
    pub port: u16,
    pub digest_token: Option<String>,

    // Email
    pub email_provider: MailProvider,
    pub email_api_key: Option<String>,
    pub mailgun_domain: Option<String>,
    pub email_from: String,
    pub email_to: Vec<String>,

    pub webhook_url: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let email_provider = MailProvider::from_str_loose(
            &vars.optional("EMAIL_PROVIDER").unwrap_or_else(|| "log".to_string()),
        )
        .map_err(|e| IpoError::Config(e.to_string()))?;

        let email_from = vars
            .optional("EMAIL_FROM")
            .unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string());
        if !is_email(&email_from) {
            return Err(IpoError::Config(format!("EMAIL_FROM is not an email address: {email_from}")));
        }

        let email_to = split_list(&vars.required("EMAIL_TO")?, ',');
        if email_to.is_empty() {
            return Err(IpoError::Config("EMAIL_TO contains no recipients".into()));
        }
        if let Some(bad) = email_to.iter().find(|r| !is_email(r)) {
            return Err(IpoError::Config(format!("EMAIL_TO contains an invalid address: {bad}")));
        }

        Ok(Self {
            host: vars.optional("NOTIFY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse("NOTIFY_PORT", 8080)?,
            digest_token: vars.optional("DIGEST_TOKEN"),
            email_provider,
            email_api_key: vars.optional("EMAIL_API_KEY"),
            mailgun_domain: vars.optional("MAILGUN_DOMAIN"),
            email_from,
            email_to,
            webhook_url: vars.optional("WEBHOOK_URL"),
            allowed_origins: vars
                .optional("ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw, ','))
                .unwrap_or_default(),
        })
    }

    pub fn log_redacted(&self) {
        info!(
            host = %self.host,
            port = self.port,
            digest_token = %self.digest_token.as_deref().map(redact).unwrap_or_default(),
            email_provider = %self.email_provider,
            email_api_key = %self.email_api_key.as_deref().map(redact).unwrap_or_default(),
            mailgun_domain = ?self.mailgun_domain,
            email_from = %self.email_from,
            email_to = ?self.email_to,
            webhook = self.webhook_url.is_some(),
            allowed_origins = ?self.allowed_origins,
            "Notify configuration"
        );
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Set and non-blank.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| IpoError::Config(format!("{key} environment variable is required")))
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| IpoError::Config(format!("{key} has an invalid value: {raw}"))),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.optional(key).map(|v| v.to_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(IpoError::Config(format!("{key} must be true or false, got {v}"))),
        }
    }
}

fn split_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Keep a short prefix so operators can tell keys apart.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}
