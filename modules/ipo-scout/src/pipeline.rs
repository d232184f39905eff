use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use ipo_common::validate::MAX_IPOS;
use ipo_common::{merge_records, validate_digest, Digest, IpoError, ScoutConfig};
use newsdata_client::NewsDataClient;

use crate::collector::Collector;
use crate::extractor::Extractor;
use crate::publisher::Publisher;
use crate::summarizer::Summarizer;

/// IST, the timezone IPO dates are quoted in.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// What happened to the digest at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Published,
    /// Printed to stdout instead of posted.
    DryRun,
    /// Nothing found and empty digests are not sent.
    SkippedEmpty,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub articles: usize,
    pub extracted: usize,
    pub failed_articles: usize,
    pub ipos: usize,
    pub delivery: Delivery,
}

/// One collect → extract → merge → summarize → publish pass.
pub struct Pipeline {
    collector: Collector,
    extractor: Extractor,
    summarizer: Summarizer,
    /// `None` means dry-run.
    publisher: Option<Publisher>,
    send_empty_digest: bool,
}

impl Pipeline {
    pub fn new(
        collector: Collector,
        extractor: Extractor,
        summarizer: Summarizer,
        publisher: Option<Publisher>,
        send_empty_digest: bool,
    ) -> Self {
        Self {
            collector,
            extractor,
            summarizer,
            publisher,
            send_empty_digest,
        }
    }

    /// Wire every stage from configuration. Dry runs need no endpoint.
    pub fn from_config(config: &ScoutConfig, dry_run: bool) -> Result<Self, IpoError> {
        let mut news = NewsDataClient::new(config.newsdata_api_key.clone());
        if let Some(url) = &config.newsdata_base_url {
            news = news.with_base_url(url.clone());
        }
        let chat = config.llm_provider.build(
            &config.llm_api_key,
            &config.llm_model,
            config.llm_base_url.as_deref(),
        );

        let publisher = if dry_run {
            None
        } else {
            Some(Publisher::new(
                config.endpoint()?,
                config.digest_token.clone(),
                config.retry,
            ))
        };

        Ok(Self::new(
            Collector::new(news, config),
            Extractor::new(chat.clone(), config.retry, config.llm_request_delay),
            Summarizer::new(chat, config.retry, config.digest_summary),
            publisher,
            config.send_empty_digest,
        ))
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunReport, IpoError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Scout run starting");

        let articles = self.collector.collect(now).await;
        let batch = self.extractor.extract_all(&articles, local_date(now)).await;
        let extracted = batch.records.len();
        let mut ipos = merge_records(batch.records);
        ipos.truncate(MAX_IPOS);
        let summary = self.summarizer.summarize(&ipos).await;

        let digest = Digest {
            run_id,
            generated_at: now,
            window_hours: self.collector.lookback_hours(),
            article_count: u32::try_from(articles.len()).unwrap_or(u32::MAX),
            summary,
            ipos,
        };
        check_digest(&digest)?;

        let delivery = if digest.is_empty() && !self.send_empty_digest {
            info!(%run_id, "No IPO activity found, skipping delivery");
            Delivery::SkippedEmpty
        } else {
            match &self.publisher {
                Some(publisher) => {
                    publisher.publish(&digest).await?;
                    Delivery::Published
                }
                None => {
                    let json = serde_json::to_string_pretty(&digest)
                        .map_err(|e| IpoError::Anyhow(e.into()))?;
                    println!("{json}");
                    Delivery::DryRun
                }
            }
        };

        let report = RunReport {
            run_id,
            articles: articles.len(),
            extracted,
            failed_articles: batch.failed,
            ipos: digest.ipos.len(),
            delivery,
        };
        info!(
            %run_id,
            articles = report.articles,
            extracted = report.extracted,
            failed_articles = report.failed_articles,
            ipos = report.ipos,
            delivery = ?report.delivery,
            "Scout run complete"
        );
        Ok(report)
    }
}

/// Today's date in India.
fn local_date(now: DateTime<Utc>) -> NaiveDate {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => now.with_timezone(&ist).date_naive(),
        None => now.date_naive(),
    }
}

/// The notify server rejects anything `validate_digest` rejects, so catch
/// it here where the run can be logged properly.
fn check_digest(digest: &Digest) -> Result<(), IpoError> {
    let value = serde_json::to_value(digest).map_err(|e| IpoError::Anyhow(e.into()))?;
    if let Err(issues) = validate_digest(&value) {
        for issue in &issues {
            warn!(path = issue.path.as_str(), detail = issue.message.as_str(), "Digest failed validation");
        }
        return Err(IpoError::Validation(format!(
            "{} issue(s), first at {:?}",
            issues.len(),
            issues.first().map(|i| i.path.as_str()).unwrap_or("")
        )));
    }
    Ok(())
}
