use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use crate::pipeline::Pipeline;

/// Runs the pipeline on a fixed interval until ctrl-c.
pub struct Scheduler {
    pipeline: Pipeline,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    pub async fn run_forever(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Loop until `shutdown` resolves. A failed run is logged and the next
    /// one still happens on schedule.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.pipeline.run_once(Utc::now()) => {
                    if let Err(e) = result {
                        error!(error = %e, "Scout run failed");
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, abandoning current run");
                    return;
                }
            }

            info!(next_run_in_secs = self.interval.as_secs(), "Sleeping until next run");
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipo_common::ScoutConfig;
    use mockito::{Matcher, ServerGuard};
    use std::collections::HashMap;

    async fn empty_news(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/api/1/latest")
            .match_query(Matcher::Any)
            .with_body(r#"{"status":"success","results":[],"nextPage":null}"#)
            .create_async()
            .await
    }

    fn pipeline(news: &ServerGuard, notify: &ServerGuard) -> Pipeline {
        let vars: HashMap<String, String> = HashMap::from([
            ("NEWSDATA_API_KEY".to_string(), "pub_test".to_string()),
            ("NEWSDATA_BASE_URL".to_string(), news.url()),
            ("NEWS_QUERIES".to_string(), "IPO".to_string()),
            ("NEWS_MAX_PAGES".to_string(), "1".to_string()),
            ("NEWS_REQUEST_DELAY_SECS".to_string(), "0".to_string()),
            ("LLM_API_KEY".to_string(), "sk-test".to_string()),
            ("DIGEST_SUMMARY".to_string(), "false".to_string()),
            ("RETRY_MAX_ATTEMPTS".to_string(), "1".to_string()),
            ("SEND_EMPTY_DIGEST".to_string(), "true".to_string()),
            ("DIGEST_ENDPOINT_URL".to_string(), format!("{}/api/digest", notify.url())),
        ]);
        let config = ScoutConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        Pipeline::from_config(&config, false).unwrap()
    }

    #[tokio::test]
    async fn failed_runs_do_not_stop_the_loop() {
        let mut news = mockito::Server::new_async().await;
        let mut notify = mockito::Server::new_async().await;
        let _news = empty_news(&mut news).await;
        let rejected = notify
            .mock("POST", "/api/digest")
            .with_status(400)
            .with_body(r#"{"error":"invalid digest"}"#)
            .expect_at_least(2)
            .create_async()
            .await;

        let scheduler = Scheduler::new(pipeline(&news, &notify), Duration::from_millis(10));
        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(500)))
            .await;

        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_sleep() {
        let mut news = mockito::Server::new_async().await;
        let mut notify = mockito::Server::new_async().await;
        let _news = empty_news(&mut news).await;
        let delivered = notify
            .mock("POST", "/api/digest")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let scheduler = Scheduler::new(pipeline(&news, &notify), Duration::from_secs(3600));
        let stopped = tokio::time::timeout(
            Duration::from_secs(10),
            scheduler.run_until(tokio::time::sleep(Duration::from_millis(200))),
        )
        .await;

        assert!(stopped.is_ok(), "scheduler kept sleeping after shutdown");
        delivered.assert_async().await;
    }
}
