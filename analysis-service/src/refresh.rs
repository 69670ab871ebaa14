use chrono::{DateTime, Utc};
use commentpulse_core::{
    AggregateSummary, AggregationStore, AppConfig, ClassifiedComment, CoreError, ErrorRecovery, ErrorReporter,
    RecoveryStrategy, SeenKeys, VideoId,
};
use sentiment_engine::{SentimentClassifier, SentimentModel};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use youtube_client::{ApiUsage, CommentSource};

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    pub max_comments: usize,
    pub page_size: u32,
    pub interval: Duration,
}

impl RefreshConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_comments: config.max_comments,
            page_size: config.page_size,
            interval: config.refresh_interval(),
        }
    }
}

/// Outcome of one successful refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub fetched: usize,
    pub new_records: usize,
    /// Comments classified in this cycle only.
    pub records: Vec<ClassifiedComment>,
    /// Summary over everything classified since the loop started.
    pub summary: AggregateSummary,
    /// Source usage accumulated since the loop started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_usage: Option<ApiUsage>,
}

/// Periodically re-fetches a video's comments and classifies only the ones
/// not seen before.
///
/// The loop owns its store and seen-key set. A failed cycle changes neither,
/// so the next cycle retries the same comments.
pub struct RefreshLoop<S, M> {
    source: S,
    classifier: SentimentClassifier<M>,
    video_id: VideoId,
    config: RefreshConfig,
    store: AggregationStore,
    seen: SeenKeys,
    cycles: u64,
    reporter: ErrorReporter,
}

impl<S: CommentSource, M: SentimentModel> RefreshLoop<S, M> {
    pub fn new(
        source: S,
        classifier: SentimentClassifier<M>,
        video_id: VideoId,
        config: RefreshConfig,
    ) -> Self {
        Self {
            source,
            classifier,
            video_id,
            config,
            store: AggregationStore::new(),
            seen: SeenKeys::new(),
            cycles: 0,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of cycles that completed successfully.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub async fn run_cycle(&mut self) -> Result<CycleReport, CoreError> {
        let started_at = Utc::now();
        let cycle = self.cycles + 1;
        debug!("Starting refresh cycle {} for {}", cycle, self.video_id);

        let raw = self
            .source
            .fetch_comments(&self.video_id, self.config.max_comments, self.config.page_size)
            .await?;
        let fetched = raw.len();

        let fresh = self.seen.retain_unseen(raw);
        let records = self.classifier.classify_set(&fresh).await?;

        let new_records = records.len();
        self.store.extend(records.iter().cloned());
        self.seen.mark_seen(&fresh);
        self.cycles = cycle;

        let summary = self.store.summarize();
        info!(
            "Cycle {} for {}: {} fetched, {} new, {} total",
            cycle, self.video_id, fetched, new_records, summary.total
        );

        let api_usage = self.source.usage().await;
        if let Some(usage) = &api_usage {
            debug!(
                "Quota units used so far for {}: {} over {} requests",
                self.video_id, usage.quota_units_used, usage.requests
            );
        }

        Ok(CycleReport {
            cycle,
            started_at,
            fetched,
            new_records,
            records,
            summary,
            api_usage,
        })
    }

    /// Runs cycles until `shutdown` turns true, its sender goes away, or the
    /// report receiver is dropped.
    ///
    /// Transient failures are reported and retried on the next tick; a
    /// failure that needs user intervention ends the loop with that error.
    pub async fn run(
        &mut self,
        reports: mpsc::Sender<CycleReport>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), CoreError> {
        let mut consecutive_failures: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Refresh loop for {} cancelled", self.video_id);
                return Ok(());
            }

            let delay = match self.run_cycle().await {
                Ok(report) => {
                    consecutive_failures = 0;
                    if reports.send(report).await.is_err() {
                        info!("Report receiver dropped, stopping refresh loop");
                        return Ok(());
                    }
                    self.config.interval
                }
                Err(error) => {
                    consecutive_failures += 1;
                    match ErrorRecovery::determine_strategy(&error) {
                        RecoveryStrategy::Fail => {
                            self.reporter.report_error(&error);
                            return Err(error);
                        }
                        RecoveryStrategy::Skip => {
                            self.reporter.report_warning(&error);
                            self.config.interval
                        }
                        strategy @ RecoveryStrategy::RetryWithBackoff { .. } => {
                            self.reporter.report_warning(&error);
                            let delay = strategy
                                .backoff_delay(consecutive_failures)
                                .unwrap_or(self.config.interval);
                            warn!(
                                "Cycle failed {} time(s) in a row, next attempt in {:?}",
                                consecutive_failures, delay
                            );
                            delay
                        }
                    }
                }
            };

            if wait_or_cancel(delay, &mut shutdown).await {
                info!("Refresh loop for {} cancelled", self.video_id);
                return Ok(());
            }
        }
    }
}

/// Sleeps for `delay`; returns `true` as soon as cancellation is requested.
async fn wait_or_cancel(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return false,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => continue,
                // Nobody left to cancel or resume us
                Err(_) => return true,
            },
        }
    }
}
