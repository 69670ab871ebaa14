use commentpulse_core::{CoreError, YouTubeApiError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request, first one included
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Retry config tuned for the YouTube Data API
    pub fn youtube() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1500,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }

    /// Same config with `retries` attempts on top of the first one.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_attempts = retries.saturating_add(1);
        self
    }

    /// Single attempt, never retries.
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after the delay the server asked for
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    match error {
        CoreError::YouTubeApi(api_error) => match api_error {
            YouTubeApiError::RateLimitExceeded { retry_after } => {
                RetryStrategy::RetryWithDelay(Duration::from_secs(*retry_after))
            }
            YouTubeApiError::ServerError { .. } => RetryStrategy::Retry,
            YouTubeApiError::RequestTimeout => RetryStrategy::Retry,
            // Quota, key, missing video and disabled comments won't fix themselves
            YouTubeApiError::InvalidApiKey
            | YouTubeApiError::QuotaExceeded
            | YouTubeApiError::CommentsDisabled { .. }
            | YouTubeApiError::VideoNotFound { .. }
            | YouTubeApiError::Forbidden { .. }
            | YouTubeApiError::InvalidRequest { .. }
            | YouTubeApiError::InvalidResponse { .. } => RetryStrategy::NoRetry,
        },
        CoreError::Network(reqwest_error) => {
            if reqwest_error.is_timeout() || reqwest_error.is_connect() {
                RetryStrategy::Retry
            } else {
                RetryStrategy::NoRetry
            }
        }
        CoreError::Timeout { .. } => RetryStrategy::Retry,
        _ => RetryStrategy::NoRetry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = Duration::from_millis(config.base_delay_ms);
    let max_delay = Duration::from_millis(config.max_delay_ms);

    let exponential_delay = if attempt == 0 {
        base_delay
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(max_delay)
}

/// Retry counters, surfaced through the client's usage report
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_retries: u64,
}

/// Retry executor that wraps operations with retry logic
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Arc<Mutex<RetryMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(Mutex::new(RetryMetrics::default())),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        self.with_metrics(|m| m.total_retries += u64::from(attempt));
                        info!("Operation {} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let has_attempts_left = attempt + 1 < max_attempts;
                    let delay = match get_retry_strategy(&error) {
                        RetryStrategy::Retry if has_attempts_left => {
                            Some(calculate_delay(attempt, &self.config))
                        }
                        RetryStrategy::RetryWithDelay(delay) if has_attempts_left => {
                            Some(delay.min(Duration::from_millis(self.config.max_delay_ms)))
                        }
                        _ => None,
                    };

                    let Some(delay) = delay else {
                        debug!(
                            "Giving up on {} after {} attempt(s): {}",
                            operation_name,
                            attempt + 1,
                            error
                        );
                        self.with_metrics(|m| m.total_retries += u64::from(attempt));
                        return Err(error);
                    };

                    warn!(
                        "Attempt {}/{} of {} failed, retrying in {:?}: {}",
                        attempt + 1,
                        max_attempts,
                        operation_name,
                        delay,
                        error
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Get current retry metrics
    pub fn get_metrics(&self) -> RetryMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn with_metrics(&self, update: impl FnOnce(&mut RetryMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            update(&mut metrics);
        }
    }
}
