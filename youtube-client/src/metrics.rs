use serde::Serialize;
use std::time::Duration;
use tokio::sync::RwLock;

/// Running totals for the requests one client has sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    /// Data API quota units spent, as charged per request.
    pub quota_units_used: u64,
    pub average_response_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub response_time: Duration,
    pub success: bool,
    pub rate_limited: bool,
    pub quota_cost: u32,
}

/// What a comment source has spent so far, as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiUsage {
    pub requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub quota_units_used: u64,
    pub retries: u64,
    pub average_response_ms: u64,
}

impl ApiUsage {
    pub fn from_metrics(metrics: &ApiMetrics, retries: u64) -> Self {
        Self {
            requests: metrics.total_requests,
            failed_requests: metrics.failed_requests,
            rate_limited_requests: metrics.rate_limited_requests,
            quota_units_used: metrics.quota_units_used,
            retries,
            average_response_ms: u64::try_from(metrics.average_response_time.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: RwLock<ApiMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, request: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        metrics.total_requests += 1;
        metrics.quota_units_used += u64::from(request.quota_cost);
        if !request.success {
            metrics.failed_requests += 1;
        }
        if request.rate_limited {
            metrics.rate_limited_requests += 1;
        }

        // Running average over all requests so far
        let previous = u32::try_from(metrics.total_requests - 1).unwrap_or(u32::MAX);
        let count = previous.saturating_add(1);
        metrics.average_response_time =
            (metrics.average_response_time * previous + request.response_time) / count;
    }

    pub async fn snapshot(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }
}
