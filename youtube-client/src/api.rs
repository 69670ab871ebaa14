use crate::metrics::{ApiUsage, MetricsCollector, RequestMetrics};
use crate::retry::{RetryConfig, RetryExecutor};
use commentpulse_core::{CoreError, VideoId, YouTubeApiError, MAX_PAGE_SIZE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const COMMENT_THREADS_ENDPOINT: &str = "/commentThreads";
const API_KEY_HEADER: &str = "X-Goog-Api-Key";
/// Quota units charged for one `commentThreads.list` call.
const COMMENT_THREADS_QUOTA_COST: u32 = 1;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadListResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
    pub next_page_token: Option<String>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: Option<u32>,
    pub results_per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub video_id: Option<String>,
    pub top_level_comment: TopLevelComment,
    pub total_reply_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub text_display: String,
    pub text_original: Option<String>,
    pub author_display_name: Option<String>,
    pub like_count: Option<u64>,
    pub published_at: Option<String>,
}

impl CommentThreadListResponse {
    /// Display text of each top-level comment, in response order.
    pub fn comment_texts(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|thread| thread.snippet.top_level_comment.snippet.text_display.clone())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    reason: String,
}

#[derive(Debug)]
pub struct YouTubeApiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    retry: RetryExecutor,
    metrics: MetricsCollector,
}

impl YouTubeApiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(concat!("commentpulse/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: YOUTUBE_API_BASE.to_string(),
            retry: RetryExecutor::new(RetryConfig::youtube()),
            metrics: MetricsCollector::new(),
        })
    }

    /// Points the client at another API root, e.g. a proxy or a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of top-level comment threads, retried on transient failures.
    pub async fn list_comment_threads(
        &self,
        video_id: &VideoId,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<CommentThreadListResponse, CoreError> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE);
        self.retry
            .execute("commentThreads.list", || {
                self.request_comment_threads(video_id, max_results, page_token)
            })
            .await
    }

    /// The key travels in a header so it never appears in URLs that end up in
    /// error messages and logs.
    fn comment_threads_request(
        &self,
        video_id: &VideoId,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, COMMENT_THREADS_ENDPOINT);
        let max_results = max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id.as_str()),
            ("maxResults", max_results.as_str()),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        self.http_client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .query(&params)
    }

    async fn request_comment_threads(
        &self,
        video_id: &VideoId,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<CommentThreadListResponse, CoreError> {
        debug!(
            "Requesting comment threads for {} (page token: {:?})",
            video_id, page_token
        );
        let request = self.comment_threads_request(video_id, max_results, page_token);
        let start_time = Instant::now();
        let result = self.send_comment_threads(request, video_id).await;

        self.metrics
            .record_request(RequestMetrics {
                response_time: start_time.elapsed(),
                success: result.is_ok(),
                rate_limited: matches!(
                    &result,
                    Err(CoreError::YouTubeApi(YouTubeApiError::RateLimitExceeded { .. }))
                ),
                quota_cost: COMMENT_THREADS_QUOTA_COST,
            })
            .await;

        result
    }

    async fn send_comment_threads(
        &self,
        request: RequestBuilder,
        video_id: &VideoId,
    ) -> Result<CommentThreadListResponse, CoreError> {
        let response = request.send().await.map_err(|e| {
            error!("Network error while listing comments for {}: {}", video_id, e);
            if e.is_timeout() {
                CoreError::YouTubeApi(YouTubeApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let api_error = map_error_response(status, &body, video_id, retry_after);
            error!(
                "commentThreads.list failed with status {} for {}: {}",
                status, video_id, api_error
            );
            return Err(CoreError::YouTubeApi(api_error));
        }

        let listing: CommentThreadListResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment threads for {}: {}", video_id, e);
            CoreError::YouTubeApi(YouTubeApiError::InvalidResponse {
                details: format!("Failed to parse comment threads: {}", e),
            })
        })?;

        info!(
            "Retrieved {} comment threads for {}",
            listing.items.len(),
            video_id
        );
        Ok(listing)
    }

    /// Requests, failures, quota and retries spent by this client so far.
    pub async fn usage(&self) -> ApiUsage {
        let metrics = self.metrics.snapshot().await;
        ApiUsage::from_metrics(&metrics, self.retry.get_metrics().total_retries)
    }
}

/// Maps a non-success response onto the API error taxonomy.
///
/// 403 covers several unrelated conditions; the `reason` inside Google's error
/// envelope tells them apart.
pub fn map_error_response(
    status: StatusCode,
    body: &str,
    video_id: &VideoId,
    retry_after: Option<u64>,
) -> YouTubeApiError {
    let envelope = serde_json::from_str::<GoogleErrorEnvelope>(body).ok();
    let reason = envelope
        .as_ref()
        .and_then(|e| e.error.errors.first())
        .map(|d| d.reason.as_str())
        .unwrap_or_default();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        400 if reason == "keyInvalid" => YouTubeApiError::InvalidApiKey,
        400 => YouTubeApiError::InvalidRequest { details: message },
        401 => YouTubeApiError::InvalidApiKey,
        403 => match reason {
            "quotaExceeded" | "dailyLimitExceeded" => YouTubeApiError::QuotaExceeded,
            "rateLimitExceeded" | "userRateLimitExceeded" => YouTubeApiError::RateLimitExceeded {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            "commentsDisabled" => YouTubeApiError::CommentsDisabled {
                video_id: video_id.to_string(),
            },
            "keyInvalid" => YouTubeApiError::InvalidApiKey,
            _ => YouTubeApiError::Forbidden { reason: message },
        },
        404 => YouTubeApiError::VideoNotFound {
            video_id: video_id.to_string(),
        },
        429 => {
            let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!("Rate limited, retry after {} seconds", retry_after);
            YouTubeApiError::RateLimitExceeded { retry_after }
        }
        code if status.is_server_error() => YouTubeApiError::ServerError { status_code: code },
        _ => YouTubeApiError::InvalidResponse {
            details: format!("Unexpected status {}: {}", status, message),
        },
    }
}
