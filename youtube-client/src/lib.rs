pub mod api;
pub mod metrics;
pub mod retry;


pub use api::{map_error_response, CommentThreadListResponse, YouTubeApiClient};
pub use metrics::{ApiMetrics, ApiUsage, MetricsCollector};
pub use retry::{RetryConfig, RetryExecutor};

use commentpulse_core::{CoreError, RawComment, VideoId, MAX_PAGE_SIZE};
use tracing::{debug, info, warn};

/// One response page of top-level comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPage {
    pub comments: Vec<RawComment>,
    /// Continuation cursor; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Paginated access to the top-level comments of a video.
pub trait CommentSource {
    /// Fetches a single page of at most `page_size` comments.
    async fn fetch_page(
        &self,
        video_id: &VideoId,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CommentPage, CoreError>;

    /// Follows continuation tokens until `max_comments` comments are collected
    /// or the listing is exhausted.
    ///
    /// Any page failure aborts the whole fetch with [`CoreError::FetchFailed`];
    /// comments from earlier pages are dropped.
    async fn fetch_comments(
        &self,
        video_id: &VideoId,
        max_comments: usize,
        page_size: u32,
    ) -> Result<Vec<RawComment>, CoreError> {
        let mut comments: Vec<RawComment> = Vec::new();
        if max_comments == 0 {
            return Ok(comments);
        }

        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        // Every non-empty page yields at least one comment, so this bounds
        // listings that keep returning empty pages with fresh tokens.
        let max_pages = max_comments;
        let mut page_token: Option<String> = None;
        let mut pages_fetched = 0;

        loop {
            let remaining = max_comments - comments.len();
            let request_size = u32::try_from(remaining).unwrap_or(u32::MAX).min(page_size);

            let page = self
                .fetch_page(video_id, request_size, page_token.as_deref())
                .await
                .map_err(|e| CoreError::fetch_failed(video_id.as_str(), pages_fetched, e))?;
            pages_fetched += 1;

            debug!(
                "Page {} for {} returned {} comments",
                pages_fetched,
                video_id,
                page.comments.len()
            );
            comments.extend(page.comments);

            if comments.len() >= max_comments {
                comments.truncate(max_comments);
                break;
            }

            match page.next_page_token {
                Some(next) if !next.is_empty() && page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next);
                }
                Some(_) => {
                    warn!("Continuation token for {} did not advance, stopping", video_id);
                    break;
                }
                None => break,
            }

            if pages_fetched >= max_pages {
                warn!(
                    "Stopping pagination for {} after {} pages",
                    video_id, pages_fetched
                );
                break;
            }
        }

        info!(
            "Fetched {} comments for {} in {} page(s)",
            comments.len(),
            video_id,
            pages_fetched
        );
        Ok(comments)
    }

    /// Request and quota spend so far, when the source tracks it.
    async fn usage(&self) -> Option<ApiUsage> {
        None
    }
}

impl CommentSource for YouTubeApiClient {
    async fn fetch_page(
        &self,
        video_id: &VideoId,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CommentPage, CoreError> {
        let response = self
            .list_comment_threads(video_id, page_size, page_token)
            .await?;

        Ok(CommentPage {
            comments: response.comment_texts(),
            next_page_token: response.next_page_token,
        })
    }

    async fn usage(&self) -> Option<ApiUsage> {
        Some(YouTubeApiClient::usage(self).await)
    }
}

impl<S: CommentSource> CommentSource for &S {
    async fn fetch_page(
        &self,
        video_id: &VideoId,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<CommentPage, CoreError> {
        (**self).fetch_page(video_id, page_size, page_token).await
    }

    async fn usage(&self) -> Option<ApiUsage> {
        (**self).usage().await
    }
}
