//! Error recovery strategies for long-running pipelines.
//!
//! A refresh cycle that fails leaves the session state untouched, so the only
//! decision left is whether to try again later, move on, or stop altogether.

use crate::{ClassificationError, CoreError, ErrorExt, YouTubeApiError};
use std::time::Duration;

/// Recovery strategy for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Try again after an exponentially growing delay
    RetryWithBackoff {
        initial_delay: Duration,
        max_delay: Duration,
    },
    /// Drop the failed unit of work and continue on the normal schedule
    Skip,
    /// Stop and surface the error to the caller
    Fail,
}

impl RecoveryStrategy {
    /// Delay before the next attempt after `consecutive_failures` failures in a row.
    ///
    /// Returns `None` for strategies that do not wait.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Option<Duration> {
        match self {
            RecoveryStrategy::RetryWithBackoff {
                initial_delay,
                max_delay,
            } => {
                let exponent = consecutive_failures.saturating_sub(1).min(16);
                let delay = initial_delay.saturating_mul(1u32 << exponent);
                Some(delay.min(*max_delay))
            }
            RecoveryStrategy::Skip | RecoveryStrategy::Fail => None,
        }
    }
}

/// Error recovery handler that provides strategies for different error types
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            CoreError::FetchFailed { source, .. } => Self::determine_strategy(source),

            CoreError::YouTubeApi(api_error) => match api_error {
                // Quota resets daily, hammering it is pointless
                YouTubeApiError::InvalidApiKey
                | YouTubeApiError::QuotaExceeded
                | YouTubeApiError::CommentsDisabled { .. }
                | YouTubeApiError::VideoNotFound { .. }
                | YouTubeApiError::Forbidden { .. }
                | YouTubeApiError::InvalidRequest { .. } => RecoveryStrategy::Fail,
                YouTubeApiError::InvalidResponse { .. } => RecoveryStrategy::Skip,
                _ => Self::backoff_for(error),
            },

            CoreError::Classification(cls_error) => match cls_error {
                ClassificationError::InvalidApiToken { .. }
                | ClassificationError::ModelNotAvailable { .. }
                | ClassificationError::UnknownLabel { .. } => RecoveryStrategy::Fail,
                ClassificationError::InvalidConfidence { .. }
                | ClassificationError::PredictionCountMismatch { .. }
                | ClassificationError::InferenceFailed { .. } => RecoveryStrategy::Skip,
                _ => Self::backoff_for(error),
            },

            CoreError::Network(_) | CoreError::Timeout { .. } => Self::backoff_for(error),

            // Need user intervention
            CoreError::InvalidIdentifier { .. } | CoreError::Config(_) => RecoveryStrategy::Fail,

            CoreError::Cancelled => RecoveryStrategy::Fail,

            CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Internal { .. } => {
                RecoveryStrategy::Skip
            }
        }
    }

    fn backoff_for(error: &CoreError) -> RecoveryStrategy {
        RecoveryStrategy::RetryWithBackoff {
            initial_delay: error.retry_after().unwrap_or(Duration::from_secs(5)),
            max_delay: Duration::from_secs(300),
        }
    }
}
