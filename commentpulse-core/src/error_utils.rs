use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::FetchFailed { source, .. } => {
                error!("Fetch failure cause: {:?}", source);
            }
            CoreError::YouTubeApi(e) => {
                error!("YouTube API error details: {:?}", e);
            }
            CoreError::Classification(e) => {
                error!("Classification error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::FetchFailed { source, .. } => source.is_retryable(),
            CoreError::YouTubeApi(e) => e.is_retryable(),
            CoreError::Classification(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            CoreError::Timeout { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::FetchFailed { source, .. } => source.retry_after(),
            CoreError::YouTubeApi(e) => e.retry_after(),
            CoreError::Classification(e) => e.retry_after(),
            CoreError::Timeout { seconds } => Some(Duration::from_secs(*seconds)),
            _ if self.is_retryable() => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::InvalidIdentifier { input, .. } => format!(
                "'{}' is not a YouTube video URL or ID. Please check your input.",
                input
            ),
            CoreError::FetchFailed {
                video_id, source, ..
            } => format!(
                "Could not fetch comments for video {}. {}",
                video_id,
                source.user_friendly_message()
            ),
            CoreError::YouTubeApi(e) => e.user_friendly_message(),
            CoreError::Classification(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Timeout { .. } => {
                "The operation took too long to complete. Please try again.".to_string()
            }
            CoreError::Cancelled => "The operation was cancelled.".to_string(),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::InvalidIdentifier { .. } => "INVALID_IDENTIFIER".to_string(),
            CoreError::FetchFailed { .. } => "FETCH_FAILED".to_string(),
            CoreError::YouTubeApi(_) => "YOUTUBE_API".to_string(),
            CoreError::Classification(_) => "CLASSIFICATION_FAILED".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Timeout { .. } => "TIMEOUT".to_string(),
            CoreError::Cancelled => "CANCELLED".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for YouTubeApiError {
    fn log_error(&self) -> &Self {
        error!("YouTubeApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("YouTubeApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            YouTubeApiError::RateLimitExceeded { .. } => true,
            YouTubeApiError::RequestTimeout => true,
            YouTubeApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            YouTubeApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            YouTubeApiError::InvalidApiKey => {
                "The YouTube API key is invalid. Please check YOUTUBE_API_KEY.".to_string()
            }
            YouTubeApiError::QuotaExceeded => {
                "The YouTube API daily quota is exhausted. Please try again tomorrow.".to_string()
            }
            YouTubeApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            YouTubeApiError::CommentsDisabled { video_id } => {
                format!("Comments are disabled for video {}.", video_id)
            }
            YouTubeApiError::VideoNotFound { video_id } => {
                format!("Video {} was not found or is private.", video_id)
            }
            YouTubeApiError::RequestTimeout => {
                "Request to YouTube timed out. Please try again.".to_string()
            }
            _ => "YouTube API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            YouTubeApiError::InvalidApiKey => "YT_INVALID_API_KEY".to_string(),
            YouTubeApiError::QuotaExceeded => "YT_QUOTA_EXCEEDED".to_string(),
            YouTubeApiError::RateLimitExceeded { .. } => "YT_RATE_LIMIT".to_string(),
            YouTubeApiError::CommentsDisabled { .. } => "YT_COMMENTS_DISABLED".to_string(),
            YouTubeApiError::VideoNotFound { .. } => "YT_VIDEO_NOT_FOUND".to_string(),
            YouTubeApiError::Forbidden { .. } => "YT_FORBIDDEN".to_string(),
            YouTubeApiError::InvalidRequest { .. } => "YT_INVALID_REQUEST".to_string(),
            YouTubeApiError::RequestTimeout => "YT_TIMEOUT".to_string(),
            YouTubeApiError::InvalidResponse { .. } => "YT_INVALID_RESPONSE".to_string(),
            YouTubeApiError::ServerError { .. } => "YT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ClassificationError {
    fn log_error(&self) -> &Self {
        error!("ClassificationError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ClassificationError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClassificationError::ModelLoading { .. }
                | ClassificationError::RateLimitExceeded { .. }
                | ClassificationError::RequestTimeout { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ClassificationError::ModelLoading { estimated_secs, .. } => {
                Some(Duration::from_secs((*estimated_secs).max(1)))
            }
            ClassificationError::RateLimitExceeded { retry_after, .. } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(10)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ClassificationError::InvalidApiToken { model } => format!(
                "Access to model {} was denied. Please check HF_API_TOKEN.",
                model
            ),
            ClassificationError::ModelNotAvailable { model } => format!(
                "Model '{}' is not available. Please try a different model.",
                model
            ),
            ClassificationError::ModelLoading { model, .. } => {
                format!("Model {} is still loading. Please try again shortly.", model)
            }
            ClassificationError::RateLimitExceeded { model, retry_after } => format!(
                "Rate limit exceeded for {}. Please wait {} seconds.",
                model, retry_after
            ),
            _ => "Sentiment classification failed. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ClassificationError::InvalidApiToken { .. } => "CLS_INVALID_API_TOKEN".to_string(),
            ClassificationError::ModelNotAvailable { .. } => "CLS_MODEL_NOT_AVAILABLE".to_string(),
            ClassificationError::ModelLoading { .. } => "CLS_MODEL_LOADING".to_string(),
            ClassificationError::RateLimitExceeded { .. } => "CLS_RATE_LIMIT".to_string(),
            ClassificationError::RequestTimeout { .. } => "CLS_TIMEOUT".to_string(),
            ClassificationError::InferenceFailed { .. } => "CLS_INFERENCE_FAILED".to_string(),
            ClassificationError::UnknownLabel { .. } => "CLS_UNKNOWN_LABEL".to_string(),
            ClassificationError::InvalidConfidence { .. } => "CLS_INVALID_CONFIDENCE".to_string(),
            ClassificationError::PredictionCountMismatch { .. } => {
                "CLS_PREDICTION_COUNT_MISMATCH".to_string()
            }
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
            if error.is_retryable() {
                if let Some(retry_after) = error.retry_after() {
                    info!("Error is retryable. Retry after: {:?}", retry_after);
                }
            }
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
