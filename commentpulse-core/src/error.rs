use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid video identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    #[error("Failed to fetch comments for video {video_id} after {pages_fetched} page(s): {source}")]
    FetchFailed {
        video_id: String,
        pages_fetched: usize,
        #[source]
        source: Box<CoreError>,
    },

    #[error("YouTube API error: {0}")]
    YouTubeApi(#[from] YouTubeApiError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Wraps a page-level failure with the context of the fetch it aborted.
    pub fn fetch_failed(video_id: impl Into<String>, pages_fetched: usize, source: CoreError) -> Self {
        CoreError::FetchFailed {
            video_id: video_id.into(),
            pages_fetched,
            source: Box::new(source),
        }
    }

    pub fn invalid_identifier(input: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Innermost error, looking through `FetchFailed` wrappers.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            CoreError::FetchFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum YouTubeApiError {
    #[error("API key invalid or missing")]
    InvalidApiKey,

    #[error("Daily quota exceeded")]
    QuotaExceeded,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Comments are disabled for video {video_id}")]
    CommentsDisabled { video_id: String },

    #[error("Video not found: {video_id}")]
    VideoNotFound { video_id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("API token invalid or missing for model {model}")]
    InvalidApiToken { model: String },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Model {model} is loading, estimated {estimated_secs} seconds")]
    ModelLoading { model: String, estimated_secs: u64 },

    #[error("Rate limit exceeded for {model}. Retry after {retry_after} seconds")]
    RateLimitExceeded { model: String, retry_after: u64 },

    #[error("Request timeout for {model}")]
    RequestTimeout { model: String },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("Unrecognized model label '{label}'")]
    UnknownLabel { label: String },

    #[error("Invalid confidence {score} for comment #{index}")]
    InvalidConfidence { index: usize, score: f32 },

    #[error("Prediction count mismatch: expected {expected}, got {actual}")]
    PredictionCountMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
