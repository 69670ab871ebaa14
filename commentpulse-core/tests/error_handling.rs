use commentpulse_core::{
    ClassificationError, ConfigError, CoreError, ErrorExt, ErrorReporter, YouTubeApiError,
};
use std::error::Error as _;
use std::time::Duration;

#[test]
fn test_error_codes() {
    let youtube_error = CoreError::YouTubeApi(YouTubeApiError::InvalidApiKey);
    assert_eq!(youtube_error.error_code(), "YOUTUBE_API");

    let classification_error = CoreError::Classification(ClassificationError::UnknownLabel {
        label: "LABEL_9".to_string(),
    });
    assert_eq!(classification_error.error_code(), "CLASSIFICATION_FAILED");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "model.name".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let identifier_error = CoreError::invalid_identifier("nope", "too short");
    assert_eq!(identifier_error.error_code(), "INVALID_IDENTIFIER");

    let fetch_error =
        CoreError::fetch_failed("dQw4w9WgXcQ", 1, CoreError::Timeout { seconds: 30 });
    assert_eq!(fetch_error.error_code(), "FETCH_FAILED");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::YouTubeApi(YouTubeApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let quota_error = CoreError::YouTubeApi(YouTubeApiError::QuotaExceeded);
    assert!(!quota_error.is_retryable());

    let non_retryable_error = CoreError::invalid_identifier("nope", "too short");
    assert!(!non_retryable_error.is_retryable());

    let model_loading = CoreError::Classification(ClassificationError::ModelLoading {
        model: "m".to_string(),
        estimated_secs: 20,
    });
    assert!(model_loading.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::YouTubeApi(YouTubeApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let timeout_error = CoreError::Timeout { seconds: 30 };
    assert_eq!(timeout_error.retry_after(), Some(Duration::from_secs(30)));

    let wrapped = CoreError::fetch_failed("dQw4w9WgXcQ", 3, rate_limit_error);
    assert_eq!(wrapped.retry_after(), Some(Duration::from_secs(60)));
}

#[test]
fn test_fetch_failed_keeps_context() {
    let error = CoreError::fetch_failed(
        "dQw4w9WgXcQ",
        2,
        CoreError::YouTubeApi(YouTubeApiError::ServerError { status_code: 503 }),
    );

    let message = error.to_string();
    assert!(message.contains("dQw4w9WgXcQ"));
    assert!(message.contains("2 page(s)"));
    assert!(error.source().is_some());
    assert!(matches!(
        error.root_cause(),
        CoreError::YouTubeApi(YouTubeApiError::ServerError { status_code: 503 })
    ));
}

#[test]
fn test_user_friendly_messages() {
    let youtube_error = CoreError::YouTubeApi(YouTubeApiError::InvalidApiKey);
    let message = youtube_error.user_friendly_message();
    assert!(message.contains("YOUTUBE_API_KEY"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "model.name".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("model.name"));

    let identifier_error = CoreError::invalid_identifier("watch?x=1", "no id");
    assert!(identifier_error
        .user_friendly_message()
        .contains("watch?x=1"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::YouTubeApi(YouTubeApiError::QuotaExceeded);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
