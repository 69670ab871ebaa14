use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const YOUTUBE_API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const HF_API_TOKEN_VAR: &str = "HF_API_TOKEN";
pub const MAX_COMMENTS_VAR: &str = "COMMENTPULSE_MAX_COMMENTS";
pub const REFRESH_SECS_VAR: &str = "COMMENTPULSE_REFRESH_SECS";

/// Largest page the comment listing endpoint will serve.
pub const MAX_PAGE_SIZE: u32 = 100;
const MAX_COMMENTS_CEILING: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub youtube_api_key: Option<String>,
    pub max_comments: usize,
    pub page_size: u32,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub fetch_retries: u32,
    /// Classify only a random subset of this many unique comments.
    pub sample_size: Option<usize>,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    pub api_token: Option<String>,
    /// `"star_rating"` or `"three_way"`; guessed from the model name when unset.
    pub label_scheme: Option<String>,
    pub max_input_chars: usize,
    pub batch_size: usize,
    /// Attach a random, purely illustrative emotion to each classified comment.
    pub decorative_emotions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            max_comments: 200,
            page_size: MAX_PAGE_SIZE,
            refresh_interval_secs: 60,
            request_timeout_secs: 30,
            fetch_retries: 2,
            sample_size: None,
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "cardiffnlp/twitter-roberta-base-sentiment-latest".to_string(),
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            api_token: None,
            label_scheme: None,
            max_input_chars: 512,
            batch_size: 32,
            decorative_emotions: false,
        }
    }
}

impl AppConfig {
    /// Parses a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CoreError::Io(e)
            }
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Overlays values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), CoreError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Overlays values from `lookup`, which maps a variable name to its value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(YOUTUBE_API_KEY_VAR).filter(|v| !v.trim().is_empty()) {
            self.youtube_api_key = Some(key.trim().to_string());
        }
        if let Some(token) = lookup(HF_API_TOKEN_VAR).filter(|v| !v.trim().is_empty()) {
            self.model.api_token = Some(token.trim().to_string());
        }
        if let Some(raw) = lookup(MAX_COMMENTS_VAR).filter(|v| !v.trim().is_empty()) {
            self.max_comments = parse_number(MAX_COMMENTS_VAR, &raw)?;
        }
        if let Some(raw) = lookup(REFRESH_SECS_VAR).filter(|v| !v.trim().is_empty()) {
            self.refresh_interval_secs = parse_number(REFRESH_SECS_VAR, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self.youtube_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingEnvironmentVariable {
                    var_name: YOUTUBE_API_KEY_VAR.to_string(),
                }
                .into())
            }
        }

        check_range("max_comments", self.max_comments, 1, MAX_COMMENTS_CEILING)?;
        check_range("page_size", self.page_size, 1, MAX_PAGE_SIZE)?;
        if let Some(sample_size) = self.sample_size {
            check_range("sample_size", sample_size, 1, MAX_COMMENTS_CEILING)?;
        }
        check_range("refresh_interval_secs", self.refresh_interval_secs, 1, u64::MAX)?;
        check_range("request_timeout_secs", self.request_timeout_secs, 1, 600)?;
        check_range("model.max_input_chars", self.model.max_input_chars, 1, usize::MAX)?;
        check_range("model.batch_size", self.model.batch_size, 1, 256)?;

        if self.model.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "model.name".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
        }
        .into()
    })
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), CoreError>
where
    T: PartialOrd + ToString,
{
    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.max_comments, 200);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.sample_size, None);
        assert_eq!(config.model.max_input_chars, 512);
        assert!(!config.model.decorative_emotions);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            max_comments = 50
            refresh_interval_secs = 15
            sample_size = 20

            [model]
            name = "nlptown/bert-base-multilingual-uncased-sentiment"
            decorative_emotions = true
            "#,
        )
        .unwrap();

        assert_eq!(config.max_comments, 50);
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.sample_size, Some(20));
        assert_eq!(config.page_size, 100);
        assert_eq!(
            config.model.name,
            "nlptown/bert-base-multilingual-uncased-sentiment"
        );
        assert_eq!(config.model.batch_size, 32);
        assert!(config.model.decorative_emotions);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("max_comments = \"lots\"");
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file("/definitely/not/here/commentpulse.toml");
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_env_overlay() {
        let mut config = AppConfig::default();
        config
            .apply_env_from(env(&[
                (YOUTUBE_API_KEY_VAR, " key-123 "),
                (HF_API_TOKEN_VAR, "hf_abc"),
                (MAX_COMMENTS_VAR, "75"),
            ]))
            .unwrap();

        assert_eq!(config.youtube_api_key.as_deref(), Some("key-123"));
        assert_eq!(config.model.api_token.as_deref(), Some("hf_abc"));
        assert_eq!(config.max_comments, 75);
        assert_eq!(config.refresh_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let mut config = AppConfig::default();
        let result = config.apply_env_from(env(&[(REFRESH_SECS_VAR, "soon")]));
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_env_overlay_ignores_blank_values() {
        let mut config = AppConfig::default();
        config
            .apply_env_from(env(&[(MAX_COMMENTS_VAR, ""), (REFRESH_SECS_VAR, "  ")]))
            .unwrap();
        assert_eq!(config.max_comments, 200);
        assert_eq!(config.refresh_interval_secs, 60);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = AppConfig::default();
        match config.validate() {
            Err(CoreError::Config(ConfigError::MissingEnvironmentVariable { var_name })) => {
                assert_eq!(var_name, YOUTUBE_API_KEY_VAR)
            }
            other => panic!("Expected missing API key, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = AppConfig {
            youtube_api_key: Some("key".to_string()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());

        config.page_size = 101;
        assert!(config.validate().is_err());

        config.page_size = 50;
        config.max_comments = 0;
        assert!(config.validate().is_err());

        config.max_comments = 10;
        config.model.batch_size = 0;
        assert!(config.validate().is_err());

        config.model.batch_size = 8;
        config.sample_size = Some(0);
        assert!(config.validate().is_err());

        config.sample_size = Some(50);
        assert!(config.validate().is_ok());
    }
}
