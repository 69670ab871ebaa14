use crate::model::{ModelPrediction, SentimentModel};
use commentpulse_core::{ClassificationError, CoreError, ModelConfig};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const DEFAULT_RETRY_AFTER_SECS: u64 = 30;
const DEFAULT_LOADING_SECS: u64 = 20;
/// Longest cold-start wait honoured before giving up.
const MAX_LOADING_WAIT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoredLabel {
    label: String,
    score: f32,
}

/// Per-input output: either every label with its score, or only the top one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceRow {
    Ranked(Vec<ScoredLabel>),
    Top(ScoredLabel),
}

#[derive(Debug, Deserialize)]
struct InferenceErrorBody {
    #[serde(default)]
    error: String,
    estimated_time: Option<f64>,
}

/// Text-classification model served by the Hugging Face Inference API.
#[derive(Debug)]
pub struct HuggingFaceModel {
    http_client: Client,
    model: String,
    endpoint: String,
    api_token: Option<String>,
    loading_retries: u32,
}

impl HuggingFaceModel {
    pub fn new(
        model: impl Into<String>,
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(concat!("commentpulse/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            loading_retries: 1,
        })
    }

    pub fn from_config(config: &ModelConfig, timeout: Duration) -> Result<Self, CoreError> {
        Self::new(
            config.name.clone(),
            config.endpoint.clone(),
            config.api_token.clone(),
            timeout,
        )
    }

    /// How many times a cold model is waited for before the call fails.
    pub fn with_loading_retries(mut self, retries: u32) -> Self {
        self.loading_retries = retries;
        self
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<ModelPrediction>, CoreError> {
        let body = InferenceRequest {
            inputs: texts,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.http_client.post(self.url()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Network error while calling {}: {}", self.model, e);
            if e.is_timeout() {
                CoreError::Classification(ClassificationError::RequestTimeout {
                    model: self.model.clone(),
                })
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
            let cls_error = map_inference_error(status, &body, &self.model, retry_after);
            error!(
                "Inference on {} failed with status {}: {}",
                self.model, status, cls_error
            );
            return Err(CoreError::Classification(cls_error));
        }

        let rows: Vec<InferenceRow> = response.json().await.map_err(|e| {
            CoreError::Classification(ClassificationError::InferenceFailed {
                reason: format!("Failed to parse inference response: {}", e),
            })
        })?;

        rows.into_iter().map(top_prediction).collect()
    }
}

impl SentimentModel for HuggingFaceModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<ModelPrediction>, CoreError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0;
        loop {
            debug!("Sending {} texts to {}", texts.len(), self.model);
            match self.request(texts).await {
                Err(CoreError::Classification(ClassificationError::ModelLoading {
                    estimated_secs,
                    ..
                })) if attempt < self.loading_retries => {
                    let wait = estimated_secs.min(MAX_LOADING_WAIT_SECS);
                    warn!("Model {} is loading, waiting {}s", self.model, wait);
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(predictions) => {
                    info!("{} returned {} predictions", self.model, predictions.len());
                    return Ok(predictions);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn top_prediction(row: InferenceRow) -> Result<ModelPrediction, CoreError> {
    let best = match row {
        InferenceRow::Top(scored) => Some(scored),
        InferenceRow::Ranked(scores) => scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score)),
    };

    best.map(|s| ModelPrediction::new(s.label, s.score))
        .ok_or_else(|| {
            CoreError::Classification(ClassificationError::InferenceFailed {
                reason: "Empty score list for an input".to_string(),
            })
        })
}

/// Maps a non-success inference response onto the classification taxonomy.
pub fn map_inference_error(
    status: StatusCode,
    body: &str,
    model: &str,
    retry_after: Option<u64>,
) -> ClassificationError {
    let parsed = serde_json::from_str::<InferenceErrorBody>(body).ok();
    let message = parsed
        .as_ref()
        .map(|b| b.error.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        401 | 403 => ClassificationError::InvalidApiToken {
            model: model.to_string(),
        },
        404 => ClassificationError::ModelNotAvailable {
            model: model.to_string(),
        },
        429 => ClassificationError::RateLimitExceeded {
            model: model.to_string(),
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        503 => ClassificationError::ModelLoading {
            model: model.to_string(),
            estimated_secs: parsed
                .and_then(|b| b.estimated_time)
                .map(|secs| secs.ceil().max(1.0) as u64)
                .unwrap_or(DEFAULT_LOADING_SECS),
        },
        _ => ClassificationError::InferenceFailed {
            reason: format!("Status {}: {}", status, message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

    #[test]
    fn test_model_url() {
        let model = HuggingFaceModel::new(
            MODEL,
            "https://api-inference.huggingface.co/models/",
            Some("  ".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            model.url(),
            "https://api-inference.huggingface.co/models/cardiffnlp/twitter-roberta-base-sentiment-latest"
        );
        assert_eq!(model.name(), MODEL);
        assert!(model.api_token.is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let texts = vec!["great".to_string(), "bad".to_string()];
        let body = serde_json::to_value(InferenceRequest {
            inputs: &texts,
            options: InferenceOptions {
                wait_for_model: true,
            },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "inputs": ["great", "bad"],
                "options": { "wait_for_model": true }
            })
        );
    }

    #[test]
    fn test_top_prediction_from_ranked_scores() {
        let rows: Vec<InferenceRow> = serde_json::from_str(
            r#"[
                [{"label": "negative", "score": 0.1}, {"label": "positive", "score": 0.8}, {"label": "neutral", "score": 0.1}],
                {"label": "neutral", "score": 0.6}
            ]"#,
        )
        .unwrap();

        let predictions: Vec<ModelPrediction> =
            rows.into_iter().map(top_prediction).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            predictions,
            vec![
                ModelPrediction::new("positive", 0.8),
                ModelPrediction::new("neutral", 0.6),
            ]
        );
    }

    #[test]
    fn test_empty_score_list_fails() {
        assert!(top_prediction(InferenceRow::Ranked(Vec::new())).is_err());
    }

    #[test]
    fn test_map_inference_errors() {
        assert_eq!(
            map_inference_error(StatusCode::UNAUTHORIZED, "", MODEL, None),
            ClassificationError::InvalidApiToken {
                model: MODEL.to_string()
            }
        );
        assert_eq!(
            map_inference_error(StatusCode::NOT_FOUND, "", MODEL, None),
            ClassificationError::ModelNotAvailable {
                model: MODEL.to_string()
            }
        );
        assert_eq!(
            map_inference_error(StatusCode::TOO_MANY_REQUESTS, "", MODEL, Some(7)),
            ClassificationError::RateLimitExceeded {
                model: MODEL.to_string(),
                retry_after: 7
            }
        );
        assert_eq!(
            map_inference_error(
                StatusCode::SERVICE_UNAVAILABLE,
                r#"{"error": "Model is currently loading", "estimated_time": 12.4}"#,
                MODEL,
                None
            ),
            ClassificationError::ModelLoading {
                model: MODEL.to_string(),
                estimated_secs: 13
            }
        );
        assert!(matches!(
            map_inference_error(
                StatusCode::BAD_REQUEST,
                r#"{"error": "bad inputs"}"#,
                MODEL,
                None
            ),
            ClassificationError::InferenceFailed { reason } if reason.contains("bad inputs")
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let model = HuggingFaceModel::new(
            MODEL,
            "http://127.0.0.1:9",
            None,
            Duration::from_millis(10),
        )
        .unwrap();
        assert!(model.predict_batch(&[]).await.unwrap().is_empty());
    }
}
