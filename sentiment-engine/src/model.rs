use commentpulse_core::CoreError;
use serde::{Deserialize, Serialize};

/// Top-scoring label the model produced for one input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub label: String,
    pub score: f32,
}

impl ModelPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A pretrained text-classification model.
///
/// Implementations return exactly one prediction per input, in input order,
/// or fail the whole call.
pub trait SentimentModel {
    fn name(&self) -> &str;

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<ModelPrediction>, CoreError>;
}

impl<M: SentimentModel> SentimentModel for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<ModelPrediction>, CoreError> {
        (**self).predict_batch(texts).await
    }
}
