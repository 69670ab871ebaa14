use crate::emotion::EmotionTagger;
use crate::labels::LabelScheme;
use crate::model::{ModelPrediction, SentimentModel};
use commentpulse_core::{
    ClassificationError, ClassifiedComment, CoreError, ModelConfig, RawComment, UniqueCommentSet,
};
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Labels comments through a [`SentimentModel`].
///
/// A call either classifies every input or fails as a whole; no partial
/// output is ever returned.
#[derive(Debug)]
pub struct SentimentClassifier<M> {
    model: M,
    scheme: LabelScheme,
    max_input_chars: usize,
    batch_size: usize,
    tagger: Option<Mutex<EmotionTagger>>,
}

impl<M: SentimentModel> SentimentClassifier<M> {
    pub fn new(model: M, scheme: LabelScheme) -> Self {
        Self {
            model,
            scheme,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            batch_size: DEFAULT_BATCH_SIZE,
            tagger: None,
        }
    }

    pub fn from_config(model: M, config: &ModelConfig) -> Result<Self, CoreError> {
        let scheme = LabelScheme::resolve(config.label_scheme.as_deref(), model.name())?;
        let classifier = Self::new(model, scheme)
            .with_max_input_chars(config.max_input_chars)
            .with_batch_size(config.batch_size);

        Ok(if config.decorative_emotions {
            classifier.with_emotions(EmotionTagger::new())
        } else {
            classifier
        })
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Enables the decorative emotion tag on every record.
    pub fn with_emotions(mut self, tagger: EmotionTagger) -> Self {
        self.tagger = Some(Mutex::new(tagger));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn scheme(&self) -> LabelScheme {
        self.scheme
    }

    pub fn emotions_enabled(&self) -> bool {
        self.tagger.is_some()
    }

    /// Classifies `comments` in order, one record per input.
    pub async fn classify(
        &self,
        comments: &[RawComment],
    ) -> Result<Vec<ClassifiedComment>, CoreError> {
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(comments.len());
        for (chunk_index, chunk) in comments.chunks(self.batch_size).enumerate() {
            let inputs: Vec<String> = chunk
                .iter()
                .map(|text| truncate_chars(text, self.max_input_chars).to_string())
                .collect();

            debug!(
                "Classifying chunk {} ({} comments) with {}",
                chunk_index + 1,
                inputs.len(),
                self.model.name()
            );
            let predictions = self.model.predict_batch(&inputs).await?;
            if predictions.len() != chunk.len() {
                return Err(ClassificationError::PredictionCountMismatch {
                    expected: chunk.len(),
                    actual: predictions.len(),
                }
                .into());
            }

            let offset = chunk_index * self.batch_size;
            for (i, (comment, prediction)) in chunk.iter().zip(predictions).enumerate() {
                records.push(self.to_record(offset + i, comment, prediction)?);
            }
        }

        info!(
            "Classified {} comments with {}",
            records.len(),
            self.model.name()
        );
        Ok(records)
    }

    pub async fn classify_set(
        &self,
        comments: &UniqueCommentSet,
    ) -> Result<Vec<ClassifiedComment>, CoreError> {
        self.classify(comments.as_slice()).await
    }

    fn to_record(
        &self,
        index: usize,
        comment: &str,
        prediction: ModelPrediction,
    ) -> Result<ClassifiedComment, CoreError> {
        let score = prediction.score;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(ClassificationError::InvalidConfidence { index, score }.into());
        }

        let label = self.scheme.map(&prediction.label)?;
        let record = ClassifiedComment::new(comment, label, score);

        Ok(match &self.tagger {
            Some(tagger) => match tagger.lock() {
                Ok(mut tagger) => record.with_emotion(tagger.pick(label)),
                Err(poisoned) => {
                    warn!("Emotion tagger lock poisoned, reusing its last state");
                    record.with_emotion(poisoned.into_inner().pick(label))
                }
            },
            None => record,
        })
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
