pub mod classifier;
pub mod emotion;
pub mod huggingface;
pub mod labels;
pub mod model;

pub use classifier::{
    truncate_chars, SentimentClassifier, DEFAULT_BATCH_SIZE, DEFAULT_MAX_INPUT_CHARS,
};
pub use emotion::EmotionTagger;
pub use huggingface::{map_inference_error, HuggingFaceModel};
pub use labels::LabelScheme;
pub use model::{ModelPrediction, SentimentModel};
