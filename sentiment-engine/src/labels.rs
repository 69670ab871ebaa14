use commentpulse_core::{ClassificationError, ConfigError, CoreError, SentimentLabel};
use std::str::FromStr;

/// How a model's raw output labels map onto the three sentiment classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScheme {
    /// Review-star models: `"1 star"` .. `"5 stars"`.
    StarRating,
    /// `positive` / `neutral` / `negative`, or `LABEL_0..2` in that reverse order.
    ThreeWay,
}

impl LabelScheme {
    /// Guesses the scheme from a model name.
    pub fn for_model(model_name: &str) -> Self {
        let name = model_name.to_ascii_lowercase();
        if name.contains("star") || name.starts_with("nlptown/") {
            LabelScheme::StarRating
        } else {
            LabelScheme::ThreeWay
        }
    }

    /// Explicit scheme from configuration, falling back to the model name.
    pub fn resolve(configured: Option<&str>, model_name: &str) -> Result<Self, CoreError> {
        match configured {
            Some(value) => value.parse(),
            None => Ok(Self::for_model(model_name)),
        }
    }

    pub fn map(&self, raw_label: &str) -> Result<SentimentLabel, ClassificationError> {
        let label = raw_label.trim();
        let mapped = match self {
            LabelScheme::StarRating => label
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .filter(|stars| (1..=5).contains(stars))
                .map(|stars| match stars {
                    1 | 2 => SentimentLabel::Negative,
                    3 => SentimentLabel::Neutral,
                    _ => SentimentLabel::Positive,
                }),
            LabelScheme::ThreeWay => match label.to_ascii_lowercase().as_str() {
                "positive" | "pos" | "label_2" => Some(SentimentLabel::Positive),
                "neutral" | "neu" | "label_1" => Some(SentimentLabel::Neutral),
                "negative" | "neg" | "label_0" => Some(SentimentLabel::Negative),
                _ => None,
            },
        };

        mapped.ok_or_else(|| ClassificationError::UnknownLabel {
            label: raw_label.to_string(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelScheme::StarRating => "star_rating",
            LabelScheme::ThreeWay => "three_way",
        }
    }
}

impl FromStr for LabelScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "star_rating" | "stars" => Ok(LabelScheme::StarRating),
            "three_way" | "sentiment" => Ok(LabelScheme::ThreeWay),
            other => Err(CoreError::Config(ConfigError::InvalidValue {
                field: "model.label_scheme".to_string(),
                value: other.to_string(),
            })),
        }
    }
}
