use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum length of a canonical YouTube video id accepted as-is.
pub const MIN_VIDEO_ID_LEN: usize = 10;

/// Canonical YouTube video id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if Self::is_canonical(&id) {
            Ok(Self(id))
        } else {
            Err(CoreError::invalid_identifier(
                id,
                format!(
                    "expected at least {} characters of [A-Za-z0-9_-]",
                    MIN_VIDEO_ID_LEN
                ),
            ))
        }
    }

    /// Whether `candidate` matches the video id token grammar.
    pub fn is_canonical(candidate: &str) -> bool {
        candidate.len() >= MIN_VIDEO_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Comment text exactly as returned by the comment API.
pub type RawComment = String;

/// Comments with no two entries sharing a normalized key, in first-seen order.
///
/// Only the deduplicator builds these, see [`crate::dedup::deduplicate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniqueCommentSet(Vec<RawComment>);

impl UniqueCommentSet {
    pub(crate) fn from_unique(comments: Vec<RawComment>) -> Self {
        Self(comments)
    }

    pub fn as_slice(&self) -> &[RawComment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawComment> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<RawComment> {
        self.0
    }

    /// Random subset of at most `size` comments, kept in their original order.
    pub fn sample(&self, size: usize, rng: &mut fastrand::Rng) -> UniqueCommentSet {
        if size >= self.0.len() {
            return self.clone();
        }

        // Partial Fisher-Yates over positions
        let mut positions: Vec<usize> = (0..self.0.len()).collect();
        for i in 0..size {
            let j = rng.usize(i..positions.len());
            positions.swap(i, j);
        }
        positions.truncate(size);
        positions.sort_unstable();

        Self(positions.into_iter().map(|i| self.0[i].clone()).collect())
    }
}

impl<'a> IntoIterator for &'a UniqueCommentSet {
    type Item = &'a RawComment;
    type IntoIter = std::slice::Iter<'a, RawComment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Three-way sentiment. Declaration order doubles as the majority tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels, highest tie-break priority first.
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Illustrative mood tag. Picked at random per label, never derived from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Joy,
    Excitement,
    Admiration,
    Anger,
    Sadness,
    Disgust,
    Calm,
    Indifferent,
    Curiosity,
}

impl Emotion {
    pub fn candidates(label: SentimentLabel) -> &'static [Emotion] {
        match label {
            SentimentLabel::Positive => &[Emotion::Joy, Emotion::Excitement, Emotion::Admiration],
            SentimentLabel::Negative => &[Emotion::Anger, Emotion::Sadness, Emotion::Disgust],
            SentimentLabel::Neutral => &[Emotion::Calm, Emotion::Indifferent, Emotion::Curiosity],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedComment {
    pub comment: RawComment,
    pub label: SentimentLabel,
    /// Model score for `label`, in `[0, 1]`.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
}

impl ClassifiedComment {
    pub fn new(comment: impl Into<RawComment>, label: SentimentLabel, confidence: f32) -> Self {
        Self {
            comment: comment.into(),
            label,
            confidence,
            emotion: None,
        }
    }

    pub fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = Some(emotion);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub counts: BTreeMap<SentimentLabel, usize>,
    pub total: usize,
    /// `None` only while no comment has been classified.
    pub majority: Option<SentimentLabel>,
    pub mean_confidence: BTreeMap<SentimentLabel, f32>,
}

impl AggregateSummary {
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Fraction of all records carrying `label`.
    pub fn share(&self, label: SentimentLabel) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(label) as f64 / self.total as f64
        }
    }
}
