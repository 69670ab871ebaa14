use commentpulse_core::{Emotion, SentimentLabel};

/// Attaches a decorative emotion to a sentiment label.
///
/// The pick is random within the label's candidate set and carries no
/// information about the comment text.
#[derive(Debug, Clone)]
pub struct EmotionTagger {
    rng: fastrand::Rng,
}

impl EmotionTagger {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic picks, for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn pick(&mut self, label: SentimentLabel) -> Emotion {
        let candidates = Emotion::candidates(label);
        candidates[self.rng.usize(..candidates.len())]
    }
}

impl Default for EmotionTagger {
    fn default() -> Self {
        Self::new()
    }
}
