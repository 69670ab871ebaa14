use commentpulse_core::{
    deduplicate, parse_video_identifier, AggregateSummary, AggregationStore, ClassifiedComment,
    CoreError, UniqueCommentSet, VideoId,
};
use sentiment_engine::{SentimentClassifier, SentimentModel};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;
use youtube_client::{ApiUsage, CommentSource};

/// Result of analysing one video once.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session_id: Uuid,
    pub video_id: VideoId,
    /// Raw comments returned by the source, duplicates included.
    pub fetched: usize,
    pub unique: usize,
    /// One record per classified comment; fewer than `unique` when sampling.
    pub records: Vec<ClassifiedComment>,
    pub summary: AggregateSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_usage: Option<ApiUsage>,
}

/// One-shot pipeline: identifier to aggregate summary.
pub struct AnalysisSession<S, M> {
    source: S,
    classifier: SentimentClassifier<M>,
    max_comments: usize,
    page_size: u32,
    sample_size: Option<usize>,
    rng: Mutex<fastrand::Rng>,
}

impl<S: CommentSource, M: SentimentModel> AnalysisSession<S, M> {
    pub fn new(
        source: S,
        classifier: SentimentClassifier<M>,
        max_comments: usize,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            classifier,
            max_comments,
            page_size,
            sample_size: None,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Classify a random subset of at most `sample_size` unique comments.
    pub fn with_sample_size(mut self, sample_size: Option<usize>) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(fastrand::Rng::with_seed(seed));
        self
    }

    pub async fn analyze(&self, input: &str) -> Result<AnalysisReport, CoreError> {
        let session_id = Uuid::new_v4();
        let video_id = parse_video_identifier(input)?;
        info!("Session {} analysing video {}", session_id, video_id);

        let raw = self
            .source
            .fetch_comments(&video_id, self.max_comments, self.page_size)
            .await?;
        let fetched = raw.len();

        let unique = deduplicate(raw, Some(self.max_comments));
        let records = match self.sample_size {
            Some(size) if size < unique.len() => {
                let sampled = self.sample(&unique, size);
                info!("Sampled {} of {} unique comments", sampled.len(), unique.len());
                self.classifier.classify_set(&sampled).await?
            }
            _ => self.classifier.classify_set(&unique).await?,
        };

        let mut store = AggregationStore::new();
        store.extend(records.iter().cloned());
        let summary = store.summarize();

        info!(
            "Session {}: {} fetched, {} unique, {} classified, majority {:?}",
            session_id,
            fetched,
            unique.len(),
            records.len(),
            summary.majority
        );

        let api_usage = self.source.usage().await;
        if let Some(usage) = &api_usage {
            info!(
                "Session {} spent {} quota units over {} requests ({} retries)",
                session_id, usage.quota_units_used, usage.requests, usage.retries
            );
        }

        Ok(AnalysisReport {
            session_id,
            video_id,
            fetched,
            unique: unique.len(),
            records,
            summary,
            api_usage,
        })
    }

    fn sample(&self, unique: &UniqueCommentSet, size: usize) -> UniqueCommentSet {
        match self.rng.lock() {
            Ok(mut rng) => unique.sample(size, &mut rng),
            Err(poisoned) => {
                warn!("Sampling RNG lock poisoned, continuing with its last state");
                unique.sample(size, &mut poisoned.into_inner())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentpulse_core::{ClassificationError, SentimentLabel, YouTubeApiError};
    use sentiment_engine::{LabelScheme, ModelPrediction};
    use youtube_client::CommentPage;

    struct FixedComments(Vec<&'static str>);

    impl CommentSource for FixedComments {
        async fn fetch_page(
            &self,
            _video_id: &VideoId,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<CommentPage, CoreError> {
            Ok(CommentPage {
                comments: self.0.iter().map(|c| c.to_string()).collect(),
                next_page_token: None,
            })
        }
    }

    struct UnavailableSource;

    impl CommentSource for UnavailableSource {
        async fn fetch_page(
            &self,
            video_id: &VideoId,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<CommentPage, CoreError> {
            Err(YouTubeApiError::CommentsDisabled {
                video_id: video_id.to_string(),
            }
            .into())
        }
    }

    struct KeywordModel;

    impl SentimentModel for KeywordModel {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn predict_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<ModelPrediction>, CoreError> {
            Ok(texts
                .iter()
                .map(|t| match t.to_lowercase() {
                    t if t.contains("great") => ModelPrediction::new("positive", 0.9),
                    t if t.contains("bad") => ModelPrediction::new("negative", 0.7),
                    _ => ModelPrediction::new("neutral", 0.5),
                })
                .collect())
        }
    }

    struct BrokenModel;

    impl SentimentModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn predict_batch(
            &self,
            _texts: &[String],
        ) -> Result<Vec<ModelPrediction>, CoreError> {
            Err(ClassificationError::InferenceFailed {
                reason: "boom".to_string(),
            }
            .into())
        }
    }

    fn session<S: CommentSource, M: SentimentModel>(source: S, model: M) -> AnalysisSession<S, M> {
        AnalysisSession::new(
            source,
            SentimentClassifier::new(model, LabelScheme::ThreeWay),
            100,
            100,
        )
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let session = session(
            FixedComments(vec!["Great!", "great!! ", "bad video", "meh", "BAD VIDEO"]),
            KeywordModel,
        );

        let report = session
            .analyze("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42")
            .await
            .unwrap();

        assert_eq!(report.video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(report.fetched, 5);
        assert_eq!(report.unique, 3);
        let comments: Vec<&str> = report.records.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, vec!["Great!", "bad video", "meh"]);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.majority, Some(SentimentLabel::Positive));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["records"].as_array().map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_analyze_without_comments() {
        let session = session(FixedComments(Vec::new()), KeywordModel);
        let report = session.analyze("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.majority, None);
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_rejected_before_fetching() {
        let session = session(UnavailableSource, KeywordModel);
        let result = session.analyze("not a video").await;
        assert!(matches!(result, Err(CoreError::InvalidIdentifier { .. })));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let session = session(UnavailableSource, KeywordModel);
        let result = session.analyze("youtu.be/dQw4w9WgXcQ").await;
        match result {
            Err(CoreError::FetchFailed { video_id, .. }) => assert_eq!(video_id, "dQw4w9WgXcQ"),
            other => panic!("Expected FetchFailed, got {:?}", other),
        }
    }

    struct MeteredSource;

    impl CommentSource for MeteredSource {
        async fn fetch_page(
            &self,
            _video_id: &VideoId,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<CommentPage, CoreError> {
            Ok(CommentPage {
                comments: vec!["great".to_string()],
                next_page_token: None,
            })
        }

        async fn usage(&self) -> Option<ApiUsage> {
            Some(ApiUsage {
                requests: 1,
                quota_units_used: 1,
                ..ApiUsage::default()
            })
        }
    }

    #[tokio::test]
    async fn test_sample_size_caps_classified_comments() {
        let comments = vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let session = session(FixedComments(comments.clone()), KeywordModel)
            .with_sample_size(Some(4))
            .with_seed(7);

        let report = session.analyze("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(report.unique, 10);
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.summary.total, 4);
        for record in &report.records {
            assert!(comments.contains(&record.comment.as_str()));
        }
        let mut distinct: Vec<&str> = report.records.iter().map(|r| r.comment.as_str()).collect();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
    }

    #[tokio::test]
    async fn test_sample_size_above_unique_count_classifies_all() {
        let session = session(FixedComments(vec!["great", "bad", "great"]), KeywordModel)
            .with_sample_size(Some(50));
        let report = session.analyze("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(report.unique, 2);
        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test]
    async fn test_report_carries_source_usage() {
        let report = session(MeteredSource, KeywordModel)
            .analyze("dQw4w9WgXcQ")
            .await
            .unwrap();
        let usage = report.api_usage.as_ref().unwrap();
        assert_eq!(usage.quota_units_used, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["api_usage"]["requests"], 1);

        let plain = session(FixedComments(vec!["great"]), KeywordModel)
            .analyze("dQw4w9WgXcQ")
            .await
            .unwrap();
        assert!(plain.api_usage.is_none());
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("api_usage").is_none());
    }

    #[tokio::test]
    async fn test_classification_failure_propagates() {
        let session = session(FixedComments(vec!["great"]), BrokenModel);
        let result = session.analyze("dQw4w9WgXcQ").await;
        assert!(matches!(result, Err(CoreError::Classification(_))));
    }
}
