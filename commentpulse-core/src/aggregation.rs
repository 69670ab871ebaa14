use crate::types::{AggregateSummary, ClassifiedComment, SentimentLabel};
use std::collections::BTreeMap;

/// Every classified comment of one analysis session.
///
/// Records are kept for the life of the store. Callers deduplicate before
/// appending.
#[derive(Debug, Clone, Default)]
pub struct AggregationStore {
    records: Vec<ClassifiedComment>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ClassifiedComment) {
        self.records.push(record);
    }

    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ClassifiedComment>,
    {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ClassifiedComment] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_label(&self, label: SentimentLabel) -> impl Iterator<Item = &ClassifiedComment> {
        self.records.iter().filter(move |r| r.label == label)
    }

    /// Recomputes the summary from all held records.
    ///
    /// Majority ties go to the label listed first in [`SentimentLabel::ALL`].
    pub fn summarize(&self) -> AggregateSummary {
        let mut counts: BTreeMap<SentimentLabel, usize> =
            SentimentLabel::ALL.iter().map(|label| (*label, 0)).collect();
        let mut confidence_sums: BTreeMap<SentimentLabel, f64> = BTreeMap::new();

        for record in &self.records {
            *counts.entry(record.label).or_default() += 1;
            *confidence_sums.entry(record.label).or_default() += f64::from(record.confidence);
        }

        let mut majority = None;
        let mut best = 0;
        for label in SentimentLabel::ALL {
            let count = counts[&label];
            if count > best {
                best = count;
                majority = Some(label);
            }
        }

        let mean_confidence = confidence_sums
            .into_iter()
            .map(|(label, sum)| (label, (sum / counts[&label] as f64) as f32))
            .collect();

        AggregateSummary {
            counts,
            total: self.records.len(),
            majority,
            mean_confidence,
        }
    }
}
