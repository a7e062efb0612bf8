//! Sentiment classifier seam. No model ships with the crate; callers plug one in
//! and use these helpers to label cleaned rows and summarize the labels.

use crate::features::FeatureRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used for rows with no text to classify.
pub const NEUTRAL_LABEL: &str = "NEUTRAL";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn neutral() -> Self {
        Self { label: NEUTRAL_LABEL.to_string(), confidence: 0.0 }
    }
}

pub trait SentimentClassifier: Send + Sync {
    /// Longest input, in characters, the classifier accepts. Longer text is cut first.
    fn max_chars(&self) -> usize {
        512
    }
    fn classify(&self, text: &str) -> Result<Prediction>;
}

/// A row paired with its prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    #[serde(flatten)]
    pub row: FeatureRecord,
    pub sentiment: String,
    pub confidence: f64,
}

/// Classify `rows[..limit]` (all rows when `limit` is `None`) by their cleaned body,
/// falling back to the raw body when the table was not cleaned.
pub fn annotate_sentiment(
    rows: &[FeatureRecord],
    classifier: &dyn SentimentClassifier,
    limit: Option<usize>,
) -> Result<Vec<LabeledRow>> {
    let take = limit.unwrap_or(rows.len()).min(rows.len());
    let max_chars = classifier.max_chars();

    rows[..take]
        .iter()
        .map(|row| {
            let text = row.clean_body.as_deref().or(row.body.as_deref()).unwrap_or("").trim();
            let pred = if text.is_empty() {
                Prediction::neutral()
            } else {
                let clipped: String = text.chars().take(max_chars).collect();
                classifier
                    .classify(&clipped)
                    .with_context(|| format!("classifying comment {}", row.comment_id))?
            };
            Ok::<_, anyhow::Error>(LabeledRow { row: row.clone(), sentiment: pred.label, confidence: pred.confidence })
        })
        .collect()
}

/// Share of each label, in percent, keyed by label.
pub fn label_distribution(rows: &[LabeledRow]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for r in rows {
        *counts.entry(r.sentiment.clone()).or_insert(0) += 1;
    }
    let total = rows.len() as f64;
    counts.into_iter().map(|(label, n)| (label, n as f64 * 100.0 / total)).collect()
}
