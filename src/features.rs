//! Row-local derived features over merged rows.

use crate::merge::MergedRow;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text a missing body is measured as. Kept for parity with the tabular exports this
/// table is compared against, where a missing body stringifies to `nan`.
pub const MISSING_BODY_TEXT: &str = "nan";

/// Output columns owned by the feature table. Passthrough fields with these names are dropped.
pub const OUTPUT_COLUMNS: [&str; 12] = [
    "comment_id", "parent_id", "post_id", "depth", "body", "score",
    "char_count", "word_count", "avg_word_len", "is_root", "target_binary", "clean_body",
];

/// One output row. Passthrough columns from the comment table are flattened in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub comment_id: String,
    pub parent_id: Option<String>,
    pub post_id: Option<String>,
    pub depth: usize,
    pub body: Option<String>,
    pub score: Option<f64>,
    pub char_count: usize,
    pub word_count: usize,
    pub avg_word_len: f64,
    pub is_root: bool,
    pub target_binary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_body: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextFeatures {
    pub char_count: usize,
    pub word_count: usize,
    pub avg_word_len: f64,
}

pub fn text_features(body: Option<&str>) -> TextFeatures {
    let text = body.unwrap_or(MISSING_BODY_TEXT);
    let char_count = text.chars().count();
    let word_count = text.split_whitespace().count();
    TextFeatures {
        char_count,
        word_count,
        // +1 keeps empty bodies finite.
        avg_word_len: char_count as f64 / (word_count + 1) as f64,
    }
}

pub fn is_root(parent_id: Option<&str>, post_id: Option<&str>) -> bool {
    matches!((parent_id, post_id), (Some(parent), Some(post)) if parent == post)
}

pub fn target_binary(score: Option<f64>) -> bool {
    score.map_or(false, |s| s > 0.0)
}

pub fn derive_row(row: MergedRow) -> FeatureRecord {
    let MergedRow { comment, structure } = row;
    let text = text_features(comment.body.as_deref());
    let mut extra = comment.extra;
    for col in OUTPUT_COLUMNS {
        extra.remove(col);
    }
    FeatureRecord {
        is_root: is_root(structure.parent_id.as_deref(), structure.post_id.as_deref()),
        target_binary: target_binary(comment.score),
        comment_id: comment.comment_id,
        parent_id: structure.parent_id,
        post_id: structure.post_id,
        depth: structure.depth,
        body: comment.body,
        score: comment.score,
        char_count: text.char_count,
        word_count: text.word_count,
        avg_word_len: text.avg_word_len,
        clean_body: None,
        extra,
    }
}

/// Featurize every row. Rows are independent; output order matches input order.
pub fn derive_features(rows: Vec<MergedRow>) -> Vec<FeatureRecord> {
    rows.into_par_iter().map(derive_row).collect()
}
