//! Inner join of the comment table with reconstructed structure on `comment_id`.
//!
//! Unmatched rows on either side are dropped; that loss is expected and only counted.
//! Ids are treated as keys on both sides: the first structure record per id is used,
//! and repeated comment rows after the first are dropped, so the result never has
//! more rows than the smaller input.

use crate::comments::CommentRecord;
use crate::error::MergeWarning;
use crate::structure::StructureRecord;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// One matched pair, before feature derivation.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedRow {
    pub comment: CommentRecord,
    pub structure: StructureRecord,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub comments_in: usize,
    pub structure_in: usize,
    pub matched: usize,
    /// Comment rows with no structure record.
    pub dropped_comments: usize,
    /// Structure records with no comment row.
    pub dropped_structure: usize,
    /// Comment rows skipped because their id was already joined or already seen.
    pub duplicate_comments: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MergeOutcome {
    pub rows: Vec<MergedRow>,
    pub stats: MergeStats,
    pub warnings: Vec<MergeWarning>,
}

/// Join in comment-table order.
pub fn merge(comments: Vec<CommentRecord>, structure: &[StructureRecord]) -> MergeOutcome {
    let mut index: AHashMap<&str, &StructureRecord> = AHashMap::with_capacity(structure.len());
    for s in structure {
        index.entry(s.comment_id.as_str()).or_insert(s);
    }

    let mut stats = MergeStats {
        comments_in: comments.len(),
        structure_in: structure.len(),
        ..Default::default()
    };

    let mut seen: AHashSet<String> = AHashSet::with_capacity(comments.len());
    let mut rows = Vec::with_capacity(comments.len().min(index.len()));
    for comment in comments {
        if !seen.insert(comment.comment_id.clone()) {
            stats.duplicate_comments += 1;
            continue;
        }
        match index.get(comment.comment_id.as_str()) {
            Some(s) => rows.push(MergedRow { structure: (*s).clone(), comment }),
            None => stats.dropped_comments += 1,
        }
    }

    stats.matched = rows.len();
    // Duplicate structure ids collapse onto one index entry; they count as dropped too.
    stats.dropped_structure = structure.len() - stats.matched;

    let mut warnings = Vec::new();
    if rows.is_empty() {
        warnings.push(MergeWarning::EmptyJoin);
        tracing::warn!(
            comments = stats.comments_in,
            structure = stats.structure_in,
            "join produced no rows; check that the dump and the comment table describe the same threads"
        );
    }
    tracing::info!(
        matched = stats.matched,
        dropped_comments = stats.dropped_comments,
        dropped_structure = stats.dropped_structure,
        duplicate_comments = stats.duplicate_comments,
        "merged comment table with thread structure"
    );

    MergeOutcome { rows, stats, warnings }
}
