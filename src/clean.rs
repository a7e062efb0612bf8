//! Body text normalization ahead of classification.

use crate::features::FeatureRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub trait TextCleaner: Send + Sync {
    /// Normalize raw body text. A missing body cleans to the empty string.
    fn clean(&self, raw: Option<&str>) -> String;
}

/// Rules for Reddit comment bodies:
/// lowercase, drop `[deleted]`/`[removed]` markers and URLs, keep `[a-z0-9]`,
/// whitespace, `!` and `?`, then collapse runs of whitespace.
pub struct RedditCleaner {
    markers: Regex,
    urls: Regex,
    disallowed: Regex,
    spaces: Regex,
}

impl RedditCleaner {
    pub fn new() -> Self {
        Self {
            markers: Regex::new(r"\[deleted\]|\[removed\]").unwrap(),
            urls: Regex::new(r"http\S+|www\S+").unwrap(),
            disallowed: Regex::new(r"[^a-z0-9\s!?]").unwrap(),
            spaces: Regex::new(r"\s+").unwrap(),
        }
    }
}

impl Default for RedditCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCleaner for RedditCleaner {
    fn clean(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else { return String::new() };
        let text = raw.to_lowercase();
        let text = self.markers.replace_all(&text, "");
        let text = self.urls.replace_all(&text, "");
        let text = self.disallowed.replace_all(&text, "");
        let text = self.spaces.replace_all(&text, " ");
        text.trim().to_string()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub kept: usize,
    /// Rows whose body cleaned down to nothing.
    pub dropped: usize,
}

/// Fill `clean_body` on every row and drop rows left with empty text.
pub fn clean_table(rows: Vec<FeatureRecord>, cleaner: &dyn TextCleaner) -> (Vec<FeatureRecord>, CleanStats) {
    let before = rows.len();
    let kept: Vec<FeatureRecord> = rows
        .into_iter()
        .filter_map(|mut row| {
            let cleaned = cleaner.clean(row.body.as_deref());
            if cleaned.is_empty() {
                return None;
            }
            row.clean_body = Some(cleaned);
            Some(row)
        })
        .collect();

    let stats = CleanStats { kept: kept.len(), dropped: before - kept.len() };
    tracing::info!(kept = stats.kept, dropped = stats.dropped, "cleaned comment bodies");
    (kept, stats)
}
