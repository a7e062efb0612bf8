//! Reply-tree reconstruction from an indented thread dump.
//!
//! A dump is a sequence of post blocks. Each block opens with a sentinel line
//! (`For Post ID: <id>`) followed by one line per comment, where the column of the
//! comment id encodes its nesting:
//!
//! ```text
//! For Post ID: 8xq2kd
//! abc1234 top-level reply
//!     def5678 reply to the post
//!         ghi9012 reply to def5678
//! ```
//!
//! State never crosses a sentinel, so post blocks are independent and can be scanned
//! in parallel (`reconstruct_parallel`). Inside a block the scan is strictly sequential.

use crate::ancestry::AncestorStack;
use crate::error::EtlError;
use crate::tokenizer::{sentinel_post_id, LineKind, TokenMode, Tokenizer};
use ahash::AHashSet;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Characters of indentation per nesting level.
pub const INDENT_UNIT: usize = 4;

/// Structural metadata for one comment, as recovered from the dump.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub comment_id: String,
    pub parent_id: Option<String>,
    pub post_id: Option<String>,
    pub depth: usize,
    /// Character column of the id on its line.
    pub level: usize,
    /// 1-based line number in the dump.
    pub line_no: usize,
}

impl StructureRecord {
    /// True when the comment was found outside of any post block.
    pub fn is_orphan(&self) -> bool {
        self.post_id.is_none()
    }
}

/// A comment that could not be attached to a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedComment {
    pub line_no: usize,
    pub comment_id: String,
}

impl MalformedComment {
    pub fn to_error(&self) -> EtlError {
        EtlError::MalformedInput { line_no: self.line_no, comment_id: self.comment_id.clone() }
    }
}

/// Data-quality counters for one reconstruction run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub lines: usize,
    pub posts: usize,
    pub records: usize,
    pub skipped: usize,
    /// Comment lines whose column is not a multiple of `INDENT_UNIT`.
    pub misaligned: usize,
    pub malformed: Vec<MalformedComment>,
    /// Ids emitted more than once (each repeat listed once per extra occurrence).
    pub duplicate_ids: Vec<String>,
}

impl ScanReport {
    /// No malformed comments and no duplicate ids.
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.duplicate_ids.is_empty()
    }

    fn absorb(&mut self, other: ScanReport) {
        self.lines += other.lines;
        self.posts += other.posts;
        self.records += other.records;
        self.skipped += other.skipped;
        self.misaligned += other.misaligned;
        self.malformed.extend(other.malformed);
        self.duplicate_ids.extend(other.duplicate_ids);
    }
}

#[derive(Clone, Debug, Default)]
pub struct Reconstruction {
    pub records: Vec<StructureRecord>,
    pub report: ScanReport,
}

#[derive(Clone, Default)]
pub struct TreeReconstructor {
    tokenizer: Tokenizer,
    strict: bool,
    progress: Option<ProgressBar>,
}

impl TreeReconstructor {
    pub fn new(mode: TokenMode) -> Self {
        Self { tokenizer: Tokenizer::new(mode), strict: false, progress: None }
    }

    /// In strict mode the first comment without a post aborts the scan with
    /// `EtlError::MalformedInput`. Otherwise it is kept with a null parent and listed
    /// in `ScanReport::malformed`.
    pub fn strict(mut self, yes: bool) -> Self {
        self.strict = yes;
        self
    }

    /// Tick `pb` once per scanned line.
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    /// Scan all lines in order.
    pub fn reconstruct<S: AsRef<str>>(&self, lines: &[S]) -> Result<Reconstruction, EtlError> {
        let (records, report) = self.scan_block(lines, 0)?;
        Ok(finish(records, report))
    }

    /// Scan each post block on the rayon pool and concatenate in dump order.
    /// Output is identical to `reconstruct`.
    pub fn reconstruct_parallel<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<Reconstruction, EtlError> {
        let blocks = post_blocks(lines);
        tracing::debug!(blocks = blocks.len(), "scanning post blocks in parallel");

        let scanned: Vec<Result<(Vec<StructureRecord>, ScanReport), EtlError>> = blocks
            .par_iter()
            .map(|&(start, end)| self.scan_block(&lines[start..end], start))
            .collect();

        let mut records = Vec::new();
        let mut report = ScanReport::default();
        for block in scanned {
            // First error in dump order, as the sequential scan would report.
            let (recs, rep) = block?;
            records.extend(recs);
            report.absorb(rep);
        }
        Ok(finish(records, report))
    }

    fn scan_block<S: AsRef<str>>(
        &self,
        lines: &[S],
        offset: usize,
    ) -> Result<(Vec<StructureRecord>, ScanReport), EtlError> {
        let mut stack = AncestorStack::new();
        let mut current_post: Option<String> = None;
        let mut records = Vec::new();
        let mut report = ScanReport::default();

        for (i, raw) in lines.iter().enumerate() {
            let line_no = offset + i + 1;
            report.lines += 1;
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }

            match self.tokenizer.classify(raw.as_ref()) {
                LineKind::Sentinel { post_id } if post_id.is_empty() => {
                    tracing::warn!(line_no, "post sentinel without an id; following comments stay unrooted");
                    current_post = None;
                    stack.clear();
                }
                LineKind::Sentinel { post_id } => {
                    report.posts += 1;
                    current_post = Some(post_id.to_string());
                    stack.reset(post_id);
                }
                LineKind::Comment(tok) => {
                    let parent_id = stack.resolve(tok.column).map(str::to_string);
                    if tok.column % INDENT_UNIT != 0 {
                        report.misaligned += 1;
                        tracing::debug!(line_no, column = tok.column, comment_id = tok.id, "indentation is not a multiple of {INDENT_UNIT}");
                    }
                    if current_post.is_none() {
                        let bad = MalformedComment { line_no, comment_id: tok.id.to_string() };
                        if self.strict {
                            return Err(bad.to_error());
                        }
                        tracing::warn!(line_no, comment_id = tok.id, "comment appears before any post sentinel");
                        report.malformed.push(bad);
                    }
                    records.push(StructureRecord {
                        comment_id: tok.id.to_string(),
                        parent_id,
                        post_id: current_post.clone(),
                        depth: tok.column / INDENT_UNIT,
                        level: tok.column,
                        line_no,
                    });
                    stack.push(tok.column, tok.id);
                }
                LineKind::Skip => report.skipped += 1,
            }
        }

        report.records = records.len();
        Ok((records, report))
    }
}

/// Half-open line ranges, each starting at a sentinel (plus a leading range for any
/// lines before the first sentinel).
fn post_blocks<S: AsRef<str>>(lines: &[S]) -> Vec<(usize, usize)> {
    let mut starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| sentinel_post_id(l.as_ref()).is_some())
        .map(|(i, _)| i)
        .collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        if start < end {
            blocks.push((start, end));
        }
    }
    blocks
}

fn finish(records: Vec<StructureRecord>, mut report: ScanReport) -> Reconstruction {
    let mut seen: AHashSet<&str> = AHashSet::with_capacity(records.len());
    for r in &records {
        if !seen.insert(r.comment_id.as_str()) {
            report.duplicate_ids.push(r.comment_id.clone());
        }
    }
    if !report.duplicate_ids.is_empty() {
        tracing::warn!(count = report.duplicate_ids.len(), "comment ids repeated in thread dump");
    }
    tracing::info!(
        lines = report.lines,
        posts = report.posts,
        records = report.records,
        skipped = report.skipped,
        malformed = report.malformed.len(),
        "thread structure reconstructed"
    );
    Reconstruction { records, report }
}
