//! Loading the two pipeline inputs: the thread dump and the comment table.

use crate::comments::CommentRecord;
use crate::paths::discover_table_parts;
use crate::progress::make_progress_bar_labeled;
use crate::zstd_jsonl::{for_each_line_with_progress, read_all_lines};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// All lines of the thread dump (plain or `.zst`), in order.
pub fn read_structure_lines(path: &Path, read_buf_bytes: usize) -> Result<Vec<String>> {
    let lines = read_all_lines(path, read_buf_bytes)
        .with_context(|| format!("reading thread dump {}", path.display()))?;
    tracing::debug!(lines = lines.len(), "read thread dump {}", path.display());
    Ok(lines)
}

#[derive(Clone, Debug, Default)]
pub struct TableLoadOptions {
    pub read_buffer_bytes: usize,
    pub progress: bool,
    pub progress_label: Option<String>,
    pub human_timestamps: bool,
}

/// Load every record of the comment table at `input` (a file or a directory of parts).
/// Parts load in parallel and are concatenated in file-name order. Blank lines are
/// skipped; any other unreadable line or missing required field fails the load.
pub fn load_comment_table(input: &Path, opts: &TableLoadOptions) -> Result<Vec<CommentRecord>> {
    let parts = discover_table_parts(input)?;
    let total_bytes: u64 = parts.iter().map(|p| fs::metadata(p).map(|m| m.len()).unwrap_or(0)).sum();
    let pb = if opts.progress {
        Some(make_progress_bar_labeled(total_bytes, opts.progress_label.as_deref()))
    } else {
        None
    };

    let loaded: Vec<Vec<CommentRecord>> = parts
        .par_iter()
        .map(|part| load_part(part, opts, |delta| if let Some(pb) = &pb { pb.inc(delta) }))
        .collect::<Result<_>>()?;

    if let Some(pb) = pb {
        pb.finish_with_message("comment table loaded");
    }

    let records: Vec<CommentRecord> = loaded.into_iter().flatten().collect();
    tracing::info!(records = records.len(), parts = parts.len(), "loaded comment table");
    Ok(records)
}

fn load_part(part: &PathBuf, opts: &TableLoadOptions, on_progress: impl FnMut(u64)) -> Result<Vec<CommentRecord>> {
    let mut out = Vec::new();
    for_each_line_with_progress(part, opts.read_buffer_bytes, on_progress, |line, line_no| {
        if line.trim().is_empty() {
            return Ok(());
        }
        let mut rec = CommentRecord::from_line(line, line_no)
            .with_context(|| format!("comment table {}", part.display()))?;
        if opts.human_timestamps {
            rec.humanize_timestamps();
        }
        out.push(rec);
        Ok(())
    })?;
    Ok(out)
}
