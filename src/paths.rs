use anyhow::{bail, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

fn part_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(jsonl|ndjson)(\.zst)?$").unwrap())
}

/// Whether `name` looks like a comment table part (`*.jsonl`, `*.ndjson`, optionally `.zst`).
pub fn is_table_part(name: &str) -> bool {
    part_name_re().is_match(name)
}

/// Resolve the comment table input to its part files.
/// A file is used as-is; a directory contributes its direct children that look like
/// table parts, sorted by file name so loads are deterministic.
pub fn discover_table_parts(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("comment table not found: {}", input.display());
    }

    let mut parts = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
        let ent = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry under {}", input.display());
                continue;
            }
        };
        if !ent.file_type().is_file() {
            continue;
        }
        if ent.file_name().to_str().map_or(false, is_table_part) {
            parts.push(ent.path().to_path_buf());
        }
    }
    if parts.is_empty() {
        tracing::warn!("no *.jsonl / *.ndjson parts found in {}", input.display());
    } else {
        tracing::info!("Found {} comment table parts in {}", parts.len(), input.display());
    }
    Ok(parts)
}
