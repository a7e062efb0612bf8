//! Writing the final table to disk.

use crate::ndjson::NdjsonWriter;
use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output encodings for the feature table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON object per line.
    Jsonl,
    /// A single JSON array.
    JsonArray { pretty: bool },
    /// zstd-compressed JSONL.
    Zst,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(ExportFormat::Jsonl),
            "json" => Ok(ExportFormat::JsonArray { pretty: false }),
            "json-pretty" | "pretty" => Ok(ExportFormat::JsonArray { pretty: true }),
            "zst" | "jsonl.zst" => Ok(ExportFormat::Zst),
            other => Err(format!("unknown export format `{other}` (expected jsonl|json|json-pretty|zst)")),
        }
    }
}

fn staging_path(out: &Path) -> PathBuf {
    let mut name: OsString = out.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "export".into());
    name.push(".inprogress");
    out.with_file_name(name)
}

/// Write `rows` to `out` in `format`, replacing any existing file atomically.
/// Returns the number of rows written.
pub fn export_rows<T: Serialize>(rows: &[T], out: &Path, format: ExportFormat, write_buf: usize) -> Result<u64> {
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = staging_path(out);

    let written = match format {
        ExportFormat::Jsonl | ExportFormat::Zst => {
            let mut w = NdjsonWriter::create(&tmp, write_buf, format == ExportFormat::Zst)?;
            for row in rows {
                w.write_record(row)?;
            }
            w.finish_atomic(out)?
        }
        ExportFormat::JsonArray { pretty } => {
            let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
            let mut w = BufWriter::with_capacity(write_buf.max(8 * 1024), f);
            w.write_all(if pretty { b"[\n" } else { b"[" })?;
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    w.write_all(if pretty { b",\n" } else { b"," })?;
                }
                if pretty {
                    serde_json::to_writer_pretty(&mut w, row)?;
                } else {
                    serde_json::to_writer(&mut w, row)?;
                }
            }
            w.write_all(if pretty { b"\n]" } else { b"]" })?;
            w.flush()?;
            drop(w);
            replace_file_atomic_backoff(&tmp, out)?;
            rows.len() as u64
        }
    };

    tracing::info!(rows = written, format = ?format, "exported table to {}", out.display());
    Ok(written)
}
