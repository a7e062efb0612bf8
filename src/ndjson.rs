use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zstd::stream::write::Encoder as ZstdEncoder;

const ZSTD_LEVEL: i32 = 19;

enum Sink {
    Plain(BufWriter<File>),
    Zst(ZstdEncoder<'static, BufWriter<File>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::Plain(w) => w,
            Sink::Zst(enc) => enc,
        }
    }
}

/// NDJSON writer that stages output in a temp file and promotes it on `finish_atomic`,
/// so readers never observe a half-written table. Optionally zstd-compressed.
pub struct NdjsonWriter {
    tmp_path: PathBuf,
    sink: Sink,
    written: u64,
}

impl NdjsonWriter {
    pub fn create(tmp_path: &Path, buf_bytes: usize, compress: bool) -> Result<Self> {
        let f = create_with_backoff(tmp_path).with_context(|| format!("create {}", tmp_path.display()))?;
        let w = BufWriter::with_capacity(buf_bytes.max(8 * 1024), f);
        let sink = if compress { Sink::Zst(ZstdEncoder::new(w, ZSTD_LEVEL)?) } else { Sink::Plain(w) };
        Ok(Self { tmp_path: tmp_path.to_path_buf(), sink, written: 0 })
    }

    pub fn write_record<T: Serialize>(&mut self, rec: &T) -> Result<()> {
        let w = self.sink.writer();
        serde_json::to_writer(&mut *w, rec)?;
        w.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flush, close, and move the temp file to `final_path`. Returns the record count.
    pub fn finish_atomic(self, final_path: &Path) -> Result<u64> {
        let mut inner = match self.sink {
            Sink::Plain(w) => w,
            Sink::Zst(enc) => enc.finish().with_context(|| format!("finish zstd {}", self.tmp_path.display()))?,
        };
        inner.flush().with_context(|| format!("flush {}", self.tmp_path.display()))?;
        drop(inner);
        replace_file_atomic_backoff(&self.tmp_path, final_path)?;
        Ok(self.written)
    }
}
