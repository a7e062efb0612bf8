//! Line streaming over plain or zstd-compressed text files.
//! Files ending in `.zst` are decoded on the fly; everything else is read as UTF-8.

use anyhow::{Context, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::util::open_with_backoff;

pub fn is_zst(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("zst"))
}

/// A `Read` wrapper that counts bytes pulled from the file (compressed bytes for `.zst`).
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}
impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

fn open_reader(path: &Path, read_buf_bytes: usize, counter: Arc<AtomicU64>) -> Result<Box<dyn BufRead>> {
    let file = open_with_backoff(path).with_context(|| format!("open {}", path.display()))?;
    let cnt = CountingReader { inner: file, counter };
    let cap = read_buf_bytes.max(8 * 1024);
    if is_zst(path) {
        let mut decoder = Decoder::new(cnt).with_context(|| format!("zstd header {}", path.display()))?;
        // Large-window frames need the higher limit.
        decoder.window_log_max(31)?;
        Ok(Box::new(BufReader::with_capacity(cap, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(cap, cnt)))
    }
}

/// Call `on_line(line, line_no)` for each line (1-based, `\r?\n` stripped) and
/// `on_progress(delta)` with the file bytes consumed since the previous call.
pub fn for_each_line_with_progress(
    path: &Path,
    read_buf_bytes: usize,
    mut on_progress: impl FnMut(u64),
    mut on_line: impl FnMut(&str, usize) -> Result<()>,
) -> Result<()> {
    let counter = Arc::new(AtomicU64::new(0));
    let mut reader = open_reader(path, read_buf_bytes, counter.clone())?;

    let mut buf = String::with_capacity(16 * 1024);
    let mut line_no = 0usize;
    let mut last = 0u64;
    loop {
        buf.clear();
        let n = reader
            .read_line(&mut buf)
            .with_context(|| format!("read {} after line {}", path.display(), line_no))?;
        let cur = counter.load(Ordering::Relaxed);
        if cur > last {
            on_progress(cur - last);
            last = cur;
        }
        if n == 0 {
            break;
        }
        line_no += 1;
        if buf.ends_with('\n') {
            let _ = buf.pop();
            if buf.ends_with('\r') { let _ = buf.pop(); }
        }
        on_line(&buf, line_no)?;
    }
    Ok(())
}

pub fn for_each_line(
    path: &Path,
    read_buf_bytes: usize,
    on_line: impl FnMut(&str, usize) -> Result<()>,
) -> Result<()> {
    for_each_line_with_progress(path, read_buf_bytes, |_| {}, on_line)
}

/// Read every line of a plain or `.zst` text file.
pub fn read_all_lines(path: &Path, read_buf_bytes: usize) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for_each_line(path, read_buf_bytes, |line, _| {
        lines.push(line.to_string());
        Ok(())
    })?;
    Ok(lines)
}
