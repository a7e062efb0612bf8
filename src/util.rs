use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install a fmt subscriber honoring `RUST_LOG` (default `info`). Later calls are no-ops,
/// as is the first call when the host already installed a subscriber.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Parse a boolean-ish environment variable (`1/0`, `true/false`, `yes/no`, `on/off`).
pub fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("{} has unrecognized value {:?}; ignoring", name, raw);
            None
        }
    }
}

// -------- file operations with retry/backoff --------

pub const BACKOFF_TRIES: usize = 16;
pub const BACKOFF_DELAY_MS: u64 = 50;

/// Transient errors worth retrying: sharing/lock violations and AV interference on
/// Windows, plus interrupted calls everywhere.
fn is_retriable_io_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::Interrupted {
        return true;
    }
    is_transient_os_error(e)
}

// 5 access denied, 21 not ready, 32 sharing violation, 33 lock violation,
// 1224 user-mapped section open
#[cfg(windows)]
fn is_transient_os_error(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 1224))
}

// Elsewhere these codes are EIO, EISDIR, EPIPE and EDOM, none of which clear on retry.
#[cfg(not(windows))]
fn is_transient_os_error(_e: &io::Error) -> bool {
    false
}

/// Run `op` until it succeeds, fails with a non-retriable error, or `tries` run out.
/// Waits grow linearly: `delay_ms`, `2 * delay_ms`, ...
fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul(i as u64 + 1)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

pub fn open_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(BACKOFF_TRIES, BACKOFF_DELAY_MS, || File::open(path))
}

pub fn create_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(BACKOFF_TRIES, BACKOFF_DELAY_MS, || File::create(path))
}

/// Move a finished temp file over `dest`. Falls back to copy + remove when the rename
/// is refused (e.g. across volumes or while another process holds `dest`).
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let renamed = with_backoff(20, BACKOFF_DELAY_MS, || fs::rename(tmp, dest));
    if let Err(e) = renamed {
        tracing::debug!(error = %e, "rename failed, copying {} -> {}", tmp.display(), dest.display());
        if let Err(copy_err) = with_backoff(20, BACKOFF_DELAY_MS, || fs::copy(tmp, dest)) {
            let _ = fs::remove_file(tmp);
            return Err(copy_err).with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()));
        }
        with_backoff(20, BACKOFF_DELAY_MS, || match fs::remove_file(tmp) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .with_context(|| format!("remove {}", tmp.display()))?;
    }
    Ok(())
}
