use crate::tokenizer::TokenMode;
use crate::util::env_flag;
use std::path::{Path, PathBuf};

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub structure_path: PathBuf,      // indented thread dump (.txt or .zst)
    pub comments_path: PathBuf,       // NDJSON file or directory of parts
    pub token_mode: TokenMode,
    pub strict: bool,                 // fail on comments outside any post
    pub parallel: bool,               // scan post blocks on the rayon pool
    pub parallelism: Option<usize>,   // Some(N) for a dedicated N-thread pool
    pub clean_text: bool,             // add clean_body and drop rows that clean to ""
    pub progress: bool,
    pub progress_label: Option<String>,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,

    // passthrough created_utc / retrieved_on / edited as RFC3339
    pub human_readable_timestamps: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let raw = PathBuf::from("data/raw");
        Self {
            structure_path: raw.join("thread_structure.txt"),
            comments_path: raw.join("comments.jsonl"),
            token_mode: TokenMode::Anchored,
            strict: false,
            parallel: false,
            parallelism: None,
            clean_text: false,
            progress: false,
            progress_label: None,

            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,

            human_readable_timestamps: false,
        }
    }
}

impl PipelineOptions {
    pub fn with_structure_path(mut self, p: impl AsRef<Path>) -> Self {
        self.structure_path = p.as_ref().to_path_buf();
        self
    }
    pub fn with_comments_path(mut self, p: impl AsRef<Path>) -> Self {
        self.comments_path = p.as_ref().to_path_buf();
        self
    }
    pub fn with_token_mode(mut self, mode: TokenMode) -> Self {
        self.token_mode = mode;
        self
    }
    pub fn with_strict(mut self, yes: bool) -> Self {
        self.strict = yes;
        self
    }
    pub fn with_parallel(mut self, yes: bool) -> Self {
        self.parallel = yes;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self.parallel = true;
        self
    }
    pub fn with_clean_text(mut self, yes: bool) -> Self {
        self.clean_text = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_io_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_human_timestamps(mut self, yes: bool) -> Self {
        self.human_readable_timestamps = yes;
        self
    }

    /// Apply overrides from the environment:
    /// - ECHOETL_STRICT, ECHOETL_PARALLEL: boolean flags
    /// - ECHOETL_TOKEN_MODE: `anchored` or `first-match`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_flag("ECHOETL_STRICT") {
            self.strict = v;
        }
        if let Some(v) = env_flag("ECHOETL_PARALLEL") {
            self.parallel = v;
        }
        if let Ok(raw) = std::env::var("ECHOETL_TOKEN_MODE") {
            match raw.parse::<TokenMode>() {
                Ok(mode) => self.token_mode = mode,
                Err(e) => tracing::warn!("ECHOETL_TOKEN_MODE ignored: {}", e),
            }
        }
        self
    }
}
