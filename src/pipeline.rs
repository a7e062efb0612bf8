use crate::classify::{annotate_sentiment, LabeledRow, SentimentClassifier};
use crate::clean::{clean_table, CleanStats, RedditCleaner, TextCleaner};
use crate::comments::CommentRecord;
use crate::config::PipelineOptions;
use crate::error::MergeWarning;
use crate::export::{export_rows, ExportFormat};
use crate::features::{derive_features, FeatureRecord};
use crate::load::{load_comment_table, read_structure_lines, TableLoadOptions};
use crate::merge::{merge, MergeStats};
use crate::progress::make_count_progress;
use crate::structure::{Reconstruction, ScanReport, TreeReconstructor};
use crate::tokenizer::TokenMode;
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Builder-style entry point: dump + comment table in, feature table out.
#[derive(Clone)]
pub struct ThreadETL {
    pub(crate) opts: PipelineOptions,
    cleaner: Option<Arc<dyn TextCleaner>>,
}

/// Everything a run produced, including the data-quality side channel.
#[derive(Clone, Debug, Default)]
pub struct PipelineOutput {
    pub rows: Vec<FeatureRecord>,
    pub scan: ScanReport,
    pub merge: MergeStats,
    pub warnings: Vec<MergeWarning>,
    pub clean: Option<CleanStats>,
}

impl PipelineOutput {
    pub fn is_empty_join(&self) -> bool {
        self.warnings.contains(&MergeWarning::EmptyJoin)
    }
}

impl Default for ThreadETL {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadETL {
    pub fn new() -> Self {
        Self { opts: PipelineOptions::default(), cleaner: None }
    }

    pub fn from_options(opts: PipelineOptions) -> Self {
        Self { opts, cleaner: None }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn structure_path(mut self, p: impl AsRef<Path>) -> Self { self.opts = self.opts.with_structure_path(p); self }
    pub fn comments_path(mut self, p: impl AsRef<Path>) -> Self { self.opts = self.opts.with_comments_path(p); self }
    pub fn token_mode(mut self, mode: TokenMode) -> Self { self.opts = self.opts.with_token_mode(mode); self }
    pub fn strict(mut self, yes: bool) -> Self { self.opts = self.opts.with_strict(yes); self }
    pub fn parallel(mut self, yes: bool) -> Self { self.opts = self.opts.with_parallel(yes); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn clean_text(mut self, yes: bool) -> Self { self.opts = self.opts.with_clean_text(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn io_write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_write_buffer(bytes); self }
    pub fn timestamps_human_readable(mut self, yes: bool) -> Self { self.opts = self.opts.with_human_timestamps(yes); self }
    pub fn env_overrides(mut self) -> Self { self.opts = self.opts.with_env_overrides(); self }

    /// Use `cleaner` instead of the default Reddit rules. Implies `clean_text(true)`.
    pub fn cleaner(mut self, cleaner: impl TextCleaner + 'static) -> Self {
        self.cleaner = Some(Arc::new(cleaner));
        self.opts.clean_text = true;
        self
    }

    // -------- Stages --------

    /// Rebuild the reply structure from in-memory dump lines.
    pub fn reconstruct_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<Reconstruction> {
        init_tracing_once();
        let mut rec = TreeReconstructor::new(self.opts.token_mode).strict(self.opts.strict);
        let pb = if self.opts.progress {
            let label = self.opts.progress_label.as_deref().unwrap_or("Scanning thread dump");
            Some(make_count_progress(lines.len() as u64, label))
        } else {
            None
        };
        if let Some(pb) = &pb {
            rec = rec.with_progress(pb.clone());
        }

        let out = if self.opts.parallel {
            self.in_pool(|| Ok(rec.reconstruct_parallel(lines)?))?
        } else {
            rec.reconstruct(lines)?
        };

        if let Some(pb) = pb {
            pb.finish_with_message("thread dump scanned");
        }
        Ok(out)
    }

    /// Rebuild the reply structure from `structure_path`.
    pub fn reconstruct(&self) -> Result<Reconstruction> {
        init_tracing_once();
        let lines = read_structure_lines(&self.opts.structure_path, self.opts.read_buffer_bytes)?;
        self.reconstruct_lines(&lines)
            .with_context(|| format!("reconstructing {}", self.opts.structure_path.display()))
    }

    /// Load the comment table from `comments_path`.
    pub fn load_comments(&self) -> Result<Vec<CommentRecord>> {
        init_tracing_once();
        let opts = TableLoadOptions {
            read_buffer_bytes: self.opts.read_buffer_bytes,
            progress: self.opts.progress,
            progress_label: Some("Loading comment table".to_string()),
            human_timestamps: self.opts.human_readable_timestamps,
        };
        let load = || load_comment_table(&self.opts.comments_path, &opts);
        self.in_pool(load)
            .with_context(|| format!("loading comment table {}", self.opts.comments_path.display()))
    }

    /// Core run over in-memory inputs: reconstruct, join, featurize, optionally clean.
    pub fn run_with<S: AsRef<str> + Sync>(&self, lines: &[S], comments: Vec<CommentRecord>) -> Result<PipelineOutput> {
        let recon = self.reconstruct_lines(lines)?;
        self.finish(recon, comments)
    }

    /// Full run from the configured input files.
    pub fn run(&self) -> Result<PipelineOutput> {
        let recon = self.reconstruct()?;
        let comments = self.load_comments()?;
        self.finish(recon, comments)
    }

    /// `run()` and write the resulting rows to `out`.
    pub fn run_to(&self, out: &Path, format: ExportFormat) -> Result<PipelineOutput> {
        let output = self.run()?;
        export_rows(&output.rows, out, format, self.opts.write_buffer_bytes)?;
        Ok(output)
    }

    /// Label up to `limit` rows with `classifier`.
    pub fn annotate(&self, rows: &[FeatureRecord], classifier: &dyn SentimentClassifier, limit: Option<usize>) -> Result<Vec<LabeledRow>> {
        init_tracing_once();
        let labeled = annotate_sentiment(rows, classifier, limit)?;
        tracing::info!(rows = labeled.len(), "annotated rows with sentiment");
        Ok(labeled)
    }

    fn finish(&self, recon: Reconstruction, comments: Vec<CommentRecord>) -> Result<PipelineOutput> {
        let Reconstruction { records, report } = recon;
        let outcome = merge(comments, &records);
        let rows = self.in_pool(|| Ok(derive_features(outcome.rows)))?;

        let (rows, clean) = if self.opts.clean_text {
            let (rows, stats) = match &self.cleaner {
                Some(c) => clean_table(rows, c.as_ref()),
                None => clean_table(rows, &RedditCleaner::new()),
            };
            (rows, Some(stats))
        } else {
            (rows, None)
        };

        Ok(PipelineOutput { rows, scan: report, merge: outcome.stats, warnings: outcome.warnings, clean })
    }

    /// Run `f` on a dedicated pool when `parallelism` is set, else on the global pool.
    fn in_pool<T: Send>(&self, f: impl FnOnce() -> Result<T> + Send) -> Result<T> {
        match self.opts.parallelism {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .context("building rayon thread pool")?;
                pool.install(f)
            }
            None => f(),
        }
    }
}
