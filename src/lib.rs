mod config;
mod error;
mod paths;
mod progress;
mod util;
mod zstd_jsonl;
mod ndjson;

mod tokenizer;
mod ancestry;
mod structure;

mod comments;
mod load;
mod merge;
mod features;

mod clean;
mod classify;
mod export;
mod pipeline;

pub use crate::config::PipelineOptions;
pub use crate::error::{EtlError, MergeWarning};
pub use crate::pipeline::{PipelineOutput, ThreadETL};

// Thread dump parsing.
pub use crate::tokenizer::{sentinel_post_id, LineKind, Token, TokenMode, Tokenizer, POST_SENTINEL, TOKEN_LEN};
pub use crate::ancestry::AncestorStack;
pub use crate::structure::{MalformedComment, Reconstruction, ScanReport, StructureRecord, TreeReconstructor, INDENT_UNIT};

// Comment table, join and features.
pub use crate::comments::{CommentRecord, REQUIRED_FIELDS};
pub use crate::merge::{merge, MergeOutcome, MergeStats, MergedRow};
pub use crate::features::{derive_features, derive_row, is_root, target_binary, text_features, FeatureRecord, TextFeatures, MISSING_BODY_TEXT};

// Collaborator seams.
pub use crate::clean::{clean_table, CleanStats, RedditCleaner, TextCleaner};
pub use crate::classify::{annotate_sentiment, label_distribution, LabeledRow, Prediction, SentimentClassifier, NEUTRAL_LABEL};

// I/O.
pub use crate::load::{load_comment_table, read_structure_lines, TableLoadOptions};
pub use crate::export::{export_rows, ExportFormat};
pub use crate::paths::discover_table_parts;
pub use crate::zstd_jsonl::read_all_lines;
pub use crate::util::init_tracing_once;
