//! echoetl - rebuild comment reply trees from an indented thread dump and join them
//! with a scored comment table.
//!
//! ```bash
//! # Full feature table
//! echoetl build --structure data/raw/thread_structure.txt \
//!     --comments data/raw/comments.jsonl --out data/processed/full_dataset.jsonl
//!
//! # Structure only / data-quality report
//! echoetl structure --structure data/raw/thread_structure.txt --out structure.jsonl
//! echoetl inspect --structure data/raw/thread_structure.txt
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use echoetl::{export_rows, ExportFormat, PipelineOptions, ThreadETL, TokenMode};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "echoetl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconstruct, join and featurize into one table
    Build(BuildArgs),
    /// Export only the reconstructed structure records
    Structure(StructureArgs),
    /// Print the data-quality report for a thread dump
    Inspect(ScanArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Indented thread dump (.txt, or .zst)
    #[arg(long, env = "ECHOETL_STRUCTURE")]
    structure: PathBuf,

    /// Token location rule: anchored | first-match
    #[arg(long, default_value = "anchored")]
    token_mode: TokenMode,

    /// Fail on comments that appear before any post sentinel
    #[arg(long)]
    strict: bool,

    /// Scan post blocks in parallel
    #[arg(long)]
    parallel: bool,

    /// Dedicated worker threads (implies --parallel)
    #[arg(long)]
    threads: Option<usize>,

    /// Show progress bars
    #[arg(long)]
    progress: bool,
}

#[derive(Debug, Args)]
struct StructureArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Output file
    #[arg(long)]
    out: PathBuf,

    /// jsonl | json | json-pretty | zst
    #[arg(long, default_value = "jsonl")]
    format: ExportFormat,
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Comment table: NDJSON file (optionally .zst) or a directory of parts
    #[arg(long, env = "ECHOETL_COMMENTS")]
    comments: PathBuf,

    /// Output file
    #[arg(long)]
    out: PathBuf,

    /// jsonl | json | json-pretty | zst
    #[arg(long, default_value = "jsonl")]
    format: ExportFormat,

    /// Add clean_body and drop rows whose body cleans to nothing
    #[arg(long)]
    clean: bool,

    /// Render numeric created_utc / retrieved_on / edited as RFC3339
    #[arg(long)]
    human_timestamps: bool,

    /// Also write the scan/merge report as JSON here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl ScanArgs {
    fn options(&self) -> PipelineOptions {
        let mut opts = PipelineOptions::default()
            .with_env_overrides()
            .with_structure_path(&self.structure)
            .with_token_mode(self.token_mode)
            .with_strict(self.strict)
            .with_parallel(self.parallel)
            .with_progress(self.progress);
        if let Some(n) = self.threads {
            opts = opts.with_parallelism(n);
        }
        opts
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Build(args) => build(args),
        Commands::Structure(args) => structure(args),
        Commands::Inspect(args) => inspect(args),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build(args: BuildArgs) -> Result<()> {
    let opts = args
        .scan
        .options()
        .with_comments_path(&args.comments)
        .with_clean_text(args.clean)
        .with_human_timestamps(args.human_timestamps);
    let etl = ThreadETL::from_options(opts);
    let output = etl.run_to(&args.out, args.format)?;

    if let Some(path) = &args.report {
        let report = json!({
            "scan": output.scan,
            "merge": output.merge,
            "clean": output.clean,
            "empty_join": output.is_empty_join(),
        });
        std::fs::write(path, serde_json::to_vec_pretty(&report)?)?;
    }

    eprintln!(
        "wrote {} rows to {} ({} matched, {} comment rows dropped, {} structure rows dropped, {} malformed)",
        output.rows.len(),
        args.out.display(),
        output.merge.matched,
        output.merge.dropped_comments,
        output.merge.dropped_structure,
        output.scan.malformed.len(),
    );
    if output.is_empty_join() {
        eprintln!("warning: the join produced no rows");
    }
    Ok(())
}

fn structure(args: StructureArgs) -> Result<()> {
    let etl = ThreadETL::from_options(args.scan.options());
    let recon = etl.reconstruct()?;
    let n = export_rows(&recon.records, &args.out, args.format, etl.options().write_buffer_bytes)?;
    eprintln!("wrote {} structure records to {}", n, args.out.display());
    Ok(())
}

fn inspect(args: ScanArgs) -> Result<()> {
    let etl = ThreadETL::from_options(args.options());
    let recon = etl.reconstruct()?;
    println!("{}", serde_json::to_string_pretty(&recon.report)?);
    Ok(())
}
