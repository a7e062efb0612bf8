#[path = "common/mod.rs"]
mod common;

use common::*;
use echoetl::{
    export_rows, load_comment_table, ExportFormat, PipelineOptions, TableLoadOptions, ThreadETL, TokenMode,
};
use std::fs;

/// End-to-end over files:
/// 1) Lay out the two-post dump and a 7-row comment table under a temp dir.
/// 2) Run reconstruct + join + features and export JSONL.
/// 3) The comment with no structure is dropped, every other row carries the
///    derived columns and its passthrough fields.
#[test]
fn run_to_jsonl_end_to_end() {
    let (base, structure, comments) = make_inputs_basic();
    let out_path = base.join("processed").join("full_dataset.jsonl");

    let out = ThreadETL::new()
        .structure_path(&structure)
        .comments_path(&comments)
        .progress(false)
        .run_to(&out_path, ExportFormat::Jsonl)
        .unwrap();

    assert_eq!(out.rows.len(), 6);
    assert_eq!(out.merge.dropped_comments, 1);
    assert!(out.scan.is_clean());
    assert!(!out.is_empty_join());
    assert!(out.clean.is_none());

    let vals = read_jsonl_values(&out_path);
    assert_eq!(vals.len(), 6);
    let first = &vals[0];
    assert_eq!(first["comment_id"], "aaaaaa1");
    assert_eq!(first["parent_id"], "post001");
    assert_eq!(first["post_id"], "post001");
    assert_eq!(first["depth"], 0);
    assert_eq!(first["is_root"], true);
    assert_eq!(first["target_binary"], true);
    assert_eq!(first["author"], "alice");
    assert!(vals.iter().all(|v| v.get("clean_body").is_none()));
    assert!(!base.join("processed").join("full_dataset.jsonl.inprogress").exists());
}

/// With text cleaning enabled rows whose body cleans to nothing are dropped.
#[test]
fn run_with_cleaning() {
    let (_base, structure, comments) = make_inputs_basic();
    let out = ThreadETL::new()
        .structure_path(&structure)
        .comments_path(&comments)
        .clean_text(true)
        .run()
        .unwrap();

    // cccccc3 (null), dddddd4 ([removed]) and ffffff6 (empty) are gone.
    let ids: Vec<&str> = out.rows.iter().map(|r| r.comment_id.as_str()).collect();
    assert_eq!(ids, ["aaaaaa1", "bbbbbb2", "eeeeee5"]);
    let clean = out.clean.unwrap();
    assert_eq!((clean.kept, clean.dropped), (3, 3));
    assert_eq!(out.rows[1].clean_body.as_deref(), Some("i disagree see"));
}

/// Parallel and dedicated-pool runs produce the same table as the sequential run.
#[test]
fn parallel_runs_match_sequential() {
    let dump = dump_two_posts();
    let rows = comment_rows_two_posts();
    let comments = || {
        rows.iter()
            .enumerate()
            .map(|(i, v)| echoetl::CommentRecord::from_value(v.clone(), i + 1).unwrap())
            .collect::<Vec<_>>()
    };

    let seq = ThreadETL::new().run_with(&dump, comments()).unwrap();
    let par = ThreadETL::new().parallel(true).run_with(&dump, comments()).unwrap();
    let pool = ThreadETL::new().parallelism(2).run_with(&dump, comments()).unwrap();

    assert_eq!(seq.rows, par.rows);
    assert_eq!(seq.rows, pool.rows);
    assert_eq!(seq.scan, pool.scan);
}

/// Strict mode surfaces an unrooted comment as an error with the dump path in context.
#[test]
fn strict_run_fails_on_unrooted_comment() {
    let base = temp_base();
    let structure = base.join("dump.txt");
    write_text(&structure, &lines(&["    aaaaaaa", "For Post ID: p0"]));
    let err = ThreadETL::new().structure_path(&structure).strict(true).reconstruct().unwrap_err();
    let malformed = err.chain().find_map(|e| e.downcast_ref::<echoetl::EtlError>());
    assert!(matches!(malformed, Some(echoetl::EtlError::MalformedInput { line_no: 1, .. })));
    assert!(format!("{err:#}").contains("dump.txt"));

    // Lenient mode reports the same line instead.
    let recon = ThreadETL::new().structure_path(&structure).reconstruct().unwrap();
    assert_eq!(recon.report.malformed.len(), 1);
}

/// Inputs describing different threads join to nothing: empty table, warning set.
#[test]
fn empty_join_is_a_warning() {
    let dump = lines(&["For Post ID: p0", "    aaaaaaa"]);
    let out = ThreadETL::new().run_with(&dump, vec![comment("bbbbbbb", Some("x"), Some(1.0))]).unwrap();
    assert!(out.rows.is_empty());
    assert!(out.is_empty_join());
}

/// A compressed dump and a compressed table load like plain ones, and the zst export
/// decompresses to the same rows.
#[test]
fn zst_inputs_and_output() {
    let base = temp_base();
    let structure = base.join("thread_structure.txt.zst");
    let comments = base.join("comments.jsonl.zst");
    write_zst_lines(&structure, &dump_two_posts());
    let table: Vec<String> = comment_rows_two_posts().iter().map(|v| v.to_string()).collect();
    write_zst_lines(&comments, &table);

    let out_path = base.join("out").join("rows.jsonl.zst");
    let out = ThreadETL::new()
        .structure_path(&structure)
        .comments_path(&comments)
        .run_to(&out_path, ExportFormat::Zst)
        .unwrap();
    assert_eq!(out.rows.len(), 6);

    let decoded = decompress_zst_lines(&out_path);
    assert_eq!(decoded.len(), 6);
    let v: serde_json::Value = serde_json::from_str(&decoded[2]).unwrap();
    assert_eq!(v["comment_id"], "cccccc3");
    assert_eq!(v["char_count"], 3);
}

/// JSON array exports, compact and pretty, parse back to the same rows.
#[test]
fn json_array_exports() {
    let (base, structure, comments) = make_inputs_basic();
    let out = ThreadETL::new().structure_path(&structure).comments_path(&comments).run().unwrap();

    for (name, format) in [
        ("rows.json", ExportFormat::JsonArray { pretty: false }),
        ("rows.pretty.json", ExportFormat::JsonArray { pretty: true }),
    ] {
        let path = base.join(name);
        let n = export_rows(&out.rows, &path, format, 8 * 1024).unwrap();
        assert_eq!(n, 6);
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 6);
        assert_eq!(parsed[4]["comment_id"], "eeeeee5");
    }

    let empty: Vec<echoetl::FeatureRecord> = Vec::new();
    let path = base.join("empty.json");
    export_rows(&empty, &path, ExportFormat::JsonArray { pretty: true }, 8 * 1024).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert!(parsed.is_empty());
}

/// Exporting over an existing file replaces it.
#[test]
fn export_replaces_existing_file() {
    let base = temp_base();
    let path = base.join("rows.jsonl");
    fs::write(&path, "stale\n").unwrap();
    let recs = rebuild(&["For Post ID: p0", "    aaaaaaa"]);
    export_rows(&recs, &path, ExportFormat::Jsonl, 8 * 1024).unwrap();
    let vals = read_jsonl_values(&path);
    assert_eq!(vals.len(), 1);
    assert_eq!(vals[0]["comment_id"], "aaaaaaa");
    assert_eq!(vals[0]["level"], 4);
}

#[test]
fn export_format_names() {
    assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
    assert_eq!("NDJSON".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
    assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::JsonArray { pretty: false });
    assert_eq!("json-pretty".parse::<ExportFormat>().unwrap(), ExportFormat::JsonArray { pretty: true });
    assert_eq!("zst".parse::<ExportFormat>().unwrap(), ExportFormat::Zst);
    assert!("csv".parse::<ExportFormat>().is_err());
}

/// Builder defaults and clamps.
#[test]
fn options_builders() {
    let opts = PipelineOptions::default();
    assert_eq!(opts.token_mode, TokenMode::Anchored);
    assert!(!opts.strict && !opts.parallel && !opts.clean_text);
    assert!(opts.parallelism.is_none());

    let opts = PipelineOptions::default().with_parallelism(0).with_io_read_buffer(1).with_io_write_buffer(1);
    assert_eq!(opts.parallelism, Some(1));
    assert!(opts.parallel);
    assert_eq!(opts.read_buffer_bytes, 8 * 1024);
    assert_eq!(opts.write_buffer_bytes, 8 * 1024);

    let etl = ThreadETL::new().token_mode(TokenMode::FirstMatch).strict(true);
    assert_eq!(etl.options().token_mode, TokenMode::FirstMatch);
    assert!(etl.options().strict);
}

/// Environment overrides. Only this test touches these variables.
#[test]
fn env_overrides() {
    std::env::set_var("ECHOETL_STRICT", "1");
    std::env::set_var("ECHOETL_PARALLEL", "false");
    std::env::set_var("ECHOETL_TOKEN_MODE", "first-match");
    let opts = PipelineOptions::default().with_parallel(true).with_env_overrides();
    std::env::remove_var("ECHOETL_STRICT");
    std::env::remove_var("ECHOETL_PARALLEL");
    std::env::remove_var("ECHOETL_TOKEN_MODE");

    assert!(opts.strict);
    assert!(!opts.parallel);
    assert_eq!(opts.token_mode, TokenMode::FirstMatch);
}

/// Human-readable timestamps flow through the pipeline into the output rows.
#[test]
fn human_timestamps_reach_output() {
    let (_base, structure, comments) = make_inputs_basic();
    let out = ThreadETL::new()
        .structure_path(&structure)
        .comments_path(&comments)
        .timestamps_human_readable(true)
        .run()
        .unwrap();
    assert_eq!(out.rows[0].extra["created_utc"], "2006-01-01T00:16:40Z");

    let raw = load_comment_table(&comments, &TableLoadOptions::default()).unwrap();
    assert_eq!(raw[0].extra["created_utc"], 1136074600);
}

/// Exporting onto an existing directory fails promptly and leaves no staging file.
#[test]
fn export_onto_directory_fails_fast_and_cleans_up() {
    let base = temp_base();
    let target = base.join("out");
    fs::create_dir_all(&target).unwrap();
    let recs = rebuild(&["For Post ID: p0", "    aaaaaaa"]);

    let started = std::time::Instant::now();
    let res = export_rows(&recs, &target, ExportFormat::Jsonl, 8 * 1024);
    assert!(res.is_err());
    assert!(started.elapsed() < std::time::Duration::from_secs(5), "took {:?}", started.elapsed());
    assert!(!base.join("out.inprogress").exists());
    assert!(target.is_dir());
}
