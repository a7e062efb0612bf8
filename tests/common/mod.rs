#![allow(dead_code)]

use echoetl::{CommentRecord, TokenMode, TreeReconstructor, StructureRecord};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A small two-post dump:
///
/// ```text
/// For Post ID: post001
/// aaaaaa1            -> post001
///     bbbbbb2        -> post001
///         cccccc3    -> bbbbbb2
///     dddddd4        -> post001
/// For Post ID: post002
///     eeeeee5        -> post002
///         ffffff6    -> eeeeee5
/// ```
pub fn dump_two_posts() -> Vec<String> {
    [
        "For Post ID: post001",
        "aaaaaa1 first top-level line",
        "    bbbbbb2 a reply",
        "        cccccc3 nested reply",
        "    dddddd4 sibling reply",
        "",
        "For Post ID: post002",
        "    eeeeee5",
        "        ffffff6",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Reconstruct with the default (anchored, lenient) settings.
pub fn rebuild(raw: &[&str]) -> Vec<StructureRecord> {
    TreeReconstructor::new(TokenMode::Anchored)
        .reconstruct(&lines(raw))
        .unwrap()
        .records
}

/// Parent of `id` in `records`, panicking when `id` is absent.
pub fn parent_of<'a>(records: &'a [StructureRecord], id: &str) -> Option<&'a str> {
    records
        .iter()
        .find(|r| r.comment_id == id)
        .unwrap_or_else(|| panic!("no record for {id}"))
        .parent_id
        .as_deref()
}

pub fn comment(id: &str, body: Option<&str>, score: Option<f64>) -> CommentRecord {
    CommentRecord::from_value(json!({ "comment_id": id, "body": body, "score": score }), 1).unwrap()
}

/// Comment rows matching `dump_two_posts`, plus one row with no structure (`zzzzzz9`).
pub fn comment_rows_two_posts() -> Vec<Value> {
    vec![
        json!({"comment_id":"aaaaaa1","body":"Top level thoughts here","score":12,"author":"alice","created_utc":1136074600}),
        json!({"comment_id":"bbbbbb2","body":"I disagree, see http://example.com","score":-3,"author":"bob","created_utc":1136074700}),
        json!({"comment_id":"cccccc3","body":null,"score":0,"author":"[deleted]","created_utc":1136074800}),
        json!({"comment_id":"dddddd4","body":"[removed]","score":1,"author":"carol","created_utc":1136074900}),
        json!({"comment_id":"eeeeee5","body":"Great post!","score":40,"author":"dave","created_utc":1136075000}),
        json!({"comment_id":"ffffff6","body":"","score":null,"author":"erin","created_utc":1136075100}),
        json!({"comment_id":"zzzzzz9","body":"not in the dump","score":3,"author":"frank","created_utc":1136075200}),
    ]
}

/// Fresh temp directory that outlives the test (cleaned up by the OS).
pub fn temp_base() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

pub fn write_text(path: &Path, lines: &[String]) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

pub fn write_jsonl(path: &Path, rows: &[Value]) {
    let lines: Vec<String> = rows.iter().map(|v| v.to_string()).collect();
    write_text(path, &lines);
}

/// Write a compressed `.zst` file containing the provided lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Lay out `dump_two_posts` and `comment_rows_two_posts` under a temp dir.
/// Returns (base, structure path, comments path).
pub fn make_inputs_basic() -> (PathBuf, PathBuf, PathBuf) {
    let base = temp_base();
    let structure = base.join("raw").join("thread_structure.txt");
    let comments = base.join("raw").join("comments.jsonl");
    write_text(&structure, &dump_two_posts());
    write_jsonl(&comments, &comment_rows_two_posts());
    (base, structure, comments)
}

/// Read a JSONL file into a vector of `serde_json::Value` (skips empty lines).
pub fn read_jsonl_values(path: &Path) -> Vec<Value> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines()
        .map(|l| l.unwrap())
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str(&s).unwrap())
        .collect()
}

/// Decompress a `.zst` file and collect non-empty lines.
pub fn decompress_zst_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let dec = zstd::stream::read::Decoder::new(f).unwrap();
    let r = BufReader::new(dec);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}
