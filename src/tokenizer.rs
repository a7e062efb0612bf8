//! Line classification for indented thread dumps: post sentinels, comment tokens
//! with their column, and everything else (tree art, blank lines, free text).

use regex::Regex;
use std::sync::OnceLock;

/// Marker that opens a new post block. The post id is the trimmed text after the last `:`.
pub const POST_SENTINEL: &str = "For Post ID:";

/// Comment identifiers are exactly this many lowercase ASCII alphanumerics.
pub const TOKEN_LEN: usize = 7;

/// How a comment token is located on a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenMode {
    /// The token must be the first alphanumeric run on the line; only whitespace and
    /// tree-drawing punctuation may precede it, and it must end at a word boundary.
    #[default]
    Anchored,
    /// The first 7-character `[a-z0-9]` run anywhere on the line, even inside longer
    /// words or after free text.
    FirstMatch,
}

impl std::str::FromStr for TokenMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anchored" => Ok(TokenMode::Anchored),
            "first-match" | "first_match" | "firstmatch" => Ok(TokenMode::FirstMatch),
            other => Err(format!("unknown token mode `{other}` (expected anchored|first-match)")),
        }
    }
}

/// A comment identifier and the character column where it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub column: usize,
    pub id: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Post boundary. `post_id` may be empty when nothing follows the marker.
    Sentinel { post_id: &'a str },
    Comment(Token<'a>),
    Skip,
}

fn first_match_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("[a-z0-9]{{{TOKEN_LEN}}}")).unwrap())
}

fn anchored_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^[^\p{{L}}\p{{N}}]*([a-z0-9]{{{TOKEN_LEN}}})(?:[^\p{{L}}\p{{N}}]|$)")).unwrap()
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Tokenizer {
    mode: TokenMode,
}

impl Tokenizer {
    pub fn new(mode: TokenMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TokenMode {
        self.mode
    }

    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        if let Some(post_id) = sentinel_post_id(line) {
            return LineKind::Sentinel { post_id };
        }
        match self.token(line) {
            Some(tok) => LineKind::Comment(tok),
            None => LineKind::Skip,
        }
    }

    /// Locate the comment token on `line`. The column counts characters, not bytes,
    /// so box-drawing prefixes indent the same as their on-screen width.
    pub fn token<'a>(&self, line: &'a str) -> Option<Token<'a>> {
        let m = match self.mode {
            TokenMode::FirstMatch => first_match_re().find(line)?,
            TokenMode::Anchored => anchored_re().captures(line)?.get(1)?,
        };
        let column = line[..m.start()].chars().count();
        Some(Token { column, id: m.as_str() })
    }
}

/// Returns the post id for a sentinel line, `None` for any other line.
pub fn sentinel_post_id(line: &str) -> Option<&str> {
    if !line.contains(POST_SENTINEL) {
        return None;
    }
    line.rsplit(':').next().map(str::trim)
}
