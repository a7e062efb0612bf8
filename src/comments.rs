//! Raw comment table: one JSON object per line carrying at least `comment_id`,
//! `body` and `score`. Everything else rides along untouched.

use crate::error::EtlError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Columns every comment table record must carry (values may be null, except the id).
pub const REQUIRED_FIELDS: [&str; 3] = ["comment_id", "body", "score"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub body: Option<String>,
    pub score: Option<f64>,
    /// Remaining columns of the source record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommentRecord {
    /// Build a record from one parsed table row. `line_no` is only used for errors.
    pub fn from_value(v: Value, line_no: usize) -> Result<Self, EtlError> {
        let mut obj = match v {
            Value::Object(m) => m,
            other => {
                return Err(EtlError::InvalidRecord {
                    line_no,
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                })
            }
        };
        for field in REQUIRED_FIELDS {
            if !obj.contains_key(field) {
                return Err(EtlError::MissingField { field, line_no });
            }
        }

        let comment_id = match obj.remove("comment_id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(EtlError::InvalidRecord {
                    line_no,
                    reason: format!("`comment_id` must be a non-empty string, got {}", json_kind(&other)),
                })
            }
            None => return Err(EtlError::MissingField { field: "comment_id", line_no }),
        };

        let body = match obj.remove("body") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        let score = match obj.remove("score") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(EtlError::InvalidRecord {
                        line_no,
                        reason: format!("`score` must be numeric, got {s:?}"),
                    })
                }
            },
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(EtlError::InvalidRecord {
                    line_no,
                    reason: format!("`score` must be numeric, got {}", json_kind(&other)),
                })
            }
        };

        Ok(Self { comment_id, body, score, extra: obj })
    }

    /// Parse one NDJSON line.
    pub fn from_line(line: &str, line_no: usize) -> Result<Self, EtlError> {
        let v: Value = serde_json::from_str(line)
            .map_err(|e| EtlError::InvalidRecord { line_no, reason: e.to_string() })?;
        Self::from_value(v, line_no)
    }

    /// Render numeric timestamp passthrough fields as RFC3339 strings.
    pub fn humanize_timestamps(&mut self) {
        for key in ["created_utc", "retrieved_on", "edited"] {
            humanize_in_place(&mut self.extra, key);
        }
    }
}

fn humanize_in_place(map: &mut Map<String, Value>, key: &str) {
    if let Some(v) = map.get_mut(key) {
        // "edited" is sometimes a bool; only numeric values are converted.
        let secs = v.as_i64().or_else(|| v.as_f64().map(|f| f as i64));
        if let Some(n) = secs {
            if let Ok(dt) = OffsetDateTime::from_unix_timestamp(n) {
                if let Ok(s) = dt.format(&Rfc3339) {
                    *v = Value::String(s);
                }
            }
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
