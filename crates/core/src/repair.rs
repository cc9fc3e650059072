//! Best-effort extraction of a JSON object from model output.
//!
//! Models asked for "only JSON" still wrap it in prose or Markdown fences
//! now and then. Two strategies are tried in order:
//!
//! 1. Parse the whole (trimmed) text.
//! 2. Parse the span from the first `{` to the last `}`.
//!
//! The extractor never retries; the caller decides the fallback.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::RepairError;

/// The result of [`extract`]: a parsed object or the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Parsed(Map<String, Value>),
    Failed { reason: String },
}

impl RepairOutcome {
    /// Whether a JSON object was recovered.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// The failure reason, if extraction failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed { reason } => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<Map<String, Value>, RepairError> {
        match self {
            Self::Parsed(map) => Ok(map),
            Self::Failed { reason } => Err(RepairError { reason }),
        }
    }
}

/// Extract a JSON object from raw model output.
pub fn extract(raw: &str) -> RepairOutcome {
    let trimmed = raw.trim();

    let direct_err = match parse_object(trimmed) {
        Ok(map) => return RepairOutcome::Parsed(map),
        Err(e) => e,
    };

    let Some(candidate) = object_span(trimmed) else {
        return RepairOutcome::Failed {
            reason: format!("no JSON object found ({direct_err})"),
        };
    };

    debug!(
        raw_len = raw.len(),
        span_len = candidate.len(),
        "Direct parse failed, retrying on brace span"
    );

    match parse_object(candidate) {
        Ok(map) => RepairOutcome::Parsed(map),
        Err(reason) => RepairOutcome::Failed { reason },
    }
}

/// The slice from the first `{` to the last `}`, inclusive.
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
