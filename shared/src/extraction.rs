//! Decoding of JSON embedded in free-text generative model replies
//!
//! Models are asked for raw JSON but routinely wrap it in markdown fences or
//! surround it with prose. Decoding tries, in order:
//! 1. the whole trimmed reply
//! 2. the first-opener-to-last-closer span found by pattern match
//! 3. every balanced bracket span, left to right
//!
//! The first candidate that parses with the expected shape wins.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array span pattern"));

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object span pattern"));

/// Top-level JSON shape a reply is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonShape::Array => value.is_array(),
            JsonShape::Object => value.is_object(),
        }
    }

    fn opener(&self) -> char {
        match self {
            JsonShape::Array => '[',
            JsonShape::Object => '{',
        }
    }

    fn span_pattern(&self) -> &'static Regex {
        match self {
            JsonShape::Array => &ARRAY_SPAN,
            JsonShape::Object => &OBJECT_SPAN,
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonShape::Array => f.write_str("array"),
            JsonShape::Object => f.write_str("object"),
        }
    }
}

/// Why a model reply could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("model reply is empty")]
    EmptyReply,

    #[error("model reply does not contain a JSON {0}")]
    NotFound(JsonShape),

    #[error("model reply JSON {shape} does not match the expected schema: {message}")]
    Schema { shape: JsonShape, message: String },
}

/// Find and parse the JSON value of the given shape embedded in `reply`
pub fn extract_json(reply: &str, shape: JsonShape) -> Result<Value, ExtractionError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyReply);
    }

    if let Some(value) = parse_shaped(trimmed, shape) {
        return Ok(value);
    }

    if let Some(span) = shape.span_pattern().find(trimmed) {
        if let Some(value) = parse_shaped(span.as_str(), shape) {
            return Ok(value);
        }
    }

    trimmed
        .match_indices(shape.opener())
        .filter_map(|(start, _)| balanced_span_from(trimmed, start))
        .find_map(|span| parse_shaped(span, shape))
        .ok_or(ExtractionError::NotFound(shape))
}

/// Extract and deserialize a reply into `T`
pub fn decode_reply<T: DeserializeOwned>(reply: &str, shape: JsonShape) -> Result<T, ExtractionError> {
    let value = extract_json(reply, shape)?;
    serde_json::from_value(value).map_err(|e| ExtractionError::Schema {
        shape,
        message: e.to_string(),
    })
}

fn parse_shaped(candidate: &str, shape: JsonShape) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(|value| shape.matches(value))
}

/// The bracket span opening at `start` and closing at its matching bracket.
/// Brackets inside JSON strings are ignored.
fn balanced_span_from(text: &str, start: usize) -> Option<&str> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => stack.push(c),
            ']' | '}' => {
                let open = stack.pop()?;
                if (open == '[') != (c == ']') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
