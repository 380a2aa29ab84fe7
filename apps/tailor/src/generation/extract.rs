//! Structured-text extraction from model replies.
//!
//! Replies are free text that should contain a YAML block, often fenced.
//! Extraction picks the block, a narrow line repair fixes one known malformed
//! pattern, and serde_yaml does the rest.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Top-level keys that open a full resume document.
pub const RECORD_KEYS: &[&str] = &["summary", "skills"];

/// Top-level keys that open a rewrite reply.
pub const REWRITE_KEYS: &[&str] = &["experience", "projects"];

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("fence pattern is valid"));

/// `position: raw_position: "..."` on one line (optionally a list item).
static MERGED_RAW_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>[ \t]*)(?P<dash>-[ \t]+)?position:[ \t]*raw_position:[ \t]*(?P<value>.*?)[ \t]*$",
    )
    .expect("raw_position repair pattern is valid")
});

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("reply contained no structured content")]
    Empty,

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Whether `line` starts (unindented) with one of `keys` followed by a colon.
fn opens_with_key(line: &str, keys: &[&str]) -> bool {
    keys.iter().any(|key| {
        line.strip_prefix(key)
            .is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
}

/// Picks the structured block out of a reply.
///
/// 1. A fenced block whose first non-blank line opens with one of `keys`.
/// 2. Otherwise the first fenced block.
/// 3. With no fences, everything from the first line opening with one of `keys`.
/// 4. Otherwise the whole trimmed reply.
pub fn extract_block(reply: &str, keys: &[&str]) -> String {
    let blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(reply)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if !blocks.is_empty() {
        let preferred = blocks.iter().find(|block| {
            block
                .lines()
                .find(|line| !line.trim().is_empty())
                .is_some_and(|line| opens_with_key(line, keys))
        });
        return preferred.unwrap_or(&blocks[0]).trim().to_string();
    }

    let mut offset = 0;
    for line in reply.split_inclusive('\n') {
        if opens_with_key(line, keys) {
            return reply[offset..].trim().to_string();
        }
        offset += line.len();
    }

    reply.trim().to_string()
}

/// Repairs `position: raw_position: "X"` into a quoted position line followed by
/// `raw_position: true` at the mapping's key column. Other lines pass through.
pub fn repair_structured_text(text: &str) -> String {
    let mut repaired = Vec::new();
    for line in text.lines() {
        let Some(caps) = MERGED_RAW_POSITION.captures(line) else {
            repaired.push(line.to_string());
            continue;
        };
        let indent = caps.name("indent").map_or("", |m| m.as_str());
        let dash = caps.name("dash").map_or("", |m| m.as_str());
        let value = caps.name("value").map_or("", |m| m.as_str());

        repaired.push(format!("{indent}{dash}position: {}", quote_scalar(value)));
        repaired.push(format!("{indent}{}raw_position: true", " ".repeat(dash.len())));
    }

    let mut out = repaired.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Leaves already-quoted scalars alone; double-quotes anything else.
fn quote_scalar(value: &str) -> String {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Repairs then deserializes a structured block.
pub fn parse_structured<T: DeserializeOwned>(block: &str) -> Result<T, ExtractError> {
    if block.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    let repaired = repair_structured_text(block);
    Ok(serde_yaml::from_str(&repaired)?)
}
