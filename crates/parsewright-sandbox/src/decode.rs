//! Decode a candidate's stdout into a table

use parsewright_domain::{ExecutionFault, TabularResult};
use serde::de::IgnoredAny;

/// Decode candidate stdout into a well-formed table
///
/// Candidates may print log lines before the result, and the result itself
/// may span several lines. The JSON object is taken to start at the last
/// line-leading `{` whose remainder is exactly one JSON value; without one
/// the whole output is decoded so the error points at its first byte.
pub fn decode_output(stdout: &[u8]) -> Result<TabularResult, ExecutionFault> {
    let text = std::str::from_utf8(stdout)
        .map_err(|e| ExecutionFault::MalformedOutput(format!("stdout is not UTF-8: {}", e)))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExecutionFault::MalformedOutput("stdout is empty".to_string()));
    }

    let json = trailing_object(trimmed).unwrap_or(trimmed);
    serde_json::from_str::<TabularResult>(json).map_err(|e| ExecutionFault::MalformedOutput(e.to_string()))
}

/// The suffix of `text` holding its trailing JSON object, if there is one
fn trailing_object(text: &str) -> Option<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with('{') {
            starts.push(offset + indent);
        }
        offset += line.len();
    }

    starts
        .into_iter()
        .rev()
        .map(|start| &text[start..])
        .find(|candidate| serde_json::from_str::<IgnoredAny>(candidate).is_ok())
}
