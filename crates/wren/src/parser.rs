//! Parsing of the textual tool-invocation protocol.
//!
//! The model requests a tool with a two-line pattern:
//!
//! ```text
//! TOOL: grep
//! ARGS: {"pattern": "fn main", "path": "src"}
//! ```
//!
//! Anything without that pattern is the final answer for the turn.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::tool::ToolCall;

lazy_static! {
    static ref TOOL_HEADER: Regex = Regex::new(r"(?m)^\s*TOOL:\s*(\w+)\s*\r?\n\s*ARGS:\s*").unwrap();
}

/// Classification of one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The reply requests a tool invocation.
    ToolCall(ToolCall),
    /// No invocation pattern present; the whole text is the answer.
    Final(String),
    /// The invocation marker is present but the arguments are unusable.
    /// Fed back to the model as a tool error so it can self-correct.
    Malformed { name: String, detail: String },
}

/// Scan a raw model reply for the tool-invocation protocol.
pub fn parse_reply(text: &str) -> Reply {
    let Some(captures) = TOOL_HEADER.captures(text) else {
        return Reply::Final(text.to_string());
    };

    let name = captures[1].to_string();
    let rest = &text[captures.get(0).unwrap().end()..];

    let Some(raw_args) = extract_balanced_json(rest) else {
        return Reply::Malformed {
            name,
            detail: "no JSON object found after ARGS:".to_string(),
        };
    };

    match serde_json::from_str(raw_args) {
        Ok(arguments) => Reply::ToolCall(ToolCall::new(name, arguments)),
        Err(e) => Reply::Malformed {
            name,
            detail: format!("invalid JSON arguments: {e}"),
        },
    }
}

/// Extract the first balanced `{...}` object from `text`, honoring string
/// literals and backslash escapes so braces inside argument values do not
/// terminate the scan early.
fn extract_balanced_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
