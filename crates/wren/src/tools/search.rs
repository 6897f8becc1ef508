//! Filename and content search tools.

use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::{json, Value};
use walkdir::WalkDir;

use super::{require_str, resolve_path};
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

const MAX_RESULTS: usize = 200;
const MAX_FILE_BYTES: u64 = 1_000_000;

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "glob",
            "Find files whose names match a glob-style pattern (* and ? wildcards), searching a directory recursively.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Filename pattern, e.g. *.rs or config.?ml"
                    },
                    "path": {
                        "type": "string",
                        "description": "Directory to search (default: current directory)"
                    }
                },
                "required": ["pattern"]
            }),
        ),
        Box::new(Glob),
    )?;

    registry.register(
        Tool::new(
            "grep",
            "Search file contents with a regex. Returns matching lines as path:line:text. Great for finding definitions and usages.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Regex pattern to search for"
                    },
                    "path": {
                        "type": "string",
                        "description": "Directory or file to search (default: current directory)"
                    },
                    "case_sensitive": {
                        "type": "boolean",
                        "description": "Whether the search is case-sensitive (default false)"
                    }
                },
                "required": ["pattern"]
            }),
        ),
        Box::new(Grep),
    )
}

/// Translate a `*`/`?` glob into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for c in pattern.chars() {
        match c {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            c => translated.push_str(&regex::escape(&c.to_string())),
        }
    }
    translated.push('$');
    regex::Regex::new(&translated)
}

fn skip_entry(entry: &walkdir::DirEntry) -> bool {
    // the walk root is searched even when it is a hidden directory
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "target" || name == "node_modules")
        .unwrap_or(false)
}

struct Glob;

#[async_trait]
impl ToolHandler for Glob {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let pattern = require_str(&args, "pattern")?;
        let root = resolve_path(args["path"].as_str().unwrap_or("."))?;

        let matcher = glob_to_regex(pattern)
            .map_err(|e| AgentError::InvalidParameters(format!("bad glob pattern: {e}")))?;

        let mut matches = Vec::new();
        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| !skip_entry(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if let Some(name) = entry.file_name().to_str() {
                if matcher.is_match(name) {
                    matches.push(entry.path().display().to_string());
                    if matches.len() >= MAX_RESULTS {
                        matches.push("... [result limit reached]".to_string());
                        break;
                    }
                }
            }
        }

        if matches.is_empty() {
            Ok(json!(format!("no files matching '{pattern}'")))
        } else {
            Ok(json!(matches.join("\n")))
        }
    }
}

struct Grep;

#[async_trait]
impl ToolHandler for Grep {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let pattern = require_str(&args, "pattern")?;
        let root = resolve_path(args["path"].as_str().unwrap_or("."))?;
        let case_sensitive = args["case_sensitive"].as_bool().unwrap_or(false);

        let matcher = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| AgentError::InvalidParameters(format!("bad regex: {e}")))?;

        let mut matches = Vec::new();
        'outer: for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| !skip_entry(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if entry.metadata().map(|m| m.len()).unwrap_or(0) > MAX_FILE_BYTES {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue; // binary or unreadable
            };
            for (number, line) in content.lines().enumerate() {
                if matcher.is_match(line) {
                    matches.push(format!(
                        "{}:{}:{}",
                        entry.path().display(),
                        number + 1,
                        line.trim_end()
                    ));
                    if matches.len() >= MAX_RESULTS {
                        matches.push("... [result limit reached]".to_string());
                        break 'outer;
                    }
                }
            }
        }

        if matches.is_empty() {
            Ok(json!(format!("no matches for '{pattern}'")))
        } else {
            Ok(json!(matches.join("\n")))
        }
    }
}
