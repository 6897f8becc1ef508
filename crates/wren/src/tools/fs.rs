//! File reading and editing tools.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;

use super::{require_str, resolve_path};
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "read",
            "Read a text file. Returns a window of lines with 1-based line numbers.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file, ~ allowed"
                    },
                    "offset": {
                        "type": "integer",
                        "description": "First line to read, 1-based (default 1)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of lines to return (default 200)"
                    }
                },
                "required": ["path"]
            }),
        ),
        Box::new(ReadFile),
    )?;

    registry.register(
        Tool::new(
            "write",
            "Write content to a file, creating it (and parent directories) if needed and replacing any existing content.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file, ~ allowed"
                    },
                    "content": {
                        "type": "string",
                        "description": "Full content to write"
                    }
                },
                "required": ["path", "content"]
            }),
        ),
        Box::new(WriteFile),
    )?;

    registry.register(
        Tool::new(
            "edit",
            "Replace text in an existing file. The old text must appear exactly once.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the file, ~ allowed"
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Exact text to replace; must be unique in the file"
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Replacement text"
                    }
                },
                "required": ["path", "old_str", "new_str"]
            }),
        ),
        Box::new(EditFile),
    )
}

struct ReadFile;

#[async_trait]
impl ToolHandler for ReadFile {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let path = resolve_path(require_str(&args, "path")?)?;
        let offset = args["offset"].as_u64().unwrap_or(1).max(1) as usize;
        let limit = args["limit"].as_u64().unwrap_or(200) as usize;

        let content = fs::read_to_string(&path).map_err(|e| {
            AgentError::ExecutionError(format!("failed to read {}: {e}", path.display()))
        })?;

        let window: Vec<String> = content
            .lines()
            .enumerate()
            .skip(offset - 1)
            .take(limit)
            .map(|(i, line)| format!("{:>6} | {}", i + 1, line))
            .collect();

        if window.is_empty() {
            return Ok(json!(format!(
                "{} has {} lines; nothing at offset {}",
                path.display(),
                content.lines().count(),
                offset
            )));
        }

        Ok(json!(window.join("\n")))
    }
}

struct WriteFile;

#[async_trait]
impl ToolHandler for WriteFile {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let path = resolve_path(require_str(&args, "path")?)?;
        let content = args["content"].as_str().ok_or_else(|| {
            AgentError::InvalidParameters("missing 'content' parameter".to_string())
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AgentError::ExecutionError(format!(
                        "failed to create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        fs::write(&path, content).map_err(|e| {
            AgentError::ExecutionError(format!("failed to write {}: {e}", path.display()))
        })?;

        Ok(json!(format!(
            "Wrote {} bytes to {}",
            content.len(),
            path.display()
        )))
    }
}

struct EditFile;

#[async_trait]
impl ToolHandler for EditFile {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let path = resolve_path(require_str(&args, "path")?)?;
        let old_str = require_str(&args, "old_str")?;
        let new_str = args["new_str"].as_str().ok_or_else(|| {
            AgentError::InvalidParameters("missing 'new_str' parameter".to_string())
        })?;

        let content = fs::read_to_string(&path).map_err(|e| {
            AgentError::ExecutionError(format!("failed to read {}: {e}", path.display()))
        })?;

        match content.matches(old_str).count() {
            0 => Err(AgentError::InvalidParameters(
                "'old_str' not found in the file".to_string(),
            )),
            1 => {
                let updated = content.replace(old_str, new_str);
                fs::write(&path, updated).map_err(|e| {
                    AgentError::ExecutionError(format!(
                        "failed to write {}: {e}",
                        path.display()
                    ))
                })?;
                Ok(json!(format!("Replaced text in {}", path.display())))
            }
            n => Err(AgentError::InvalidParameters(format!(
                "'old_str' appears {n} times; it must be unique"
            ))),
        }
    }
}
