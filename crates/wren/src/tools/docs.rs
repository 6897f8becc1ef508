//! Document creation.

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
            "create_document",
            "Create a markdown document with an optional title heading. Adds a .md extension when the path has none.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path for the document, ~ allowed"
                    },
                    "content": {
                        "type": "string",
                        "description": "Body text of the document"
                    },
                    "title": {
                        "type": "string",
                        "description": "Optional title, rendered as a top-level heading"
                    }
                },
                "required": ["path", "content"]
            }),
        ),
        Box::new(CreateDocument),
    )
}

struct CreateDocument;

#[async_trait]
impl ToolHandler for CreateDocument {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let mut path = resolve_path(require_str(&args, "path")?)?;
        let content = args["content"].as_str().ok_or_else(|| {
            AgentError::InvalidParameters("missing 'content' parameter".to_string())
        })?;
        let title = args["title"].as_str().unwrap_or("");

        if path.extension().is_none() {
            path.set_extension("md");
        }

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

        let document = if title.is_empty() {
            content.to_string()
        } else {
            format!("# {title}\n\n{content}")
        };

        fs::write(&path, &document).map_err(|e| {
            AgentError::ExecutionError(format!("failed to write {}: {e}", path.display()))
        })?;

        Ok(json!(format!("Created document: {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_document_with_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report");
        let path_str = path.to_string_lossy().to_string();

        let result = CreateDocument
            .call(json!({"path": path_str, "content": "All tests pass.", "title": "Status"}))
            .await
            .unwrap();
        assert!(result.as_str().unwrap().contains("report.md"));

        let written = fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert_eq!(written, "# Status\n\nAll tests pass.");
    }

    #[tokio::test]
    async fn test_keeps_explicit_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path_str = path.to_string_lossy().to_string();

        CreateDocument
            .call(json!({"path": path_str, "content": "plain text"}))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "plain text");
    }

    #[tokio::test]
    async fn test_missing_content_rejected() {
        let result = CreateDocument.call(json!({"path": "doc.md"})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }
}
