//! Desktop integration: browser, applications, clipboard.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::io::Write;
use std::process::Stdio;

use super::require_str;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "open_browser",
            "Open a URL in the default web browser. A bare search query opens a web search for it.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to open, or a search query"
                    }
                },
                "required": ["url"]
            }),
        ),
        Box::new(OpenBrowser),
    )?;

    registry.register(
        Tool::new(
            "open_app",
            "Launch a desktop application by name.",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Application name, e.g. Safari or gedit"
                    }
                },
                "required": ["name"]
            }),
        ),
        Box::new(OpenApp),
    )?;

    registry.register(
        Tool::new(
            "clipboard_copy",
            "Copy text to the system clipboard.",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text to place on the clipboard"
                    }
                },
                "required": ["text"]
            }),
        ),
        Box::new(ClipboardCopy),
    )
}

struct OpenBrowser;

#[async_trait]
impl ToolHandler for OpenBrowser {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let target = require_str(&args, "url")?;
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!(
                "https://duckduckgo.com/?q={}",
                target.replace(' ', "+")
            )
        };

        webbrowser::open(&url)
            .map_err(|e| AgentError::ExecutionError(format!("failed to open browser: {e}")))?;
        Ok(json!(format!("Opened {url}")))
    }
}

struct OpenApp;

#[async_trait]
impl ToolHandler for OpenApp {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let name = require_str(&args, "name")?;

        let mut command = if cfg!(target_os = "macos") {
            let mut c = std::process::Command::new("open");
            c.arg("-a").arg(name);
            c
        } else if cfg!(target_os = "windows") {
            let mut c = std::process::Command::new("cmd");
            c.arg("/C").arg("start").arg("").arg(name);
            c
        } else {
            let mut c = std::process::Command::new("xdg-open");
            c.arg(name);
            c
        };

        let status = command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| AgentError::ExecutionError(format!("failed to launch '{name}': {e}")))?;

        if status.success() {
            Ok(json!(format!("Launched {name}")))
        } else {
            Err(AgentError::ExecutionError(format!(
                "launcher exited with {status} for '{name}'"
            )))
        }
    }
}

struct ClipboardCopy;

impl ClipboardCopy {
    fn clipboard_command() -> Option<std::process::Command> {
        let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
            &[("pbcopy", &[])]
        } else if cfg!(target_os = "windows") {
            &[("clip", &[])]
        } else {
            &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"])]
        };

        for (program, args) in candidates {
            if which(program) {
                let mut command = std::process::Command::new(program);
                command.args(*args);
                return Some(command);
            }
        }
        None
    }
}

fn which(program: &str) -> bool {
    std::process::Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[async_trait]
impl ToolHandler for ClipboardCopy {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let text = require_str(&args, "text")?;

        let mut command = Self::clipboard_command().ok_or_else(|| {
            AgentError::ExecutionError("no clipboard utility found on this system".to_string())
        })?;

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AgentError::ExecutionError(format!("failed to spawn clipboard: {e}")))?;

        child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Internal("clipboard stdin unavailable".to_string()))?
            .write_all(text.as_bytes())
            .map_err(|e| AgentError::ExecutionError(format!("failed to write clipboard: {e}")))?;

        let status = child
            .wait()
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;
        if status.success() {
            Ok(json!(format!("Copied {} characters to clipboard", text.len())))
        } else {
            Err(AgentError::ExecutionError(format!(
                "clipboard utility exited with {status}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_browser_requires_url() {
        let result = OpenBrowser.call(json!({})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_open_app_requires_name() {
        let result = OpenApp.call(json!({"name": ""})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_clipboard_requires_text() {
        let result = ClipboardCopy.call(json!({})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }
}
