//! Shell command execution.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::process::Command;

use super::require_str;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_OUTPUT_BYTES: usize = 10_000;

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "bash",
            "Run a command in a bash shell and return its output. stderr is interleaved with stdout. Use for running programs, tests, and quick inspections.",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The shell command to run"
                    },
                    "timeout_secs": {
                        "type": "integer",
                        "description": "Kill the command after this many seconds (default 60)"
                    }
                },
                "required": ["command"]
            }),
        ),
        Box::new(Bash),
    )
}

struct Bash;

#[async_trait]
impl ToolHandler for Bash {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let command = require_str(&args, "command")?;
        let timeout_secs = args["timeout_secs"].as_u64().unwrap_or(DEFAULT_TIMEOUT_SECS);

        tracing::info!(command, "running shell command");

        // Redirect stderr to stdout to interleave outputs
        let command_with_redirect = format!("{command} 2>&1");

        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            Command::new("bash")
                .arg("-c")
                .arg(&command_with_redirect)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            AgentError::ExecutionError(format!("command timed out after {timeout_secs} seconds"))
        })?
        .map_err(|e| AgentError::ExecutionError(format!("failed to run command: {e}")))?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.len() > MAX_OUTPUT_BYTES {
            let mut end = MAX_OUTPUT_BYTES;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
            text.push_str("\n... [output truncated]");
        }

        let exit_code = output.status.code().unwrap_or(-1);
        Ok(json!(format!("exit code: {exit_code}\n{text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_output_and_exit_code() {
        let result = Bash.call(json!({"command": "echo hello"})).await.unwrap();
        let text = result.as_str().unwrap();
        assert!(text.starts_with("exit code: 0"));
        assert!(text.contains("hello"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_code_reported() {
        let result = Bash.call(json!({"command": "exit 3"})).await.unwrap();
        assert!(result.as_str().unwrap().starts_with("exit code: 3"));
    }

    #[tokio::test]
    async fn test_stderr_interleaved() {
        let result = Bash
            .call(json!({"command": "echo oops 1>&2"}))
            .await
            .unwrap();
        assert!(result.as_str().unwrap().contains("oops"));
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let result = Bash
            .call(json!({"command": "sleep 5", "timeout_secs": 1}))
            .await;
        assert!(matches!(result, Err(AgentError::ExecutionError(_))));
    }

    #[tokio::test]
    async fn test_missing_command_rejected() {
        let result = Bash.call(json!({})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }
}
