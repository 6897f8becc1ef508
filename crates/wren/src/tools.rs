//! Built-in tools the agent can dispatch to.

pub mod calculator;
pub mod desktop;
pub mod docs;
pub mod fs;
pub mod http;
pub mod search;
pub mod shell;
pub mod time;

use std::path::PathBuf;

use crate::errors::{AgentError, AgentResult};
use crate::registry::ToolRegistry;

/// Build the registry with every built-in tool, in a fixed order so the
/// manifest embedded in the system prompt is stable between runs.
pub fn default_registry() -> AgentResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    fs::register(&mut registry)?;
    shell::register(&mut registry)?;
    search::register(&mut registry)?;
    calculator::register(&mut registry)?;
    http::register(&mut registry)?;
    desktop::register(&mut registry)?;
    docs::register(&mut registry)?;
    time::register(&mut registry)?;

    Ok(registry)
}

/// Expand `~` and resolve the argument to a usable path.
pub(crate) fn resolve_path(raw: &str) -> AgentResult<PathBuf> {
    if raw.trim().is_empty() {
        return Err(AgentError::InvalidParameters("empty path".to_string()));
    }
    let expanded = shellexpand::tilde(raw);
    Ok(PathBuf::from(expanded.as_ref()))
}

pub(crate) fn require_str<'a>(args: &'a serde_json::Value, key: &str) -> AgentResult<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AgentError::InvalidParameters(format!("missing '{key}' parameter")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_names_and_order() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "read",
                "write",
                "edit",
                "bash",
                "glob",
                "grep",
                "calculator",
                "http_request",
                "open_browser",
                "open_app",
                "clipboard_copy",
                "create_document",
                "current_time",
            ]
        );
    }

    #[test]
    fn test_resolve_path_expands_tilde() {
        let path = resolve_path("~/notes.txt").unwrap();
        assert!(!path.to_string_lossy().contains('~'));
        assert!(resolve_path("  ").is_err());
    }
}
