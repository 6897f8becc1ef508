use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write as _;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// Implemented by every local tool the agent can dispatch to.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with already-validated arguments.
    async fn call(&self, arguments: Value) -> AgentResult<Value>;
}

pub struct RegisteredTool {
    pub spec: Tool,
    pub handler: Box<dyn ToolHandler>,
}

/// Ordered mapping from tool name to spec + handler.
///
/// Registration order is preserved so the manifest embedded in the system
/// prompt is stable between runs.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names are unique; a second registration under the same
    /// name is rejected rather than overwriting the first.
    pub fn register(&mut self, spec: Tool, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        if self.entries.iter().any(|entry| entry.spec.name == spec.name) {
            return Err(AgentError::DuplicateTool(spec.name));
        }
        tracing::debug!(tool = %spec.name, "registered tool");
        self.entries.push(RegisteredTool { spec, handler });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> AgentResult<&RegisteredTool> {
        self.entries
            .iter()
            .find(|entry| entry.spec.name == name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.spec.name.as_str()).collect()
    }

    /// Render a human-readable listing of every registered tool, in
    /// registration order, for inclusion in the system prompt.
    pub fn manifest(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let spec = &entry.spec;
            writeln!(out, "Tool: {}", spec.name).unwrap();
            writeln!(out, "Description: {}", spec.description).unwrap();

            let required: Vec<&str> = spec.parameters["required"]
                .as_array()
                .map(|names| names.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();

            if let Some(properties) = spec.parameters["properties"].as_object() {
                if !properties.is_empty() {
                    writeln!(out, "Parameters:").unwrap();
                    for (name, schema) in properties {
                        let kind = schema["type"].as_str().unwrap_or("string");
                        let description = schema["description"].as_str().unwrap_or("");
                        let marker = if required.contains(&name.as_str()) {
                            " (required)"
                        } else {
                            ""
                        };
                        writeln!(out, "  {name} ({kind}): {description}{marker}").unwrap();
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// Check parsed arguments against the tool's declared schema before
    /// dispatch. Arguments must be an object; required properties must be
    /// present; declared properties must carry the declared value kind;
    /// undeclared keys are rejected.
    pub fn validate_arguments(spec: &Tool, arguments: &Value) -> AgentResult<()> {
        let args = arguments.as_object().ok_or_else(|| {
            AgentError::InvalidParameters(format!(
                "arguments for '{}' must be a JSON object",
                spec.name
            ))
        })?;

        let empty = serde_json::Map::new();
        let properties = spec.parameters["properties"].as_object().unwrap_or(&empty);

        if let Some(required) = spec.parameters["required"].as_array() {
            for name in required.iter().filter_map(|v| v.as_str()) {
                if !args.contains_key(name) {
                    return Err(AgentError::InvalidParameters(format!(
                        "'{}' is missing required parameter '{}'",
                        spec.name, name
                    )));
                }
            }
        }

        for (key, value) in args {
            let Some(schema) = properties.get(key) else {
                return Err(AgentError::InvalidParameters(format!(
                    "'{}' does not accept parameter '{}'",
                    spec.name, key
                )));
            };
            let expected = schema["type"].as_str().unwrap_or("string");
            let ok = match expected {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "integer" => value.is_i64() || value.is_u64(),
                "boolean" => value.is_boolean(),
                // schemas in this crate only declare the closed set above
                _ => true,
            };
            if !ok {
                return Err(AgentError::InvalidParameters(format!(
                    "parameter '{}' of '{}' expects {}, got {}",
                    key,
                    spec.name,
                    expected,
                    json_kind(value)
                )));
            }
        }

        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, arguments: Value) -> AgentResult<Value> {
            Ok(arguments)
        }
    }

    fn echo_spec(name: &str) -> Tool {
        Tool::new(
            name,
            "Echo the arguments back",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo"},
                    "count": {"type": "integer", "description": "Repeat count"}
                },
                "required": ["text"]
            }),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_spec("echo"), Box::new(EchoHandler))
            .unwrap();

        assert!(registry.lookup("echo").is_ok());
        assert!(matches!(
            registry.lookup("missing"),
            Err(AgentError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_spec("echo"), Box::new(EchoHandler))
            .unwrap();
        let err = registry
            .register(echo_spec("echo"), Box::new(EchoHandler))
            .unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn test_manifest_is_stable_and_ordered() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_spec("beta"), Box::new(EchoHandler))
            .unwrap();
        registry
            .register(echo_spec("alpha"), Box::new(EchoHandler))
            .unwrap();

        let manifest = registry.manifest();
        let beta = manifest.find("Tool: beta").unwrap();
        let alpha = manifest.find("Tool: alpha").unwrap();
        // registration order, not alphabetical
        assert!(beta < alpha);
        assert!(manifest.contains("text (string): Text to echo (required)"));
        assert_eq!(manifest, registry.manifest());
    }

    #[test]
    fn test_validate_arguments() {
        let spec = echo_spec("echo");

        assert!(ToolRegistry::validate_arguments(&spec, &json!({"text": "hi"})).is_ok());
        assert!(
            ToolRegistry::validate_arguments(&spec, &json!({"text": "hi", "count": 3})).is_ok()
        );

        // missing required
        assert!(ToolRegistry::validate_arguments(&spec, &json!({"count": 3})).is_err());
        // wrong kind
        assert!(ToolRegistry::validate_arguments(&spec, &json!({"text": 42})).is_err());
        // undeclared key
        assert!(
            ToolRegistry::validate_arguments(&spec, &json!({"text": "hi", "extra": true})).is_err()
        );
        // not an object
        assert!(ToolRegistry::validate_arguments(&spec, &json!(["text"])).is_err());
    }
}
