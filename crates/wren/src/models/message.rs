use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::role::Role;

/// A message to or from the model.
///
/// Tool results travel through the conversation as `Role::Tool` messages
/// carrying the producing tool's name; everything else is plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message with the current timestamp
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool-result message attributed to the named tool
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Tool, content);
        message.tool_name = Some(tool_name.into());
        message
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_role() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);

        let tool = Message::tool("bash", "exit 0");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_name.as_deref(), Some("bash"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let message = Message::tool("read", "file contents");
        let serialized = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, deserialized);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let message = Message::assistant("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        // tool_name is omitted entirely for non-tool messages
        assert!(value.get("tool_name").is_none());
    }
}
