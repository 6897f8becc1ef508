use serde_json::{json, Value};

use super::errors::ProviderError;
use crate::models::message::Message;
use crate::models::role::Role;

/// Convert the internal history to OpenAI's message specification.
///
/// The textual tool protocol does not use the native `tools` field, so
/// tool-result messages are sent back as `user` messages carrying the
/// tool's output, the same shape the model saw when the protocol was
/// introduced in the system prompt.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::Tool => {
                let name = message.tool_name.as_deref().unwrap_or("tool");
                json!({
                    "role": "user",
                    "content": format!("Tool {} returned:\n{}", name, message.content),
                })
            }
            role => json!({
                "role": role.to_string(),
                "content": message.content,
            }),
        })
        .collect()
}

/// Pull the assistant text out of a chat completion response.
pub fn openai_response_to_text(response: &Value) -> Result<String, ProviderError> {
    response["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "no message content in completion: {}",
                truncate(&response.to_string(), 200)
            ))
        })
}

/// Recognize the context-length failure shape OpenAI-compatible endpoints
/// return inside an OK response body.
pub fn check_context_length_error(error: &Value) -> Option<ProviderError> {
    let code = error["code"].as_str().unwrap_or_default();
    let message = error["message"].as_str().unwrap_or_default();
    if code == "context_length_exceeded" || message.contains("maximum context length") {
        Some(ProviderError::ContextLengthExceeded(message.to_string()))
    } else {
        None
    }
}

pub fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_string()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_to_openai_spec_roles() {
        let messages = vec![
            Message::user("hello"),
            Message::assistant("TOOL: bash\nARGS: {}"),
            Message::tool("bash", "exit 0"),
        ];
        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 3);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[1]["role"], "assistant");
        // tool results ride back as user messages on the wire
        assert_eq!(spec[2]["role"], "user");
        assert_eq!(spec[2]["content"], "Tool bash returned:\nexit 0");
    }

    #[test]
    fn test_response_text_extraction() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
        });
        assert_eq!(openai_response_to_text(&response).unwrap(), "hi there");

        let empty = json!({"choices": []});
        assert!(matches!(
            openai_response_to_text(&empty),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_context_length_error_detection() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This model's maximum context length is 128000 tokens"
        });
        assert!(matches!(
            check_context_length_error(&error),
            Some(ProviderError::ContextLengthExceeded(_))
        ));

        let other = json!({"code": "server_error", "message": "boom"});
        assert!(check_context_length_error(&other).is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let truncated = truncate("héllo wörld", 6);
        assert!(truncated.ends_with('…'));
    }
}
