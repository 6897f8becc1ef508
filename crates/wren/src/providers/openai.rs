use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::errors::ProviderError;
use super::utils::{check_context_length_error, messages_to_openai_spec, openai_response_to_text};
use crate::models::message::Message;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration("API key is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = &data["usage"];

        let input_tokens = usage["prompt_tokens"].as_i64().map(|v| v as i32);
        let output_tokens = usage["completion_tokens"].as_i64().map(|v| v as i32);
        let total_tokens = usage["total_tokens"]
            .as_i64()
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value, ProviderError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Auth(format!(
                "endpoint rejected credentials: {status}"
            ))),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(ProviderError::RateLimit(format!("status {status}")))
            }
            status if status.as_u16() >= 500 => {
                Err(ProviderError::Server(format!("status {status}")))
            }
            status => Err(ProviderError::Api(format!(
                "request failed with status {status}"
            ))),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
    ) -> Result<(Message, Usage), ProviderError> {
        let system_message = json!({
            "role": "system",
            "content": system
        });

        let mut messages_array = vec![system_message];
        messages_array.extend(messages_to_openai_spec(messages));

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_array
        });

        let body = payload.as_object_mut().unwrap();
        if let Some(temp) = self.config.temperature {
            body.insert("temperature".to_string(), json!(temp));
        }
        if let Some(top_p) = self.config.top_p {
            body.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(tokens) = self.config.max_tokens {
            body.insert("max_tokens".to_string(), json!(tokens));
        }

        tracing::debug!(model = %self.config.model, messages = messages.len(), "chat completion request");
        let response = self.post(payload).await?;

        // Some endpoints report failures in an OK body
        if let Some(error) = response.get("error") {
            if let Some(err) = check_context_length_error(error) {
                return Err(err);
            }
            return Err(ProviderError::Api(error.to_string()));
        }

        let text = openai_response_to_text(&response)?;
        let usage = Self::get_usage(&response);

        Ok((Message::assistant(text), usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(host: String) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.7),
            top_p: None,
            max_tokens: None,
        }
    }

    async fn setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body)).await;

        let (message, usage) = provider
            .complete("You are a helpful assistant.", &[Message::user("hi")])
            .await
            .unwrap();

        assert_eq!(message.content, "Hello! How can I assist you today?");
        assert_eq!(usage.total_tokens, Some(27));
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retryable() {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(401)).await;

        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_rate_limit_and_server_errors_are_retryable() {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(429)).await;
        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimit(_)));
        assert!(err.is_retryable());

        let (_server, provider) = setup_mock_server(ResponseTemplate::new(503)).await;
        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Server(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_context_length_error_in_ok_body() {
        let response_body = json!({
            "error": {
                "code": "context_length_exceeded",
                "message": "This model's maximum context length is 8192 tokens"
            }
        });
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body)).await;

        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ContextLengthExceeded(_)));
    }

    #[tokio::test]
    async fn test_missing_choices_is_invalid_response() {
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
                .await;

        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let mut config = test_config("http://localhost".to_string());
        config.api_key = String::new();
        assert!(matches!(
            OpenAiProvider::new(config),
            Err(ProviderError::Configuration(_))
        ));
    }
}
