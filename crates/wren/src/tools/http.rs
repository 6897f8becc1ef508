//! Plain HTTP fetches for the model.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::require_str;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

const MAX_BODY_BYTES: usize = 20_000;

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "http_request",
            "Make an HTTP GET or POST request and return the status and (truncated) response body.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Full URL including scheme"
                    },
                    "method": {
                        "type": "string",
                        "description": "GET or POST (default GET)"
                    },
                    "body": {
                        "type": "string",
                        "description": "Request body for POST"
                    },
                    "content_type": {
                        "type": "string",
                        "description": "Content-Type header for POST (default application/json)"
                    }
                },
                "required": ["url"]
            }),
        ),
        Box::new(HttpRequest::new()?),
    )
}

struct HttpRequest {
    client: reqwest::Client,
}

impl HttpRequest {
    fn new() -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ToolHandler for HttpRequest {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let url = require_str(&args, "url")?;
        let method = args["method"].as_str().unwrap_or("GET").to_uppercase();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::InvalidParameters(format!(
                "url must start with http:// or https://, got '{url}'"
            )));
        }

        let request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => {
                let body = args["body"].as_str().unwrap_or("").to_string();
                let content_type = args["content_type"].as_str().unwrap_or("application/json");
                self.client
                    .post(url)
                    .header("Content-Type", content_type)
                    .body(body)
            }
            other => {
                return Err(AgentError::InvalidParameters(format!(
                    "unsupported method '{other}'"
                )))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("request failed: {e}")))?;

        let status = response.status();
        let mut body = response
            .text()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("failed to read body: {e}")))?;

        if body.len() > MAX_BODY_BYTES {
            let mut end = MAX_BODY_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
            body.push_str("\n... [body truncated]");
        }

        Ok(json!(format!("status: {status}\n{body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello from server"))
            .mount(&server)
            .await;

        let tool = HttpRequest::new().unwrap();
        let result = tool
            .call(json!({"url": format!("{}/page", server.uri())}))
            .await
            .unwrap();
        let text = result.as_str().unwrap();
        assert!(text.starts_with("status: 200"));
        assert!(text.contains("hello from server"));
    }

    #[tokio::test]
    async fn test_post_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(body_string("{\"ok\":true}"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let tool = HttpRequest::new().unwrap();
        let result = tool
            .call(json!({
                "url": format!("{}/submit", server.uri()),
                "method": "POST",
                "body": "{\"ok\":true}"
            }))
            .await
            .unwrap();
        assert!(result.as_str().unwrap().starts_with("status: 201"));
    }

    #[tokio::test]
    async fn test_bad_scheme_rejected() {
        let tool = HttpRequest::new().unwrap();
        let result = tool.call(json!({"url": "ftp://example.com"})).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_unsupported_method_rejected() {
        let tool = HttpRequest::new().unwrap();
        let result = tool
            .call(json!({"url": "http://example.com", "method": "DELETE"}))
            .await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }
}
