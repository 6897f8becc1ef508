//! Clock access.

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use crate::errors::AgentResult;
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "current_time",
            "Get the current local date and time.",
            json!({
                "type": "object",
                "properties": {}
            }),
        ),
        Box::new(CurrentTime),
    )
}

struct CurrentTime;

#[async_trait]
impl ToolHandler for CurrentTime {
    async fn call(&self, _args: Value) -> AgentResult<Value> {
        let now = Local::now();
        Ok(json!({
            "iso": now.to_rfc3339(),
            "formatted": now.format("%Y-%m-%d %H:%M:%S").to_string(),
            "weekday": now.format("%A").to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_the_clock() {
        let result = CurrentTime.call(json!({})).await.unwrap();
        let formatted = result["formatted"].as_str().unwrap();
        assert_eq!(formatted.len(), 19);
        assert!(result["iso"].as_str().unwrap().contains('T'));
        assert!(!result["weekday"].as_str().unwrap().is_empty());
    }
}
