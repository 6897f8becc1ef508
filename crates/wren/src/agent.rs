//! The agent loop: model call, tool-call parse, dispatch, repeat.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{AgentError, AgentResult};
use crate::memory::Memory;
use crate::models::message::Message;
use crate::models::tool::ToolCall;
use crate::parser::{parse_reply, Reply};
use crate::prompt_template::render_prompt_file;
use crate::providers::base::Provider;
use crate::providers::errors::ProviderError;
use crate::reflector::Reflector;
use crate::registry::ToolRegistry;

const RETRY_BASE_DELAY_MS: u64 = 500;

/// Agent ties a chat-completion provider to the local tool registry.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    system_prompt: String,
    max_tool_iterations: usize,
    max_retries: usize,
    history_max_turns: usize,
    reflect: bool,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider>,
        registry: ToolRegistry,
        config: &Config,
    ) -> AgentResult<Self> {
        let system_prompt = build_system_prompt(&registry, config.system_prompt.as_deref())?;
        Ok(Self {
            provider,
            registry,
            system_prompt,
            max_tool_iterations: config.max_tool_iterations,
            max_retries: config.max_retries,
            history_max_turns: config.history_max_turns,
            reflect: config.enable_reflection,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Process one user turn to completion and return the final answer.
    ///
    /// Tool and parse failures stay inside the loop as error-bearing tool
    /// messages; only persistent provider failures escape to the caller.
    pub async fn reply(
        &self,
        memory: &mut Memory,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        memory.set_system(&self.system_prompt);
        memory.append(Message::user(user_text));

        let mut last_assistant_text = String::new();

        for round in 0..self.max_tool_iterations {
            tracing::debug!(round = round + 1, max = self.max_tool_iterations, "model call");
            let reply = self.complete_with_retry(memory).await?;

            match parse_reply(&reply.content) {
                Reply::Final(text) => {
                    let answer = if self.reflect {
                        Reflector::refine(self.provider.as_ref(), memory.messages(), &text).await
                    } else {
                        text
                    };
                    memory.append(Message::assistant(answer.clone()));
                    memory.trim(self.history_max_turns);
                    return Ok(answer);
                }
                Reply::ToolCall(call) => {
                    tracing::info!(tool = %call.name, "tool call requested");
                    last_assistant_text = reply.content.clone();
                    memory.append(Message::assistant(reply.content));

                    let tool_message = match self.dispatch(&call).await {
                        Ok(output) => Message::tool(&call.name, output),
                        Err(e) => {
                            tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                            Message::tool(&call.name, format!("Error: {e}"))
                        }
                    };
                    memory.append(tool_message);
                }
                Reply::Malformed { name, detail } => {
                    tracing::warn!(tool = %name, detail = %detail, "malformed tool call");
                    last_assistant_text = reply.content.clone();
                    memory.append(Message::assistant(reply.content));
                    memory.append(Message::tool(
                        &name,
                        format!(
                            "Error: {detail}. Reply with the two-line format: \
                             TOOL: <name> then ARGS: <one JSON object>."
                        ),
                    ));
                }
            }
        }

        // Iteration cap reached; close the turn with what we have.
        let mut answer = format!(
            "Reached the tool iteration limit ({}) without completing the task.",
            self.max_tool_iterations
        );
        if !last_assistant_text.is_empty() {
            answer.push_str("\n\nLast progress:\n");
            answer.push_str(&last_assistant_text);
        }
        memory.append(Message::assistant(answer.clone()));
        memory.trim(self.history_max_turns);
        Ok(answer)
    }

    /// Look up, validate, and execute one tool call. Every failure is
    /// returned as an error value, never propagated as a panic.
    async fn dispatch(&self, call: &ToolCall) -> AgentResult<String> {
        let entry = self.registry.lookup(&call.name)?;
        ToolRegistry::validate_arguments(&entry.spec, &call.arguments)?;
        let output = entry.handler.call(call.arguments.clone()).await?;
        Ok(render_tool_output(&output))
    }

    async fn complete_with_retry(&self, memory: &Memory) -> Result<Message, ProviderError> {
        // the system prompt is memory[0]; the provider sends it separately
        let messages: Vec<Message> = memory
            .messages()
            .iter()
            .filter(|m| !m.is_system())
            .cloned()
            .collect();

        let mut attempt = 0;
        loop {
            match self.provider.complete(&self.system_prompt, &messages).await {
                Ok((message, usage)) => {
                    tracing::debug!(
                        input_tokens = ?usage.input_tokens,
                        output_tokens = ?usage.output_tokens,
                        "completion received"
                    );
                    return Ok(message);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                    tracing::warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "retrying provider call");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn build_system_prompt(
    registry: &ToolRegistry,
    override_prompt: Option<&str>,
) -> AgentResult<String> {
    let manifest = registry.manifest();
    match override_prompt {
        // a custom prompt still gets the manifest so the protocol works
        Some(text) => Ok(format!(
            "{}\n\nAvailable Tools:\n{}",
            text.trim_end(),
            manifest
        )),
        None => {
            let mut context = HashMap::new();
            context.insert("manifest", manifest);
            render_prompt_file("system.md", &context)
                .map_err(|e| AgentError::Internal(e.to_string()))
        }
    }
}

fn render_tool_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
