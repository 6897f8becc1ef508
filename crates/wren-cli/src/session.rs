//! The interactive read-eval-print loop.

use anyhow::Result;
use std::path::PathBuf;

use wren::agent::Agent;
use wren::memory::Memory;
use wren::models::Role;
use wren::parser::{parse_reply, Reply};

use crate::prompt::{InputType, Prompt};

pub struct Session<P: Prompt> {
    agent: Agent,
    memory: Memory,
    prompt: P,
    session_file: Option<PathBuf>,
}

impl<P: Prompt> Session<P> {
    pub fn new(agent: Agent, memory: Memory, prompt: P, session_file: Option<PathBuf>) -> Self {
        Session {
            agent,
            memory,
            prompt,
            session_file,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if let Some(path) = &self.session_file {
            self.prompt
                .render_note(&format!("Recording to {}", path.display()));
        }

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.process_turn(&content).await;
                    }
                }
                InputType::Clear => {
                    self.memory.clear();
                    self.prompt.render_note("cleared");
                }
                InputType::AskAgain => continue,
                InputType::Exit => break,
            }
        }

        self.persist();
        Ok(())
    }

    /// Run one user turn. Ctrl+C drops the in-flight turn and resets the
    /// conversation to before the interrupted message.
    async fn process_turn(&mut self, user_text: &str) {
        let turn_start = self.memory.len();
        self.prompt.show_busy();

        let outcome = {
            let reply = self.agent.reply(&mut self.memory, user_text);
            tokio::pin!(reply);
            tokio::select! {
                result = &mut reply => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            }
        };
        self.prompt.hide_busy();

        match outcome {
            Some(Ok(answer)) => {
                self.render_trace(turn_start);
                self.prompt.render_answer(&answer);
                self.persist();
            }
            Some(Err(e)) => {
                self.rewind_turn();
                self.prompt.render_note(&format!("error: {e}"));
            }
            None => {
                self.rewind_turn();
                self.prompt
                    .render_note("Interrupted. Conversation reset to before the last message.");
            }
        }
    }

    /// Echo the turn's tool activity from the messages the agent appended.
    fn render_trace(&mut self, turn_start: usize) {
        let messages = self.memory.messages();
        let turn_start = turn_start.min(messages.len());
        for message in &messages[turn_start..] {
            match message.role {
                Role::Assistant => {
                    if let Reply::ToolCall(call) = parse_reply(&message.content) {
                        self.prompt.render_tool_call(&call.name, &call.arguments);
                    }
                }
                Role::Tool => {
                    let name = message.tool_name.as_deref().unwrap_or("tool");
                    self.prompt.render_tool_result(name, &message.content);
                }
                _ => {}
            }
        }
    }

    /// Pop everything back to before the turn's user message.
    fn rewind_turn(&mut self) {
        while let Some(message) = self.memory.pop() {
            if message.role == Role::User {
                break;
            }
        }
    }

    fn persist(&mut self) {
        if let Some(path) = &self.session_file {
            if let Err(e) = self.memory.save(path) {
                self.prompt
                    .render_note(&format!("failed to save session: {e}"));
            }
        }
    }
}
