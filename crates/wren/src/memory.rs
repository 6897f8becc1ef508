//! Ordered conversation history with optional on-disk persistence.

use anyhow::Result;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::models::message::Message;

/// The conversation log for one session.
///
/// The first message, when present, is the system prompt; it survives
/// trimming. A single session owns its memory exclusively.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    messages: Vec<Message>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Install or refresh the system prompt as the first message. Resumed
    /// sessions get the current prompt (and tool manifest) rather than the
    /// one recorded when the session was first created.
    pub fn set_system(&mut self, content: &str) {
        match self.messages.first_mut() {
            Some(first) if first.is_system() => first.content = content.to_string(),
            _ => self.messages.insert(0, Message::system(content)),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Remove and return the most recent message.
    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// An immutable copy of the ordered sequence.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Drop everything except the system prompt.
    pub fn clear(&mut self) {
        self.messages.retain(|m| m.is_system());
    }

    /// Evict the oldest non-system messages until at most `max_turns`
    /// non-system messages remain. The system message and the relative
    /// order of survivors are preserved.
    pub fn trim(&mut self, max_turns: usize) {
        let non_system = self.messages.iter().filter(|m| !m.is_system()).count();
        if non_system <= max_turns {
            return;
        }
        let mut to_evict = non_system - max_turns;
        self.messages.retain(|m| {
            if m.is_system() || to_evict == 0 {
                true
            } else {
                to_evict -= 1;
                false
            }
        });
    }

    /// Load a previously saved session. A missing file is a fresh session;
    /// a corrupt line is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            messages.push(serde_json::from_str::<Message>(&line)?);
        }
        Ok(Self { messages })
    }

    /// Persist the full sequence, one serialized message per line.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for message in &self.messages {
            serde_json::to_writer(&mut writer, message)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}
