use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{Provider, Usage};
use super::errors::ProviderError;
use crate::models::message::Message;

/// A provider that replays pre-configured responses, for driving the agent
/// loop deterministically in tests.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Message>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A provider that repeats the same reply forever.
    pub fn repeating(reply: &str) -> RepeatingProvider {
        RepeatingProvider {
            reply: reply.to_string(),
        }
    }

    /// A provider whose every call fails with the produced error.
    pub fn failing(make_error: fn() -> ProviderError) -> FailingProvider {
        FailingProvider { make_error }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
    ) -> Result<(Message, Usage), ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok((Message::assistant(""), Usage::default()))
        } else {
            Ok((responses.remove(0), Usage::default()))
        }
    }
}

pub struct RepeatingProvider {
    reply: String,
}

#[async_trait]
impl Provider for RepeatingProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
    ) -> Result<(Message, Usage), ProviderError> {
        Ok((Message::assistant(self.reply.clone()), Usage::default()))
    }
}

pub struct FailingProvider {
    make_error: fn() -> ProviderError,
}

#[async_trait]
impl Provider for FailingProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
    ) -> Result<(Message, Usage), ProviderError> {
        Err((self.make_error)())
    }
}
