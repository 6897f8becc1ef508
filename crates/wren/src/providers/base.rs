use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ProviderError;
use crate::models::message::Message;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Base trait for chat-completion providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for the given history.
    ///
    /// `system` is sent as the first message on the wire; `messages` is the
    /// rest of the conversation in chronological order.
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
    ) -> Result<(Message, Usage), ProviderError>;
}
