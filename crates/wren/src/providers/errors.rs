use thiserror::Error;

/// Failures raised by the LLM endpoint or the transport underneath it.
///
/// The agent loop collapses these into one decision: retryable errors are
/// retried with backoff a bounded number of times, everything else aborts
/// the current turn and surfaces to the CLI.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by the provider: {0}")]
    RateLimit(String),

    #[error("Server error from the provider: {0}")]
    Server(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),

    #[error("Provider API error: {0}")]
    Api(String),
}

impl ProviderError {
    /// Transient failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_) | ProviderError::Server(_) | ProviderError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimit("slow down".into()).is_retryable());
        assert!(ProviderError::Server("502".into()).is_retryable());

        assert!(!ProviderError::Auth("bad key".into()).is_retryable());
        assert!(!ProviderError::Configuration("no key".into()).is_retryable());
        assert!(!ProviderError::ContextLengthExceeded("too long".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("no choices".into()).is_retryable());
    }
}
