/// Unified enum to wrap different provider configurations
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
}

/// Connection settings for an OpenAI-compatible chat completion endpoint.
///
/// `host` is the base URL without the `/v1/chat/completions` suffix, so
/// any compatible endpoint (OpenAI, DeepSeek, a local ollama gateway)
/// works with the same provider.
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<i32>,
}
