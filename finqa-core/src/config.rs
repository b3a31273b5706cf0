use std::time::Duration;

/// Base URL of a local Ollama server's OpenAI-compatible API.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Base URL of the OpenAI API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for a chat backend
///
/// One config describes one model on one endpoint. The responder and the
/// judge each get their own.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmConfig {
    /// Model identifier sent with every request (e.g. `llama3.1:8b`, `gpt-4o`)
    pub model: String,

    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix
    ///
    /// Default: [`DEFAULT_OLLAMA_BASE_URL`]
    pub base_url: String,

    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,

    /// Maximum tokens per request
    ///
    /// Default: 2048
    pub max_tokens: u32,

    /// Temperature for generation (0.0 - 2.0)
    ///
    /// Default: 0.7
    pub temperature: f32,

    /// Timeout for individual requests
    ///
    /// Default: 120 seconds
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1".to_string(),
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            api_key: None,
            max_tokens: 2048,
            temperature: 0.7,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LlmConfig {
    /// Config for a model served by a local Ollama instance.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Config for an OpenAI-hosted model.
    pub fn openai(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the maximum tokens per request.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature for generation.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the timeout for individual requests.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the chat completions endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
