//! Chat backend abstraction and the OpenAI-compatible HTTP client.
//!
//! Provides:
//! - [`ChatBackend`]: the seam responders and judges call through
//! - [`LlmClient`]: `reqwest` client for `POST {base_url}/chat/completions`,
//!   which covers OpenAI as well as Ollama's `/v1` endpoint
//! - Request/response types with tool-call support
//!
//! # Example
//!
//! ```no_run
//! use finqa_core::{LlmClient, LlmConfig, LlmRequest};
//!
//! # async fn example() -> Result<(), finqa_core::LlmError> {
//! let client = LlmClient::new(LlmConfig::ollama("llama3.1:8b"))?;
//!
//! let request = LlmRequest::with_system("What is working capital?", "Be concise.");
//! let response = client.generate(request).await?;
//!
//! println!("Response: {}", response.text);
//! # Ok(())
//! # }
//! ```

mod client;
mod request;

pub use client::{parse_response, LlmClient};
pub use request::{ChatMessage, LlmRequest, LlmResponse, Role, ToolCall};

use crate::error::LlmError;
use async_trait::async_trait;
use std::sync::Arc;

/// A chat model that answers one request at a time.
///
/// Implemented by [`LlmClient`] for real endpoints and by
/// [`MockLlmClient`](crate::mock_llm::MockLlmClient) for tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a request and return the buffered response.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model identifier, for logs and reports.
    fn model(&self) -> &str;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).generate(request).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
