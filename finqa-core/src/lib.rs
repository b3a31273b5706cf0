//! # Finqa Core
//!
//! Backend, responder and tool abstractions for the finqa evaluation harness.
//!
//! ## Architecture
//!
//! - **Backends**: [`ChatBackend`] is the seam to a chat model. [`LlmClient`] speaks the
//!   OpenAI-compatible chat completions protocol (OpenAI, Ollama, vLLM, ...), and
//!   [`MockLlmClient`](mock_llm::MockLlmClient) replays scripted responses for tests.
//! - **Responders**: a [`Responder`] turns a question into a [`Generation`]. The
//!   [`DirectResponder`] makes a single call; the [`AgenticResponder`] runs a bounded
//!   tool-use loop and records every invocation into the trace.
//! - **Tools**: the [`Tool`](tool::Tool) trait and [`ToolRegistry`](tool::ToolRegistry)
//!   form the tool execution environment the agentic responder invokes.
//!
//! ## Example
//!
//! ```no_run
//! use finqa_core::{DirectResponder, LlmClient, LlmConfig, Responder};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = LlmClient::new(LlmConfig::ollama("llama3.1:8b"))?;
//! let responder = DirectResponder::new(Arc::new(llm));
//!
//! // Never fails: backend errors come back as a diagnostic response
//! let generation = responder.generate("What is EBITDA?").await;
//! println!("{}", generation.response);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod mock_llm;
pub mod responder;
pub mod tool;
pub mod utils;

// Re-export public API
pub use config::{LlmConfig, DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL};
pub use error::{LlmError, ResponderError};
pub use llm::{ChatBackend, ChatMessage, LlmClient, LlmRequest, LlmResponse, Role, ToolCall};
pub use responder::{
    AgentStep, AgenticConfig, AgenticResponder, DirectResponder, Generation, Responder,
    TraceEntry, AGENTIC_SYSTEM_PROMPT, DIRECT_SYSTEM_PROMPT, GENERATION_ERROR_PREFIX,
};
pub use utils::{truncate, truncate_with_count};
