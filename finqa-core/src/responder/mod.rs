//! Responders: turn a question into an answer.
//!
//! ## Available Responders
//!
//! - [`DirectResponder`]: one backend call with a fixed system instruction
//! - [`AgenticResponder`]: bounded tool-use loop that records every invocation
//!
//! Every responder implements [`Responder`]. Its
//! [`generate`](Responder::generate) method never fails: an error from
//! [`try_generate`](Responder::try_generate) is converted into a response
//! starting with [`GENERATION_ERROR_PREFIX`] and an empty trace.

mod agentic;
mod direct;

pub use agentic::{AgentStep, AgenticConfig, AgenticResponder, AGENTIC_SYSTEM_PROMPT};
pub use direct::{DirectResponder, DIRECT_SYSTEM_PROMPT};

use crate::error::ResponderError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of the diagnostic response recorded when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Error during generation: ";

/// One tool invocation made by the agentic responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Tool name as requested by the model
    pub name: String,

    /// Arguments as supplied by the model
    pub arguments: Value,

    /// Observation returned to the model
    pub result: String,

    /// Whether the observation is an error (unknown tool, failed execution)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// Output of a responder for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Final answer text, or a diagnostic when generation failed
    pub response: String,

    /// Tool invocations in issuance order; always empty for direct responders
    pub trace: Vec<TraceEntry>,
}

impl Generation {
    /// A generation with no tool use.
    pub fn answer(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            trace: Vec::new(),
        }
    }

    /// The diagnostic generation recorded for a failure.
    pub fn failed(error: &ResponderError) -> Self {
        Self::answer(format!("{}{}", GENERATION_ERROR_PREFIX, error))
    }

    /// Whether this generation is a failure diagnostic.
    pub fn is_failure(&self) -> bool {
        self.response.starts_with(GENERATION_ERROR_PREFIX)
    }
}

/// Something that answers questions.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short identifier used in logs and default output names.
    fn name(&self) -> &str;

    /// Whether this responder uses tools and records a trace.
    fn is_agentic(&self) -> bool {
        false
    }

    /// Answer a question, reporting failures as errors.
    async fn try_generate(&self, question: &str) -> Result<Generation, ResponderError>;

    /// Answer a question; failures become a diagnostic response with an empty trace.
    async fn generate(&self, question: &str) -> Generation {
        match self.try_generate(question).await {
            Ok(generation) => generation,
            Err(e) => {
                log::warn!("{} responder failed: {}", self.name(), e);
                Generation::failed(&e)
            }
        }
    }
}
