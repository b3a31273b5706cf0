use thiserror::Error;

/// Errors that can occur in the LLM client
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    /// Transport-level failure from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Backend answered with a non-success status
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response processing error
    #[error("Failed to process response: {0}")]
    ResponseProcessing(String),

    /// No content in response
    #[error("No content in response")]
    NoContent,

    /// Other LLM error
    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while a responder generates an answer
///
/// These never leave [`Responder::generate`](crate::Responder::generate); they are
/// turned into a diagnostic response there.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResponderError {
    /// LLM client error during generation
    #[error("LLM client error: {0}")]
    Llm(#[from] LlmError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The agent loop ran out of steps without producing any answer text
    #[error("Step limit of {0} reached without a final answer")]
    StepLimitExceeded(usize),
}
