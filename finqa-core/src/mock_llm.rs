//! Scripted chat backend for tests
//!
//! [`MockLlmClient`] replays a fixed sequence of responses, one per call,
//! enabling:
//!
//! - **Offline testing**: run responders and judges without API calls
//! - **Deterministic testing**: exact response sequences, including failures
//!
//! # Example
//!
//! ```
//! use finqa_core::mock_llm::MockLlmClient;
//! use finqa_core::{ChatBackend, LlmRequest};
//!
//! # async fn example() -> Result<(), finqa_core::LlmError> {
//! let mock = MockLlmClient::always("yes");
//! let response = mock.generate(LlmRequest::new("Does it align?")).await?;
//! assert_eq!(response.text, "yes");
//! # Ok(())
//! # }
//! ```

use crate::error::LlmError;
use crate::llm::{ChatBackend, LlmRequest, LlmResponse};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Return this response
    Respond(LlmResponse),
    /// Fail with `LlmError::Other` carrying this message
    Fail(String),
}

impl MockStep {
    /// A plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        MockStep::Respond(LlmResponse::text(text))
    }

    /// A failure.
    pub fn fail(message: impl Into<String>) -> Self {
        MockStep::Fail(message.into())
    }
}

impl From<LlmResponse> for MockStep {
    fn from(response: LlmResponse) -> Self {
        MockStep::Respond(response)
    }
}

/// Mock backend that replays scripted steps
///
/// The mock advances through its steps sequentially; each call to
/// [`generate`](ChatBackend::generate) consumes the next one. Once the
/// script is exhausted it returns the fallback step if one is set, else
/// `LlmError::NoContent`.
#[derive(Debug)]
pub struct MockLlmClient {
    /// Scripted steps to replay
    steps: Vec<MockStep>,

    /// Returned for every call after the script runs out
    fallback: Option<MockStep>,

    /// Current step index
    current_index: AtomicUsize,

    /// Model name reported to callers
    model: String,

    /// Every request received, in arrival order
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Create a mock that replays these steps in order.
    pub fn from_steps(steps: Vec<MockStep>) -> Self {
        Self {
            steps,
            fallback: None,
            current_index: AtomicUsize::new(0),
            model: "mock".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers every call with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::from_steps(Vec::new()).with_fallback(MockStep::text(text))
    }

    /// Create a mock that fails every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_steps(Vec::new()).with_fallback(MockStep::fail(message))
    }

    /// Set the step returned once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, step: MockStep) -> Self {
        self.fallback = Some(step);
        self
    }

    /// Set the reported model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.current_index.load(Ordering::SeqCst)
    }

    /// Check if all scripted steps have been consumed
    pub fn is_exhausted(&self) -> bool {
        self.call_count() >= self.steps.len()
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn next_step(&self) -> Option<MockStep> {
        let index = self.current_index.fetch_add(1, Ordering::SeqCst);
        self.steps
            .get(index)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ChatBackend for MockLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        // Validate request (same as real client)
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "Request must contain at least one message".to_string(),
            ));
        }

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let step = self.next_step();

        match step {
            Some(MockStep::Respond(response)) => Ok(response),
            Some(MockStep::Fail(message)) => Err(LlmError::Other(message)),
            None => Err(LlmError::NoContent),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_steps_in_order() {
        let mock = MockLlmClient::from_steps(vec![MockStep::text("one"), MockStep::text("two")]);

        let first = mock.generate(LlmRequest::new("a")).await.unwrap();
        let second = mock.generate(LlmRequest::new("b")).await.unwrap();

        assert_eq!(first.text, "one");
        assert_eq!(second.text, "two");
        assert!(mock.is_exhausted());
        assert!(matches!(
            mock.generate(LlmRequest::new("c")).await,
            Err(LlmError::NoContent)
        ));
    }

    #[tokio::test]
    async fn test_fail_step() {
        let mock = MockLlmClient::from_steps(vec![MockStep::fail("connection refused")]);
        let err = mock.generate(LlmRequest::new("a")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_always_and_request_recording() {
        let mock = MockLlmClient::always("yes").with_model("judge");

        for prompt in ["x", "y", "z"] {
            assert_eq!(mock.generate(LlmRequest::new(prompt)).await.unwrap().text, "yes");
        }

        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.model(), "judge");
        let prompts: Vec<_> = mock
            .requests()
            .iter()
            .filter_map(|r| r.last_user_prompt().map(str::to_string))
            .collect();
        assert_eq!(prompts, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_rejects_empty_request() {
        let mock = MockLlmClient::always("yes");
        let result = mock.generate(LlmRequest::from_messages(vec![])).await;
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
        assert_eq!(mock.call_count(), 0);
    }
}
