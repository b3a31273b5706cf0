use super::{Generation, Responder};
use crate::error::ResponderError;
use crate::llm::{ChatBackend, LlmRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// System instruction for plain chat answering.
pub const DIRECT_SYSTEM_PROMPT: &str =
    "You are a financial assistant that answers user questions clearly and concisely.";

/// Answers with a single backend call and no tool use.
pub struct DirectResponder {
    backend: Arc<dyn ChatBackend>,
}

impl DirectResponder {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Responder for DirectResponder {
    fn name(&self) -> &str {
        "direct"
    }

    async fn try_generate(&self, question: &str) -> Result<Generation, ResponderError> {
        let request = LlmRequest::with_system(question, DIRECT_SYSTEM_PROMPT);
        let response = self.backend.generate(request).await?;
        Ok(Generation::answer(response.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_llm::{MockLlmClient, MockStep};

    #[tokio::test]
    async fn test_direct_sends_system_prompt_and_question() {
        let mock = Arc::new(MockLlmClient::always("Working capital is current assets minus current liabilities."));
        let responder = DirectResponder::new(mock.clone());

        let generation = responder.generate("What is working capital?").await;

        assert!(generation.response.starts_with("Working capital"));
        assert!(generation.trace.is_empty());

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_instruction(), Some(DIRECT_SYSTEM_PROMPT));
        assert_eq!(requests[0].last_user_prompt(), Some("What is working capital?"));
        assert!(requests[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_direct_failure_becomes_diagnostic() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![MockStep::fail("model not loaded")]));
        let responder = DirectResponder::new(mock);

        let generation = responder.generate("What is EBITDA?").await;

        assert_eq!(
            generation.response,
            "Error during generation: LLM client error: model not loaded"
        );
        assert!(generation.trace.is_empty());
    }
}
