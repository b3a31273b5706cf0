//! LLM judge for answer alignment.
//!
//! The judge asks a chat model whether a response agrees with a reference
//! answer and reads a leading `yes`/`no` from its reply. Call failures never
//! escape: they become an [`JudgeOutcome::Unavailable`] verdict that counts as
//! incorrect.
//!
//! # Example
//!
//! ```no_run
//! use finqa_core::{LlmClient};
//! use finqa_eval::{judge_llm_config, Judge, LlmJudge};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = judge_llm_config(std::env::var("OPENAI_API_KEY").ok());
//! let judge = LlmJudge::new(Arc::new(LlmClient::new(config)?));
//!
//! let verdict = judge.judge("4", "The result is 4").await;
//! println!("{} ({})", verdict.is_correct(), verdict.judge_response);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use finqa_core::{ChatBackend, LlmConfig, LlmError, LlmRequest, DEFAULT_OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Judge model used when none is configured.
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4o";

/// Judge sampling temperature.
pub const DEFAULT_JUDGE_TEMPERATURE: f32 = 0.0;

/// Token cap for judge replies.
pub const DEFAULT_JUDGE_MAX_TOKENS: u32 = 300;

/// System instruction for the judge.
pub const JUDGE_SYSTEM_PROMPT: &str =
    "You are a strict evaluator of answer alignment. You must reply with only 'yes' or 'no'.";

/// Render the user message embedding the reference answer and the response.
pub fn judge_user_prompt(reference: &str, response: &str) -> String {
    format!(
        "Given the following reference answer:\n\n\
         \"{reference}\"\n\n\
         And this given response:\n\n\
         \"{response}\"\n\n\
         Does the given response align with and satisfy the reference answer, even if written differently or in a more elaborate, wordy format? \
         Reply strictly with 'yes' or 'no'. \
         You must answer 'yes' if the given response clearly points to the same final answer as the reference, even if it includes additional explanation, steps, or phrasing differences. \
         For mathematical results, you must tolerate small numerical differences caused by rounding; answers that differ by up to ±1 should still be considered correct and marked as 'yes'."
    )
}

/// Backend configuration for the judge: `gpt-4o` on OpenAI, temperature 0, 300 tokens.
pub fn judge_llm_config(api_key: Option<String>) -> LlmConfig {
    let config = LlmConfig::default()
        .with_model(DEFAULT_JUDGE_MODEL)
        .with_base_url(DEFAULT_OPENAI_BASE_URL)
        .with_temperature(DEFAULT_JUDGE_TEMPERATURE)
        .with_max_tokens(DEFAULT_JUDGE_MAX_TOKENS);

    match api_key {
        Some(key) => config.with_api_key(key),
        None => config,
    }
}

/// Whether a judge reply counts as agreement.
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive.
pub fn classify(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with("yes")
}

/// How a judge call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeOutcome {
    /// The judge said the response matches
    Correct,
    /// The judge said it does not
    Incorrect,
    /// The judge could not be reached or gave no reply
    Unavailable,
}

/// A judge's decision on one record.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub outcome: JudgeOutcome,
    /// Trimmed judge reply, or `Error: <details>` when unavailable
    pub judge_response: String,
}

impl JudgeVerdict {
    /// Verdict from a judge reply.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        let outcome = if classify(reply) {
            JudgeOutcome::Correct
        } else {
            JudgeOutcome::Incorrect
        };

        Self {
            outcome,
            judge_response: reply.to_string(),
        }
    }

    /// Verdict for a failed judge call.
    pub fn unavailable(error: impl std::fmt::Display) -> Self {
        Self {
            outcome: JudgeOutcome::Unavailable,
            judge_response: format!("Error: {}", error),
        }
    }

    /// The persisted boolean; unavailable counts as incorrect.
    pub fn is_correct(&self) -> bool {
        self.outcome == JudgeOutcome::Correct
    }
}

/// Decides whether a response matches a reference answer.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge one pair. Never fails; errors become an unavailable verdict.
    async fn judge(&self, reference: &str, response: &str) -> JudgeVerdict;
}

/// Judge backed by a chat model.
pub struct LlmJudge {
    backend: Arc<dyn ChatBackend>,
}

impl LlmJudge {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Build the request sent for one pair.
    pub fn request(reference: &str, response: &str) -> LlmRequest {
        LlmRequest::with_system(judge_user_prompt(reference, response), JUDGE_SYSTEM_PROMPT)
    }

    async fn try_judge(&self, reference: &str, response: &str) -> Result<JudgeVerdict, LlmError> {
        let reply = self.backend.generate(Self::request(reference, response)).await?;
        Ok(JudgeVerdict::from_reply(&reply.text))
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(&self, reference: &str, response: &str) -> JudgeVerdict {
        match self.try_judge(reference, response).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::warn!("Judge call to {} failed: {}", self.backend.model(), e);
                JudgeVerdict::unavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finqa_core::mock_llm::{MockLlmClient, MockStep};
    use rstest::rstest;

    #[rstest]
    #[case::lower("yes", true)]
    #[case::title("Yes", true)]
    #[case::upper("YES", true)]
    #[case::with_reason("yes, because both say 4", true)]
    #[case::padded("  \n Yes.", true)]
    #[case::no("no", false)]
    #[case::no_reason("No, it differs", false)]
    #[case::empty("", false)]
    #[case::hedged("I think yes", false)]
    fn test_classify(#[case] reply: &str, #[case] expected: bool) {
        assert_eq!(classify(reply), expected);
    }

    #[test]
    fn test_user_prompt_embeds_both_answers() {
        let prompt = judge_user_prompt("42", "The answer is 42.");
        assert!(prompt.starts_with("Given the following reference answer:\n\n\"42\"\n\n"));
        assert!(prompt.contains("And this given response:\n\n\"The answer is 42.\"\n\n"));
        assert!(prompt.contains("Reply strictly with 'yes' or 'no'."));
        assert!(prompt.contains("up to ±1"));
    }

    #[test]
    fn test_judge_llm_config_defaults() {
        let config = judge_llm_config(Some("sk-test".into()));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn test_llm_judge_yes() {
        let mock = Arc::new(MockLlmClient::always("  Yes\n"));
        let judge = LlmJudge::new(mock.clone());

        let verdict = judge.judge("4", "The result is 4").await;

        assert_eq!(verdict.outcome, JudgeOutcome::Correct);
        assert!(verdict.is_correct());
        assert_eq!(verdict.judge_response, "Yes");

        let requests = mock.requests();
        assert_eq!(requests[0].system_instruction(), Some(JUDGE_SYSTEM_PROMPT));
        assert!(requests[0].last_user_prompt().unwrap().contains("\"The result is 4\""));
    }

    #[tokio::test]
    async fn test_llm_judge_no() {
        let judge = LlmJudge::new(Arc::new(MockLlmClient::always("No, it differs")));
        let verdict = judge.judge("4", "5").await;
        assert_eq!(verdict.outcome, JudgeOutcome::Incorrect);
        assert_eq!(verdict.judge_response, "No, it differs");
    }

    #[tokio::test]
    async fn test_llm_judge_failure() {
        let mock = MockLlmClient::from_steps(vec![MockStep::fail("rate limited")]);
        let judge = LlmJudge::new(Arc::new(mock));

        let verdict = judge.judge("4", "4").await;

        assert_eq!(verdict.outcome, JudgeOutcome::Unavailable);
        assert!(!verdict.is_correct());
        assert_eq!(verdict.judge_response, "Error: rate limited");
    }
}
