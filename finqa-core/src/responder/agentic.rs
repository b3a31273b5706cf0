//! Agentic responder: a bounded tool-use loop.
//!
//! Each step sends the conversation so far plus the tool declarations. If the
//! model answers with tool calls, every call is executed through the
//! [`ToolRegistry`], its observation is appended to the conversation and to
//! the trace, and the loop continues. A reply without tool calls is the final
//! answer.

use super::{Generation, Responder, TraceEntry};
use crate::error::ResponderError;
use crate::llm::{ChatBackend, ChatMessage, LlmRequest};
use crate::tool::{ToolRegistry, ToolSet};
use crate::utils::truncate;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::{pin_mut, Stream, StreamExt};
use std::sync::Arc;

/// System instruction that routes all arithmetic through the code interpreter.
pub const AGENTIC_SYSTEM_PROMPT: &str = "You are a financial assistant that answers user questions using available tools.
For any question that involves mathematical calculations, no matter how simple, you must always use the code interpreter to perform the computation.
Do not perform math in your head or directly in the response. All calculations must go through the code interpreter.";

/// Configuration for the agentic responder
#[derive(Debug, Clone)]
pub struct AgenticConfig {
    /// Maximum number of model calls per question
    ///
    /// Default: 10
    pub max_steps: usize,

    /// System instruction sent first in every conversation
    pub system_prompt: String,

    /// Which registered tools are offered to the model
    ///
    /// Default: all
    pub tool_set: ToolSet,
}

impl Default for AgenticConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            system_prompt: AGENTIC_SYSTEM_PROMPT.to_string(),
            tool_set: ToolSet::All,
        }
    }
}

impl AgenticConfig {
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_tool_set(mut self, tool_set: ToolSet) -> Self {
        self.tool_set = tool_set;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ResponderError> {
        let mut errors = Vec::new();

        if self.max_steps == 0 {
            errors.push("max_steps must be greater than 0");
        }

        if self.system_prompt.trim().is_empty() {
            errors.push("system_prompt cannot be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResponderError::InvalidConfig(errors.join("; ")))
        }
    }
}

/// Progress of one agentic run
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    /// A tool was executed; the entry is what goes into the trace
    ToolInvoked(TraceEntry),

    /// The model answered without requesting tools
    Final(String),

    /// The step budget ran out; carries the most recent non-empty model text
    StepLimitReached { last_text: Option<String> },
}

/// Answers through a bounded tool-use loop.
pub struct AgenticResponder {
    backend: Arc<dyn ChatBackend>,
    registry: Arc<ToolRegistry>,
    config: AgenticConfig,
}

impl AgenticResponder {
    /// Create a new agentic responder.
    ///
    /// # Errors
    ///
    /// Returns `ResponderError::InvalidConfig` if the configuration is invalid.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        registry: Arc<ToolRegistry>,
        config: AgenticConfig,
    ) -> Result<Self, ResponderError> {
        config.validate()?;
        if registry.filter(&config.tool_set).is_empty() {
            log::warn!("Agentic responder has no tools available; answers will come straight from the model");
        }
        Ok(Self {
            backend,
            registry,
            config,
        })
    }

    pub fn config(&self) -> &AgenticConfig {
        &self.config
    }

    /// Run the tool-use loop for one question.
    ///
    /// Yields one [`AgentStep::ToolInvoked`] per executed tool call, then
    /// exactly one of [`AgentStep::Final`] or [`AgentStep::StepLimitReached`].
    /// A backend failure ends the stream with an error.
    pub fn execute(
        &self,
        question: &str,
    ) -> impl Stream<Item = Result<AgentStep, ResponderError>> + Send + '_ {
        let question = question.to_string();

        try_stream! {
            let declarations = self.registry.declarations(&self.config.tool_set);
            let mut messages = vec![
                ChatMessage::system(&self.config.system_prompt),
                ChatMessage::user(question),
            ];
            let mut last_text: Option<String> = None;

            for step in 1..=self.config.max_steps {
                let request = LlmRequest::from_messages(messages.clone())
                    .with_tools(declarations.clone());

                let response = self
                    .backend
                    .generate(request)
                    .await
                    .map_err(ResponderError::from)?;

                if !response.text.trim().is_empty() {
                    last_text = Some(response.text.clone());
                }

                if !response.has_tool_calls() {
                    log::debug!("Agent finished after {} step(s)", step);
                    yield AgentStep::Final(response.text);
                    return;
                }

                messages.push(ChatMessage::assistant(
                    response.text.clone(),
                    response.tool_calls.clone(),
                ));

                for call in response.tool_calls {
                    let (result, is_error) =
                        match self.registry.invoke(&call.name, call.arguments.clone()).await {
                            Ok(output) => (output.content, false),
                            Err(e) => (format!("Error: {}", e), true),
                        };

                    log::debug!(
                        "Step {}: {} -> {}",
                        step,
                        call.name,
                        truncate(&result, 120)
                    );

                    messages.push(ChatMessage::tool_result(&call.id, &result));

                    yield AgentStep::ToolInvoked(TraceEntry {
                        name: call.name,
                        arguments: call.arguments,
                        result,
                        is_error,
                    });
                }
            }

            log::warn!(
                "Agent reached the step limit of {} without a final answer",
                self.config.max_steps
            );
            yield AgentStep::StepLimitReached { last_text };
        }
    }
}

#[async_trait]
impl Responder for AgenticResponder {
    fn name(&self) -> &str {
        "agentic"
    }

    fn is_agentic(&self) -> bool {
        true
    }

    async fn try_generate(&self, question: &str) -> Result<Generation, ResponderError> {
        let stream = self.execute(question);
        pin_mut!(stream);

        let mut trace = Vec::new();
        while let Some(step) = stream.next().await {
            match step? {
                AgentStep::ToolInvoked(entry) => trace.push(entry),
                AgentStep::Final(response) => return Ok(Generation { response, trace }),
                AgentStep::StepLimitReached {
                    last_text: Some(response),
                } => return Ok(Generation { response, trace }),
                AgentStep::StepLimitReached { last_text: None } => {
                    let error = ResponderError::StepLimitExceeded(self.config.max_steps);
                    return Ok(Generation {
                        trace,
                        ..Generation::failed(&error)
                    });
                }
            }
        }

        // The stream always ends with a terminal step unless it errored
        Err(ResponderError::StepLimitExceeded(self.config.max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, Role, ToolCall};
    use crate::mock_llm::{MockLlmClient, MockStep};
    use crate::tool::{Tool, ToolError, ToolResult};
    use serde_json::{json, Value};

    #[derive(Debug)]
    struct Adder;

    #[async_trait]
    impl Tool for Adder {
        fn name(&self) -> &str {
            "add"
        }

        fn description(&self) -> &str {
            "Adds a and b"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"]
            })
        }

        async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
            let a = input["a"]
                .as_f64()
                .ok_or_else(|| ToolError::InvalidInput("a must be a number".into()))?;
            let b = input["b"]
                .as_f64()
                .ok_or_else(|| ToolError::InvalidInput("b must be a number".into()))?;
            Ok(ToolResult::new(format!("{}", a + b)))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Adder);
        Arc::new(registry)
    }

    fn call(id: &str, name: &str, args: Value) -> MockStep {
        MockStep::Respond(LlmResponse::tool_calls(
            "",
            vec![ToolCall::new(id, name, args)],
        ))
    }

    #[test]
    fn test_config_validation() {
        assert!(AgenticConfig::default().validate().is_ok());
        let err = AgenticConfig::default()
            .with_max_steps(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_steps"));
    }

    #[tokio::test]
    async fn test_tool_then_final_answer() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            call("c1", "add", json!({"a": 2, "b": 2})),
            MockStep::text("The result is 4"),
        ]));
        let responder =
            AgenticResponder::new(mock.clone(), registry(), AgenticConfig::default()).unwrap();

        let generation = responder.generate("What is 2+2?").await;

        assert_eq!(generation.response, "The result is 4");
        assert_eq!(generation.trace.len(), 1);
        assert_eq!(generation.trace[0].name, "add");
        assert_eq!(generation.trace[0].result, "4");
        assert!(!generation.trace[0].is_error);

        // Second request carries the tool call and its observation
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system_instruction(), Some(AGENTIC_SYSTEM_PROMPT));
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(1));
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(last.content, "4");
    }

    #[tokio::test]
    async fn test_tool_set_limits_declarations() {
        let mock = Arc::new(MockLlmClient::always("No tools needed."));
        let config =
            AgenticConfig::default().with_tool_set(ToolSet::Specific(vec!["subtract".into()]));
        let responder = AgenticResponder::new(mock.clone(), registry(), config).unwrap();

        responder.generate("What is liquidity?").await;

        assert!(mock.requests()[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_trace_preserves_issuance_order() {
        let both = LlmResponse::tool_calls(
            "",
            vec![
                ToolCall::new("c1", "add", json!({"a": 1, "b": 1})),
                ToolCall::new("c2", "add", json!({"a": 10, "b": 5})),
            ],
        );
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            MockStep::Respond(both),
            MockStep::text("2 and 15"),
        ]));
        let responder = AgenticResponder::new(mock, registry(), AgenticConfig::default()).unwrap();

        let generation = responder.generate("q").await;

        let results: Vec<_> = generation.trace.iter().map(|t| t.result.as_str()).collect();
        assert_eq!(results, vec!["2", "15"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recorded_and_loop_continues() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            call("c1", "web_search", json!({"query": "rates"})),
            MockStep::text("I could not search."),
        ]));
        let responder = AgenticResponder::new(mock, registry(), AgenticConfig::default()).unwrap();

        let generation = responder.generate("q").await;

        assert_eq!(generation.response, "I could not search.");
        assert_eq!(generation.trace.len(), 1);
        assert!(generation.trace[0].is_error);
        assert!(generation.trace[0].result.starts_with("Error: Tool not found"));
    }

    #[tokio::test]
    async fn test_tool_error_is_observation() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            call("c1", "add", json!({"a": "two", "b": 2})),
            MockStep::text("done"),
        ]));
        let responder = AgenticResponder::new(mock, registry(), AgenticConfig::default()).unwrap();

        let generation = responder.generate("q").await;

        assert_eq!(generation.trace[0].result, "Error: Invalid input: a must be a number");
        assert_eq!(generation.response, "done");
    }

    #[tokio::test]
    async fn test_step_limit_returns_last_text() {
        let looping = MockStep::Respond(LlmResponse::tool_calls(
            "Let me compute that.",
            vec![ToolCall::new("c", "add", json!({"a": 1, "b": 2}))],
        ));
        let mock = Arc::new(MockLlmClient::from_steps(vec![]).with_fallback(looping));
        let config = AgenticConfig::default().with_max_steps(3);
        let responder = AgenticResponder::new(mock.clone(), registry(), config).unwrap();

        let generation = responder.generate("q").await;

        assert_eq!(generation.response, "Let me compute that.");
        assert_eq!(generation.trace.len(), 3);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_step_limit_without_text_yields_sentinel() {
        let mock = Arc::new(
            MockLlmClient::from_steps(vec![]).with_fallback(call("c", "add", json!({"a": 1, "b": 2}))),
        );
        let config = AgenticConfig::default().with_max_steps(2);
        let responder = AgenticResponder::new(mock, registry(), config).unwrap();

        let generation = responder.generate("q").await;

        assert!(generation.is_failure());
        assert!(generation.response.contains("Step limit of 2"));
        assert_eq!(generation.trace.len(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_mid_loop_drops_trace() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            call("c1", "add", json!({"a": 1, "b": 1})),
            MockStep::fail("503 Service Unavailable"),
        ]));
        let responder = AgenticResponder::new(mock, registry(), AgenticConfig::default()).unwrap();

        let generation = responder.generate("q").await;

        assert!(generation.is_failure());
        assert!(generation.response.contains("503 Service Unavailable"));
        assert!(generation.trace.is_empty());
    }

    #[tokio::test]
    async fn test_execute_stream_events() {
        let mock = Arc::new(MockLlmClient::from_steps(vec![
            call("c1", "add", json!({"a": 3, "b": 4})),
            MockStep::text("7"),
        ]));
        let responder = AgenticResponder::new(mock, registry(), AgenticConfig::default()).unwrap();

        let steps: Vec<AgentStep> = responder
            .execute("q")
            .map(|s| s.unwrap())
            .collect()
            .await;

        assert_eq!(steps.len(), 2);
        assert!(matches!(&steps[0], AgentStep::ToolInvoked(e) if e.result == "7"));
        assert_eq!(steps[1], AgentStep::Final("7".into()));
    }
}
