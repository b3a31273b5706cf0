//! LLM request and response types.
//!
//! These mirror the OpenAI chat completions wire format closely enough that
//! [`ChatMessage::to_wire`] is a direct mapping, while staying independent of
//! any particular client library.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Backend-assigned call id, echoed back with the tool result
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as parsed JSON
    ///
    /// If the model emitted arguments that are not valid JSON, the raw text is
    /// kept as a JSON string so the tool can reject it with a useful message.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One message in a chat conversation
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by an assistant message
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the id of the call this result answers
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// An assistant turn, optionally carrying tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// The result of executing a tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }

    /// Serialize to the chat completions message format.
    pub fn to_wire(&self) -> Value {
        let mut message = json!({
            "role": self.role,
            "content": self.content,
        });

        if !self.tool_calls.is_empty() {
            let calls: Vec<Value> = self
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            // The protocol carries arguments as a JSON-encoded string
                            "arguments": match &call.arguments {
                                Value::String(raw) => raw.clone(),
                                other => other.to_string(),
                            },
                        }
                    })
                })
                .collect();
            message["tool_calls"] = Value::Array(calls);
        }

        if let Some(id) = &self.tool_call_id {
            message["tool_call_id"] = Value::String(id.clone());
        }

        message
    }
}

/// Request to the LLM
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct LlmRequest {
    /// Ordered conversation, system instruction first when present
    pub messages: Vec<ChatMessage>,

    /// Optional tool declarations in chat completions format
    ///
    /// When provided, the model may answer with tool calls instead of text.
    pub tools: Option<Vec<Value>>,
}

impl LlmRequest {
    /// Create a request with a single user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            tools: None,
        }
    }

    /// Create a request with a system instruction and a user prompt.
    pub fn with_system(prompt: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            tools: None,
        }
    }

    /// Create a request from an existing conversation.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: None,
        }
    }

    /// Offer tools to the model.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    /// The system instruction, if the first message is one.
    pub fn system_instruction(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// The content of the last user message.
    pub fn last_user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Buffered response from the LLM
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct LlmResponse {
    /// Assistant text (may be empty when the model only requested tools)
    pub text: String,

    /// Tool calls requested by the model, in the order it issued them
    pub tool_calls: Vec<ToolCall>,

    /// Total tokens reported by the backend, if any
    pub tokens_used: Option<u32>,

    /// Finish reason reported by the backend (`stop`, `tool_calls`, `length`, ...)
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// A plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A response that requests tool calls.
    pub fn tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: text.into(),
            tool_calls,
            finish_reason: Some("tool_calls".to_string()),
            ..Self::default()
        }
    }

    /// Whether the model asked for at least one tool invocation.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
