//! HTTP client for OpenAI-compatible chat completions endpoints.

use super::request::{LlmRequest, LlmResponse, ToolCall};
use super::ChatBackend;
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::utils::{truncate, truncate_with_count};

use async_trait::async_trait;
use serde_json::{json, Value};

/// LLM client for an OpenAI-compatible chat completions endpoint
///
/// Enforces the configured timeout on every call. There is no retry: a failed
/// call is reported once and the caller decides what to do with it.
#[derive(Debug, Clone)]
pub struct LlmClient {
    /// Underlying HTTP client
    http: reqwest::Client,

    /// Model, endpoint and sampling configuration
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` if the model or base URL is empty, or
    /// `LlmError::Http` if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::InvalidRequest("Model cannot be empty".to_string()));
        }
        if config.base_url.trim().is_empty() {
            return Err(LlmError::InvalidRequest(
                "Base URL cannot be empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Build the JSON request body for a request.
    pub fn request_body(&self, request: &LlmRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(|m| m.to_wire()).collect();

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        if let Some(tools) = &request.tools {
            body["tools"] = Value::Array(tools.clone());
        }

        body
    }

    async fn send(&self, body: Value) -> Result<Value, LlmError> {
        let mut builder = self
            .http
            .post(self.config.chat_completions_url())
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_with_count(&body, 500),
            });
        }

        Ok(response.json().await?)
    }

    /// Send a request and wait for the buffered response.
    ///
    /// # Errors
    ///
    /// - `LlmError::InvalidRequest` if the request has no messages
    /// - `LlmError::Timeout` if the configured timeout elapses
    /// - `LlmError::Status` for non-success HTTP responses
    /// - `LlmError::ResponseProcessing` / `LlmError::NoContent` for malformed bodies
    pub async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "Request must contain at least one message".to_string(),
            ));
        }

        let body = self.request_body(&request);
        log::debug!(
            "POST {} (model={}, messages={}, tools={})",
            self.config.chat_completions_url(),
            self.config.model,
            request.messages.len(),
            request.tools.as_ref().map_or(0, Vec::len)
        );

        let timeout = self.config.timeout;
        let json = tokio::time::timeout(timeout, self.send(body))
            .await
            .map_err(|_| LlmError::Timeout(timeout.as_millis() as u64))??;

        parse_response(&json)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        LlmClient::generate(self, request).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Parse a chat completions response body.
///
/// Reads `choices[0].message`: its `content` becomes the text and its
/// `tool_calls` are decoded in order. A message with neither is `NoContent`.
pub fn parse_response(json: &Value) -> Result<LlmResponse, LlmError> {
    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(LlmError::ResponseProcessing(message));
    }

    let choice = json.pointer("/choices/0").ok_or_else(|| {
        LlmError::ResponseProcessing(format!(
            "Response has no choices: {}",
            truncate(&json.to_string(), 200)
        ))
    })?;

    let message = choice
        .get("message")
        .ok_or_else(|| LlmError::ResponseProcessing("Choice has no message".to_string()))?;

    let text = message.get("content").and_then(Value::as_str);

    let tool_calls = match message.get("tool_calls").and_then(Value::as_array) {
        Some(calls) => calls
            .iter()
            .enumerate()
            .map(|(i, call)| parse_tool_call(i, call))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    if text.is_none() && tool_calls.is_empty() {
        return Err(LlmError::NoContent);
    }

    let tokens_used = json
        .pointer("/usage/total_tokens")
        .and_then(Value::as_u64)
        .and_then(|t| u32::try_from(t).ok());

    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(LlmResponse {
        text: text.unwrap_or_default().to_string(),
        tool_calls,
        tokens_used,
        finish_reason,
    })
}

fn parse_tool_call(index: usize, call: &Value) -> Result<ToolCall, LlmError> {
    let function = call.get("function").ok_or_else(|| {
        LlmError::ResponseProcessing(format!("Tool call {} has no function", index))
    })?;

    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::ResponseProcessing(format!("Tool call {} has no name", index)))?;

    // Some servers omit ids; synthesize a stable one so results can be matched
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", index));

    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) if raw.trim().is_empty() => json!({}),
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        Some(other) => other.clone(),
        None => json!({}),
    };

    Ok(ToolCall::new(id, name, arguments))
}
