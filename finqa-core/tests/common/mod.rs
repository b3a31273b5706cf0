//! Shared test utilities for integration tests

// Each test file includes this module separately,
// so not all functions are used in every compilation unit.
#![allow(dead_code)]

use finqa_core::tool::{Tool, ToolError, ToolRegistry, ToolResult};
use finqa_core::{LlmClient, LlmConfig};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Model served by a local Ollama for live tests, if configured.
pub fn get_ollama_model() -> Option<String> {
    env::var("FINQA_TEST_OLLAMA_MODEL").ok()
}

/// Create a client with short limits for live tests.
pub fn create_test_client(model: &str) -> LlmClient {
    let config = LlmConfig::ollama(model)
        .with_timeout(Duration::from_secs(60))
        .with_max_tokens(256)
        .with_temperature(0.0);
    LlmClient::new(config).expect("test client should build")
}

/// Tool that multiplies two numbers.
#[derive(Debug)]
pub struct Multiply;

#[async_trait]
impl Tool for Multiply {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers a and b"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        match (input["a"].as_f64(), input["b"].as_f64()) {
            (Some(a), Some(b)) => Ok(ToolResult::new(format!("{}", a * b))),
            _ => Err(ToolError::InvalidInput(
                "a and b must be numbers".to_string(),
            )),
        }
    }
}

/// Registry holding only [`Multiply`].
pub fn multiply_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Multiply);
    Arc::new(registry)
}
