//! Tool abstraction for the agentic responder.
//!
//! This module provides the [`Tool`] trait and [`ToolRegistry`] that make up
//! the tool execution environment. Tools live outside finqa-core (see the
//! `finqa-code-interpreter` crate) and are registered at startup.
//!
//! # Design
//!
//! - **Async execution**: tools may spawn processes or do I/O
//! - **Instance-based registry**: tools are stateless, stored as instances not factories
//! - **Filtering**: [`ToolSet`] restricts which registered tools are offered to the model
//! - **Function calling**: tools render their own chat completions declaration
//!
//! # Example
//!
//! ```no_run
//! use finqa_core::tool::{Tool, ToolResult, ToolError, ToolRegistry};
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//!
//! #[derive(Debug)]
//! struct Echo;
//!
//! #[async_trait]
//! impl Tool for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn description(&self) -> &str { "Echoes its input" }
//!     fn parameters_schema(&self) -> Value {
//!         json!({
//!             "type": "object",
//!             "properties": { "text": { "type": "string" } },
//!             "required": ["text"]
//!         })
//!     }
//!     async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
//!         let text = input["text"].as_str().unwrap_or("");
//!         Ok(ToolResult::new(text))
//!     }
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Echo);
//! assert!(registry.contains("echo"));
//! ```

mod registry;

pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Result returned by a tool execution.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ToolResult {
    /// The observation handed back to the model.
    pub content: String,
    /// Optional structured metadata for logging.
    pub metadata: Value,
}

impl ToolResult {
    /// Create a result with just content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Value::Null,
        }
    }

    /// Create a result with content and metadata.
    pub fn with_metadata(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Invalid input provided to the tool.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Tool execution timed out.
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// A tool the agentic responder can invoke.
///
/// Each tool has a unique name, description, and parameter schema that the
/// model uses to decide when and how to call it.
#[async_trait]
pub trait Tool: Send + Sync + fmt::Debug {
    /// Unique identifier for this tool (e.g., "code_interpreter").
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given input.
    ///
    /// The input is the JSON arguments the model supplied. If those were not
    /// valid JSON the input is a JSON string holding the raw text.
    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError>;

    /// Chat completions function declaration for this tool.
    ///
    /// The default implementation builds from [`name`](Tool::name),
    /// [`description`](Tool::description), and [`parameters_schema`](Tool::parameters_schema).
    fn to_declaration(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters_schema(),
            }
        })
    }
}

/// Filter selecting which registered tools are offered to the model.
///
/// ```
/// use finqa_core::tool::ToolSet;
///
/// assert!(ToolSet::All.matches("calculator"));
/// let only = ToolSet::Specific(vec!["code_interpreter".into()]);
/// assert!(only.matches("code_interpreter"));
/// assert!(!only.matches("calculator"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolSet {
    /// Use all tools from registry.
    #[default]
    All,

    /// Use only the specified tools by name.
    Specific(Vec<String>),
}

impl ToolSet {
    /// Check if a tool name matches this filter.
    pub fn matches(&self, tool_name: &str) -> bool {
        match self {
            ToolSet::All => true,
            ToolSet::Specific(names) => names.iter().any(|n| n == tool_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Noop;

    #[async_trait]
    impl Tool for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn description(&self) -> &str {
            "Does nothing"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _input: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::new(""))
        }
    }

    #[test]
    fn test_declaration_shape() {
        let declaration = Noop.to_declaration();
        assert_eq!(declaration["type"], "function");
        assert_eq!(declaration["function"]["name"], "noop");
        assert_eq!(declaration["function"]["description"], "Does nothing");
        assert_eq!(declaration["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_tool_error_display() {
        assert_eq!(
            ToolError::InvalidInput("bad".into()).to_string(),
            "Invalid input: bad"
        );
        assert_eq!(
            ToolError::NotFound("foo".into()).to_string(),
            "Tool not found: foo"
        );
        assert_eq!(ToolError::Timeout(1000).to_string(), "Timeout after 1000ms");
    }

    #[rstest]
    #[case::all(ToolSet::All, "calculator", true)]
    #[case::specific_hit(ToolSet::Specific(vec!["calculator".into()]), "calculator", true)]
    #[case::specific_miss(ToolSet::Specific(vec!["calculator".into()]), "code_interpreter", false)]
    fn test_toolset_matches(#[case] set: ToolSet, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(set.matches(name), expected);
    }
}
