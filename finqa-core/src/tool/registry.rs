//! Tool registry for managing available tools.

use super::{Tool, ToolError, ToolResult, ToolSet};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available tools.
///
/// Stores tools as `Arc<dyn Tool>` so a registry can be shared across
/// responders. Tools can be registered, retrieved by name, listed, filtered
/// by a [`ToolSet`], and invoked by name.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool in the registry.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
        self
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names, sorted alphabetically.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Check if a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Filter tools based on a [`ToolSet`], sorted by name.
    pub fn filter(&self, tool_set: &ToolSet) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = self
            .tools
            .iter()
            .filter(|(name, _)| tool_set.matches(name))
            .map(|(_, tool)| Arc::clone(tool))
            .collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Function declarations for the tools matching a filter.
    pub fn declarations(&self, tool_set: &ToolSet) -> Vec<Value> {
        self.filter(tool_set)
            .iter()
            .map(|tool| tool.to_declaration())
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if no such tool is registered, otherwise
    /// whatever the tool itself returns.
    pub async fn invoke(&self, name: &str, input: Value) -> Result<ToolResult, ToolError> {
        let tool = self.get(name).ok_or_else(|| {
            ToolError::NotFound(format!("'{}'. Available tools: {}", name, self.list().join(", ")))
        })?;

        log::debug!("Invoking tool '{}'", name);
        tool.execute(input).await
    }
}
