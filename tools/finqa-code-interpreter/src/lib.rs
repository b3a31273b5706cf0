//! Tools for the agentic responder.
//!
//! - [`CodeInterpreter`] runs a Python snippet and returns what it printed
//! - [`Calculator`] evaluates an arithmetic expression
//!
//! [`finance_tools`] builds a registry holding both.

mod calculator;
mod interpreter;

pub use calculator::Calculator;
pub use interpreter::{CodeInterpreter, DEFAULT_INTERPRETER};

use finqa_core::tool::ToolRegistry;

/// Registry with the code interpreter and the calculator.
pub fn finance_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(CodeInterpreter::default())
        .register(Calculator);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_tools_registers_both() {
        let registry = finance_tools();
        assert_eq!(registry.list(), vec!["calculator", "code_interpreter"]);
    }
}
