use async_trait::async_trait;
use finqa_core::tool::{Tool, ToolError, ToolResult};
use serde_json::{json, Value};

/// Arithmetic expression evaluator.
///
/// Supports `+ - * / ^ %`, parentheses and common functions such as `sqrt`,
/// `ln`, `exp` and `abs`. Integral results are printed without a fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    /// Evaluate an expression and format the result.
    pub fn evaluate(expression: &str) -> Result<String, ToolError> {
        let result = meval::eval_str(expression)
            .map_err(|e| ToolError::ExecutionFailed(format!("Calculator error: {}", e)))?;

        if result.is_nan() {
            return Err(ToolError::ExecutionFailed(
                "Result is not a number (NaN)".into(),
            ));
        }
        if result.is_infinite() {
            return Err(ToolError::ExecutionFailed("Result is infinite".into()));
        }

        if result.fract() == 0.0 && result.abs() < 1e15 {
            Ok(format!("{:.0}", result))
        } else {
            Ok(format!("{}", result))
        }
    }
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression and return the numeric result. \
         Supports + - * / ^ %, parentheses, sqrt, ln, exp and abs."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. (1200 - 950) / 950 * 100"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        // Some models send the bare expression instead of an object.
        let expression = match &input {
            Value::String(s) => s.as_str(),
            _ => input
                .get("expression")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("Missing 'expression' field".into()))?,
        };

        if expression.trim().is_empty() {
            return Err(ToolError::InvalidInput("Expression cannot be empty".into()));
        }

        log::debug!("Evaluating {}", expression);
        Self::evaluate(expression).map(ToolResult::new)
    }
}
