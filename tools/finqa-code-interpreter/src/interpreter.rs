//! Python code interpreter tool.

use async_trait::async_trait;
use finqa_core::tool::{Tool, ToolError, ToolResult};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Interpreter invoked as `<interpreter> -c <code>`.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Default timeout for a snippet (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum timeout allowed (5 minutes).
const MAX_TIMEOUT_SECS: u64 = 300;

/// Maximum output size to capture per stream (1MB).
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Runs a code snippet in a fresh interpreter process.
///
/// Stdout and stderr are both returned to the model. A non-zero exit status
/// is not an error: the traceback is what the model needs to correct itself.
/// Only a missing interpreter or a timeout fail the call.
///
/// # Example
///
/// ```no_run
/// use finqa_code_interpreter::CodeInterpreter;
/// use finqa_core::tool::Tool;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = CodeInterpreter::default()
///     .execute(json!({"code": "print(round(1250 * 1.07, 2))"}))
///     .await?;
/// assert_eq!(result.content.trim(), "1337.5");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CodeInterpreter {
    interpreter: String,
}

impl Default for CodeInterpreter {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }
}

impl CodeInterpreter {
    /// Use a different interpreter binary (must accept `-c <code>`).
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

#[async_trait]
impl Tool for CodeInterpreter {
    fn name(&self) -> &str {
        "code_interpreter"
    }

    fn description(&self) -> &str {
        "Run a Python snippet and return everything it prints. Use print() to \
         show results. Each call starts a fresh interpreter; variables do not \
         persist between calls. Snippets time out after 30s by default."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to execute"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 30, max: 300)"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        // Malformed argument JSON arrives as the raw string; treat it as code.
        let code = match &input {
            Value::String(s) => s.as_str(),
            _ => input
                .get("code")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidInput("Missing 'code' field".into()))?,
        };

        if code.trim().is_empty() {
            return Err(ToolError::InvalidInput("Code cannot be empty".into()));
        }

        let timeout_secs = input
            .get("timeout_secs")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, MAX_TIMEOUT_SECS);

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-c").arg(code);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        log::debug!("Running {} snippet ({} bytes)", self.interpreter, code.len());

        let output = timeout(Duration::from_secs(timeout_secs), cmd.output())
            .await
            .map_err(|_| ToolError::Timeout(timeout_secs * 1000))?
            .map_err(|e| {
                ToolError::ExecutionFailed(format!(
                    "Failed to start {}: {}",
                    self.interpreter, e
                ))
            })?;

        let (stdout, stdout_truncated) = capped(&output.stdout);
        let (stderr, stderr_truncated) = capped(&output.stderr);

        let mut content = stdout;
        if stdout_truncated {
            content.push_str("\n... (stdout truncated)");
        }
        if !stderr.is_empty() {
            if !content.is_empty() {
                content.push_str("\n\n");
            }
            content.push_str("[stderr]\n");
            content.push_str(&stderr);
            if stderr_truncated {
                content.push_str("\n... (stderr truncated)");
            }
        }

        let exit_code = output.status.code().unwrap_or(-1);
        if content.is_empty() {
            content = format!(
                "Code ran with exit code {} and printed nothing. Use print() to show results.",
                exit_code
            );
        }

        let metadata = json!({
            "exit_code": exit_code,
            "success": output.status.success(),
            "stdout_truncated": stdout_truncated,
            "stderr_truncated": stderr_truncated,
            "timeout_secs": timeout_secs,
        });

        Ok(ToolResult::with_metadata(content, metadata))
    }
}

/// Decode at most [`MAX_OUTPUT_SIZE`] bytes, cutting on a char boundary.
fn capped(bytes: &[u8]) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_OUTPUT_SIZE {
        return (text.into_owned(), false);
    }
    let mut end = MAX_OUTPUT_SIZE;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_string(), true)
}
