//! Adjutant Tool System
//!
//! Declares the fixed set of tools the model can call and dispatches
//! requested invocations. Tool failures are reported as tool_result content,
//! never as loop-level errors, so the conversation can continue.

use serde_json::{json, Value};

use crate::types::{FailureKind, Host, ToolOutcome, ToolRequest};

use super::safety::{SafetyGate, Verdict};

/// A tool the model can invoke. Execution is handled via a match on the tool
/// name in `execute_tool`.
#[derive(Debug, Clone)]
pub struct BuiltinTool {
    pub name: String,
    pub description: String,
    /// Gated tools pass their command string through the safety gate before
    /// anything is spawned.
    pub gated: bool,
    pub parameters: Value,
}

/// Create the builtin tool registry.
pub fn create_builtin_tools() -> Vec<BuiltinTool> {
    vec![
        BuiltinTool {
            name: "run_command".to_string(),
            description: "Execute a safe system command. Returns the captured output.".to_string(),
            gated: true,
            parameters: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The shell command to execute"
                    }
                },
                "required": ["command"]
            }),
        },
        BuiltinTool {
            name: "write_file".to_string(),
            description: "Write content to a file, creating parent directories as needed."
                .to_string(),
            gated: false,
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path" },
                    "content": { "type": "string", "description": "File content" }
                },
                "required": ["path", "content"]
            }),
        },
        BuiltinTool {
            name: "read_file".to_string(),
            description: "Read content from a file.".to_string(),
            gated: false,
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path to read" }
                },
                "required": ["path"]
            }),
        },
        BuiltinTool {
            name: "install_package".to_string(),
            description: "Install a Python package via pip.".to_string(),
            gated: false,
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Package name (e.g., numpy)" }
                },
                "required": ["name"]
            }),
        },
    ]
}

/// Convert the registry to OpenAI-compatible tool definitions.
pub fn tools_to_gateway_format(tools: &[BuiltinTool]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

/// Execute one tool request against the host. Every path returns an outcome;
/// an unknown name is a failure outcome, never silently ignored.
pub async fn execute_tool(
    request: &ToolRequest,
    tools: &[BuiltinTool],
    gate: &SafetyGate,
    host: &dyn Host,
) -> ToolOutcome {
    if !tools.iter().any(|t| t.name == request.tool_name) {
        return ToolOutcome::failure(
            FailureKind::UnknownTool,
            format!("no such tool: {}", request.tool_name),
        );
    }

    match request.tool_name.as_str() {
        "run_command" => {
            let command = match str_arg(&request.arguments, "command") {
                Ok(c) => c,
                Err(outcome) => return outcome,
            };
            run_gated_command(command, gate, host).await
        }

        "write_file" => {
            let path = match str_arg(&request.arguments, "path") {
                Ok(p) => p,
                Err(outcome) => return outcome,
            };
            let content = match str_arg(&request.arguments, "content") {
                Ok(c) => c,
                Err(outcome) => return outcome,
            };
            match host.write_file(path, content).await {
                Ok(()) => ToolOutcome::Success("written".to_string()),
                Err(e) => ToolOutcome::failure(FailureKind::ExecutionError, e.to_string()),
            }
        }

        "read_file" => {
            let path = match str_arg(&request.arguments, "path") {
                Ok(p) => p,
                Err(outcome) => return outcome,
            };
            match host.read_file(path).await {
                Ok(contents) => ToolOutcome::Success(contents),
                Err(e) => ToolOutcome::failure(FailureKind::ExecutionError, e.to_string()),
            }
        }

        "install_package" => {
            let name = match str_arg(&request.arguments, "name") {
                Ok(n) => n,
                Err(outcome) => return outcome,
            };
            // Re-enters the gated path: package installs are commands too.
            run_gated_command(&format!("pip install {}", name), gate, host).await
        }

        // Unreachable: registry membership was checked above.
        other => ToolOutcome::failure(
            FailureKind::UnknownTool,
            format!("no such tool: {}", other),
        ),
    }
}

/// Shared gated execution path for `run_command` and `install_package`.
/// A denied command never reaches the host.
async fn run_gated_command(command: &str, gate: &SafetyGate, host: &dyn Host) -> ToolOutcome {
    if gate.evaluate(command) == Verdict::Deny {
        return ToolOutcome::failure(FailureKind::Denied, "unsafe command blocked");
    }

    match host.exec(command).await {
        // Captured output is returned as a successful result even on a
        // non-zero exit; the model judges failure from the text.
        Ok(exec) => ToolOutcome::Success(exec.output.trim().to_string()),
        Err(e) => ToolOutcome::failure(FailureKind::ExecutionError, e.to_string()),
    }
}

/// Extract a required string argument, or an InvalidInput outcome.
fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolOutcome> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| {
        ToolOutcome::failure(
            FailureKind::InvalidInput,
            format!("missing '{}' argument", key),
        )
    })
}
