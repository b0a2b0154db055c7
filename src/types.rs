//! Adjutant - Type Definitions
//!
//! All shared types for the conversational agent core: the message model,
//! tool requests and outcomes, the error taxonomy, and the trait seams for
//! the model gateway, the host, and the checkpoint store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Messages ────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// One entry in the conversation log. Immutable once appended; ordering is
/// the sole source of conversational context.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool invocations requested by an assistant message. Empty for all
    /// other roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,
    /// For tool_result messages: the id of the request this resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_requests: Vec::new(),
            request_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_requests,
            request_id: None,
        }
    }

    pub fn tool_result(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            tool_requests: Vec::new(),
            request_id: Some(request_id.into()),
        }
    }
}

/// A structured ask from the model to invoke a specific local capability.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    /// Unique within the assistant message that produced it; correlates the
    /// request with its tool_result message.
    pub request_id: String,
}

// ─── Conversation State ──────────────────────────────────────────

/// The ordered, append-only message log for one session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub session_id: String,
    pub messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }
}

// ─── Tool Outcomes ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The safety gate rejected the command.
    Denied,
    /// The tool's side effect failed.
    ExecutionError,
    /// Tool arguments were malformed.
    InvalidInput,
    /// The requested tool is not in the registry.
    UnknownTool,
}

/// Result of executing one tool request. Always converted into exactly one
/// tool_result message regardless of kind, so the model always gets feedback.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    Success(String),
    Failure { kind: FailureKind, detail: String },
}

impl ToolOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    /// Render the outcome as tool_result content. Failures are reported as
    /// text, not as loop-level errors, so the conversation can continue.
    pub fn into_content(self) -> String {
        match self {
            Self::Success(text) => text,
            Self::Failure { kind, detail } => format!("[{:?}] {}", kind, detail),
        }
    }
}

// ─── Model Gateway ───────────────────────────────────────────────

/// What the model returned: a final answer when `tool_requests` is empty,
/// otherwise a batch of requested tool invocations.
#[derive(Clone, Debug, Default)]
pub struct AssistantResponse {
    pub content: String,
    pub tool_requests: Vec<ToolRequest>,
}

/// External collaborator performing the reasoning step. Messages in, a
/// structured response with optional tool-call requests out.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn invoke(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<AssistantResponse, AgentError>;
}

// ─── Host ────────────────────────────────────────────────────────

/// Captured output of a spawned shell command.
#[derive(Clone, Debug)]
pub struct ExecOutput {
    /// Combined stdout + stderr, as the model sees it.
    pub output: String,
    pub exit_code: i32,
}

/// The machine the executor acts on. Real side effects (process spawn,
/// filesystem) live behind this seam so the loop is testable with doubles.
#[async_trait]
pub trait Host: Send + Sync {
    async fn exec(&self, command: &str) -> anyhow::Result<ExecOutput>;
    async fn write_file(&self, path: &str, content: &str) -> anyhow::Result<()>;
    async fn read_file(&self, path: &str) -> anyhow::Result<String>;
}

// ─── Checkpoint Store ────────────────────────────────────────────

/// Durable, keyed message log. Single writer per key; an acknowledged append
/// must survive a restart.
pub trait CheckpointStore: Send + Sync {
    fn load(&self, session_id: &str) -> Result<Option<ConversationState>, AgentError>;
    fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), AgentError>;
}

// ─── Error Taxonomy ──────────────────────────────────────────────

/// Errors that escape `submit` and abort the turn. Tool-level failures
/// ([`FailureKind`]) never surface here; they are folded into tool_result
/// content so the model can react to them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model gateway error: {0}")]
    GatewayError(String),

    #[error("checkpoint store error: {0}")]
    StoreError(String),

    #[error("turn interrupted by stop signal")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roundtrip_serde() {
        let msg = Message::assistant(
            "working on it",
            vec![ToolRequest {
                tool_name: "run_command".to_string(),
                arguments: serde_json::json!({"command": "mkdir projects"}),
                request_id: "req-1".to_string(),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_tool_result_carries_request_id() {
        let msg = Message::tool_result("req-7", "done");
        assert_eq!(msg.role, Role::ToolResult);
        assert_eq!(msg.request_id.as_deref(), Some("req-7"));
        assert!(msg.tool_requests.is_empty());
    }

    #[test]
    fn test_failure_outcome_renders_kind() {
        let content =
            ToolOutcome::failure(FailureKind::Denied, "unsafe command blocked").into_content();
        assert!(content.contains("Denied"));
        assert!(content.contains("unsafe command blocked"));
    }
}
