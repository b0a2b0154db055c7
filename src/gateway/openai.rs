//! OpenAI-Compatible Model Gateway
//!
//! Wraps a /v1/chat/completions endpoint. Conversation messages are mapped
//! to the wire format (tool_result messages become role "tool" entries
//! correlated by tool_call_id) and tool_calls in the response are parsed
//! back into tool requests.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::tools::{create_builtin_tools, tools_to_gateway_format};
use crate::config::AgentConfig;
use crate::types::{AgentError, AssistantResponse, Message, ModelGateway, Role, ToolRequest};

/// Gateway for OpenAI-compatible chat completions.
pub struct OpenAiGateway {
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    tool_definitions: Vec<Value>,
    http: Client,
}

impl OpenAiGateway {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens_per_turn,
            tool_definitions: tools_to_gateway_format(&create_builtin_tools()),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn invoke(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<AssistantResponse, AgentError> {
        let mut wire_messages = vec![json!({
            "role": "system",
            "content": system_instruction,
        })];
        wire_messages.extend(history.iter().map(format_message));

        let body = json!({
            "model": self.model,
            "messages": wire_messages,
            "max_tokens": self.max_tokens,
            "tools": self.tool_definitions,
            "tool_choice": "auto",
            "stream": false,
        });

        let url = format!("{}/v1/chat/completions", self.api_url);
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::GatewayError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::GatewayError(format!(
                "{}: {}",
                status.as_u16(),
                text
            )));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| AgentError::GatewayError(format!("malformed response: {}", e)))?;

        let message = data["choices"]
            .get(0)
            .map(|choice| &choice["message"])
            .ok_or_else(|| AgentError::GatewayError("no completion choice returned".into()))?;

        let response = parse_assistant_message(message)?;
        debug!(
            tool_requests = response.tool_requests.len(),
            "completion received"
        );
        Ok(response)
    }
}

/// Map one conversation message to the wire format.
fn format_message(msg: &Message) -> Value {
    match msg.role {
        Role::User => json!({ "role": "user", "content": msg.content }),
        Role::Assistant => {
            let mut formatted = json!({ "role": "assistant", "content": msg.content });
            if !msg.tool_requests.is_empty() {
                let calls: Vec<Value> = msg
                    .tool_requests
                    .iter()
                    .map(|req| {
                        json!({
                            "id": req.request_id,
                            "type": "function",
                            "function": {
                                "name": req.tool_name,
                                "arguments": serde_json::to_string(&req.arguments)
                                    .unwrap_or_else(|_| "{}".to_string()),
                            }
                        })
                    })
                    .collect();
                formatted["tool_calls"] = json!(calls);
            }
            formatted
        }
        Role::ToolResult => json!({
            "role": "tool",
            "content": msg.content,
            "tool_call_id": msg.request_id,
        }),
    }
}

/// Parse the assistant message of a completion into a response. Tool-call
/// arguments arrive JSON-encoded as a string; unparseable arguments fall
/// back to an empty object so dispatch can reject them as invalid input.
fn parse_assistant_message(message: &Value) -> Result<AssistantResponse, AgentError> {
    let content = message["content"].as_str().unwrap_or("").to_string();

    let tool_requests: Vec<ToolRequest> = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|call| {
                    let arguments_raw = call["function"]["arguments"].as_str().unwrap_or("{}");
                    ToolRequest {
                        tool_name: call["function"]["name"].as_str().unwrap_or("").to_string(),
                        arguments: serde_json::from_str(arguments_raw)
                            .unwrap_or_else(|_| json!({})),
                        request_id: call["id"].as_str().unwrap_or("").to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(AssistantResponse {
        content,
        tool_requests,
    })
}
