//! The Agent Loop
//!
//! The control-flow core: route between "call the model" and "execute the
//! requested tools", fold every tool outcome back into the conversation, and
//! checkpoint the message log at each transition boundary. A turn either
//! fully commits a transition or abandons it; a restart always resumes from
//! a fully-resolved history.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::types::{
    AgentError, CheckpointStore, ConversationState, Host, Message, ModelGateway, ToolRequest,
};

use super::safety::SafetyGate;
use super::system_prompt::build_system_instruction;
use super::tools::{create_builtin_tools, execute_tool, BuiltinTool};

/// Where the loop currently is within a turn. `Terminated` is terminal for
/// the turn only; the session returns to `AwaitingUser` for the next input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingUser,
    Reasoning,
    AwaitingToolResolution,
    Terminated,
}

/// Callback invoked for each message the turn produces: intermediate
/// tool_results and the final assistant content.
pub type MessageCallback = Box<dyn Fn(&Message) + Send + Sync>;

/// Collaborators and knobs for a session.
pub struct SessionOptions {
    pub config: AgentConfig,
    pub store: Arc<dyn CheckpointStore>,
    pub gateway: Arc<dyn ModelGateway>,
    pub host: Arc<dyn Host>,
    pub on_message: Option<MessageCallback>,
    /// External stop signal, honored at the two suspension points (awaiting
    /// model, awaiting tool). `None` means the session cannot be interrupted.
    pub stop: Option<watch::Receiver<bool>>,
}

/// A single conversational session: one active loop instance per session id,
/// owning the conversation state for the duration of a turn.
pub struct Session {
    state: ConversationState,
    /// Length of the durable prefix of `state.messages`. Everything past it
    /// is uncommitted and is rolled back when a turn is abandoned.
    committed_len: usize,
    phase: TurnPhase,
    tools: Vec<BuiltinTool>,
    gate: SafetyGate,
    system_instruction: String,
    config: AgentConfig,
    store: Arc<dyn CheckpointStore>,
    gateway: Arc<dyn ModelGateway>,
    host: Arc<dyn Host>,
    on_message: Option<MessageCallback>,
    stop: Option<watch::Receiver<bool>>,
}

impl Session {
    /// Open a session, restoring any existing checkpoint for the id.
    pub fn open(session_id: &str, options: SessionOptions) -> Result<Self, AgentError> {
        let SessionOptions {
            config,
            store,
            gateway,
            host,
            on_message,
            stop,
        } = options;

        let state = match store.load(session_id)? {
            Some(restored) => {
                info!(
                    session_id,
                    messages = restored.messages.len(),
                    "restored session from checkpoint"
                );
                restored
            }
            None => ConversationState::new(session_id),
        };
        let committed_len = state.messages.len();

        let tools = create_builtin_tools();
        let gate = SafetyGate::new(config.safe_prefixes.iter().map(String::as_str));
        let system_instruction = build_system_instruction(&tools);

        Ok(Self {
            state,
            committed_len,
            phase: TurnPhase::AwaitingUser,
            tools,
            gate,
            system_instruction,
            config,
            store,
            gateway,
            host,
            on_message,
            stop,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The full in-memory message log (committed prefix only between turns).
    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    /// Run one turn: append the user message, alternate between reasoning
    /// and tool resolution, and return the messages produced (intermediate
    /// tool_results plus the final assistant content).
    ///
    /// On `GatewayError`, `StoreError`, or `Interrupted` the turn is
    /// abandoned: in-memory state rolls back to the last checkpoint and the
    /// caller may retry by resubmitting.
    pub async fn submit(&mut self, user_text: &str) -> Result<Vec<Message>, AgentError> {
        self.state.messages.push(Message::user(user_text));

        let mut produced = Vec::new();
        let result = self.run_turn(&mut produced).await;

        match result {
            Ok(()) => {
                self.phase = TurnPhase::Terminated;
                Ok(produced)
            }
            Err(err) => {
                // Abandon: the last successful checkpoint stands.
                self.state.messages.truncate(self.committed_len);
                self.phase = TurnPhase::AwaitingUser;
                warn!(session_id = %self.state.session_id, error = %err, "turn aborted");
                Err(err)
            }
        }
    }

    async fn run_turn(&mut self, produced: &mut Vec<Message>) -> Result<(), AgentError> {
        for _round in 0..self.config.max_tool_rounds {
            self.phase = TurnPhase::Reasoning;

            let gateway = Arc::clone(&self.gateway);
            let instruction = self.system_instruction.clone();
            let history = self.state.messages.clone();
            let response = with_stop(&mut self.stop, async move {
                gateway.invoke(&instruction, &history).await
            })
            .await??;

            debug!(
                tool_requests = response.tool_requests.len(),
                "gateway responded"
            );

            let assistant =
                Message::assistant(response.content, response.tool_requests.clone());
            self.state.messages.push(assistant.clone());

            if response.tool_requests.is_empty() {
                // Final answer: Reasoning -> Terminated.
                self.commit()?;
                self.emit(&assistant, produced);
                return Ok(());
            }

            // Every pending request must resolve to exactly one tool_result
            // before the model is invoked again.
            self.phase = TurnPhase::AwaitingToolResolution;
            for request in &response.tool_requests {
                let result = self.resolve_request(request).await?;
                self.state.messages.push(result.clone());
                self.emit(&result, produced);
            }

            // All siblings resolved: the transition back to Reasoning is
            // durable as one fully-resolved unit.
            self.commit()?;
        }

        // Round budget exhausted; close the turn with an explicit notice
        // rather than reasoning forever.
        let notice = Message::assistant(
            "Stopping: reached the tool-round limit for a single turn.",
            Vec::new(),
        );
        self.state.messages.push(notice.clone());
        self.commit()?;
        self.emit(&notice, produced);
        Ok(())
    }

    async fn resolve_request(&mut self, request: &ToolRequest) -> Result<Message, AgentError> {
        info!(tool = %request.tool_name, request_id = %request.request_id, "executing tool");

        let host = Arc::clone(&self.host);
        let tools = self.tools.clone();
        let gate = self.gate.clone();
        let request_owned = request.clone();
        let outcome = with_stop(&mut self.stop, async move {
            execute_tool(&request_owned, &tools, &gate, host.as_ref()).await
        })
        .await?;

        Ok(Message::tool_result(
            request.request_id.clone(),
            outcome.into_content(),
        ))
    }

    /// Persist everything appended since the last checkpoint. The loop never
    /// proceeds past a transition whose checkpoint write failed.
    fn commit(&mut self) -> Result<(), AgentError> {
        let pending = &self.state.messages[self.committed_len..];
        if pending.is_empty() {
            return Ok(());
        }
        self.store.append(&self.state.session_id, pending)?;
        self.committed_len = self.state.messages.len();
        Ok(())
    }

    fn emit(&self, message: &Message, produced: &mut Vec<Message>) {
        if let Some(ref cb) = self.on_message {
            cb(message);
        }
        produced.push(message.clone());
    }
}

/// Await `fut`, abandoning it if the stop signal flips to true first.
async fn with_stop<F, T>(
    stop: &mut Option<watch::Receiver<bool>>,
    fut: F,
) -> Result<T, AgentError>
where
    F: Future<Output = T>,
{
    match stop {
        None => Ok(fut.await),
        Some(rx) => {
            tokio::pin!(fut);
            loop {
                tokio::select! {
                    result = &mut fut => return Ok(result),
                    changed = rx.changed() => match changed {
                        Ok(()) if *rx.borrow() => return Err(AgentError::Interrupted),
                        Ok(()) => continue,
                        // Sender dropped: no stop can ever arrive.
                        Err(_) => return Ok(fut.await),
                    },
                }
            }
        }
    }
}
