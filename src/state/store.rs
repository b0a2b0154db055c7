//! SQLite Checkpoint Store
//!
//! Durable message log keyed by session id, backed by rusqlite. Appends run
//! inside a transaction so a committed batch is atomic: re-reading after a
//! crash never shows less than the last acknowledged write.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::types::{AgentError, CheckpointStore, ConversationState, Message, Role};

use super::schema::{CREATE_TABLES, SCHEMA_VERSION};

/// SQLite-backed checkpoint store. Single-process access; the mutex gives
/// single-writer-per-key semantics across sessions sharing one store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path` and initialize the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create db directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open database: {db_path}"))?;

        // WAL for durability of acknowledged writes under crashes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(CREATE_TABLES)
            .context("failed to create tables")?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, Utc::now().to_rfc3339()],
        )
        .context("failed to set schema version")?;
        Ok(())
    }

    fn role_to_str(role: &Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }

    fn role_from_str(s: &str) -> Role {
        match s {
            "user" => Role::User,
            "tool_result" => Role::ToolResult,
            _ => Role::Assistant,
        }
    }
}

impl CheckpointStore for SqliteStore {
    fn load(&self, session_id: &str) -> Result<Option<ConversationState>, AgentError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT role, content, tool_requests, request_id
                 FROM messages WHERE session_id = ?1 ORDER BY seq ASC",
            )
            .map_err(|e| AgentError::StoreError(e.to_string()))?;

        let messages: Vec<Message> = stmt
            .query_map(params![session_id], |row| {
                let role_str: String = row.get(0)?;
                let requests_json: String = row.get(2)?;
                Ok(Message {
                    role: Self::role_from_str(&role_str),
                    content: row.get(1)?,
                    tool_requests: serde_json::from_str(&requests_json).unwrap_or_default(),
                    request_id: row.get(3)?,
                })
            })
            .map_err(|e| AgentError::StoreError(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AgentError::StoreError(e.to_string()))?;

        if messages.is_empty() {
            return Ok(None);
        }

        Ok(Some(ConversationState {
            session_id: session_id.to_string(),
            messages,
        }))
    }

    fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), AgentError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| AgentError::StoreError(e.to_string()))?;

        let next_seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), -1) + 1 FROM messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(|e| AgentError::StoreError(e.to_string()))?;

        let created_at = Utc::now().to_rfc3339();
        for (offset, message) in messages.iter().enumerate() {
            let requests_json = serde_json::to_string(&message.tool_requests)
                .map_err(|e| AgentError::StoreError(e.to_string()))?;
            tx.execute(
                "INSERT INTO messages (session_id, seq, role, content, tool_requests, request_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    next_seq + offset as i64,
                    Self::role_to_str(&message.role),
                    message.content,
                    requests_json,
                    message.request_id,
                    created_at,
                ],
            )
            .map_err(|e| AgentError::StoreError(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| AgentError::StoreError(e.to_string()))?;

        debug!(session_id, count = messages.len(), "checkpoint appended");
        Ok(())
    }
}
