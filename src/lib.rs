//! Adjutant -- Conversational Tool-Using Agent Core
//!
//! A single-session agent that alternates between a reasoning step (the
//! model gateway) and an execution step (a constrained set of local tools),
//! with durable checkpointing of the full message history.

pub mod agent;
pub mod config;
pub mod gateway;
pub mod host;
pub mod state;
pub mod types;
