//! State Module
//!
//! SQLite-backed checkpoint persistence for conversation sessions.

mod schema;
mod store;

pub use schema::{CREATE_TABLES, SCHEMA_VERSION};
pub use store::SqliteStore;
