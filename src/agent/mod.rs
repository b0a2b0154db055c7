//! Agent Module
//!
//! The control loop, the safety gate, the tool system, and the system
//! instruction builder.

pub mod agent_loop;
pub mod safety;
pub mod system_prompt;
pub mod tools;
