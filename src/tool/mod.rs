//! Tool Module
//!
//! The state store as an agent-callable tool: one argument record in, one
//! JSON string out, whatever happens.

mod state_tool;

pub use state_tool::{StateTool, ToolSpec};
