//! Agent State - A durable key-value store shared between agent sessions
//!
//! Stores JSON values in SQLite with TTL expiration and per-entry metadata,
//! usable as a library, as an agent tool, or over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;
pub mod tool;

pub use api::AppState;
pub use config::Config;
pub use error::StateError;
pub use store::{StateStore, StoreHandle};
pub use tasks::spawn_purge_task;
pub use tool::StateTool;
