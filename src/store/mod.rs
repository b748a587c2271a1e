//! Store Module
//!
//! Provides the durable agent state store: JSON values keyed by string, with
//! TTL expiration and per-entry metadata, persisted in SQLite.

mod entry;
mod handle;
#[allow(clippy::module_inception)]
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{
    current_timestamp_ms, EntryMeta, ListedEntry, SetOutcome, StoredValue, ValueType,
};
pub use handle::StoreHandle;
pub use store::StateStore;

// == Public Constants ==
/// Maximum allowed size of a serialized value in bytes
pub const MAX_VALUE_BYTES: usize = 1024 * 1024; // 1 MiB

/// Writer label used when the caller supplies none
pub const DEFAULT_AGENT: &str = "unknown";
