//! Store Handle Module
//!
//! Lazily opened, process-wide access to a [`StateStore`].

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::store::StateStore;

/// Shared handle that opens the store on first use.
///
/// Clones share the same cell, so concurrent first calls open the database
/// once; the others wait for that attempt. A failed open leaves the cell
/// empty and the next call tries again.
#[derive(Clone)]
pub struct StoreHandle {
    config: Arc<Config>,
    cell: Arc<OnceCell<StateStore>>,
}

impl StoreHandle {
    /// Creates a handle that will open the database described by `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Wraps an already opened store.
    pub fn from_store(store: StateStore) -> Self {
        Self {
            config: Arc::new(Config::default()),
            cell: Arc::new(OnceCell::new_with(Some(store))),
        }
    }

    /// Returns the store, opening it if this is the first call.
    pub async fn store(&self) -> Result<&StateStore> {
        self.cell
            .get_or_try_init(|| async {
                debug!("Opening state store at {}", self.config.db_path.display());
                StateStore::open(&self.config).await
            })
            .await
    }

    /// True once the store has been opened.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Closes the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(store) = self.cell.get() {
            store.close().await;
        }
    }
}
