//! Server state management
//!
//! The store is synchronous, so every handler hops onto the blocking pool.

use std::sync::Arc;

use league_rank::{selector_for, AlphaRankConfig, PairSelector, SchedulerConfig};
use league_store::SqliteStore;

use crate::error::ApiError;

/// Shared state for all handlers
pub struct ServerState {
    pub store: SqliteStore,
    /// Defaults for `/alpharank`; query parameters override alpha and mutation
    pub alpharank: AlphaRankConfig,
    pub selector: Box<dyn PairSelector>,
}

impl ServerState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store,
            alpharank: AlphaRankConfig::default(),
            selector: selector_for(&SchedulerConfig::default()),
        }
    }

    pub fn with_alpharank(mut self, config: AlphaRankConfig) -> Self {
        self.alpharank = config;
        self
    }

    pub fn with_scheduler(mut self, config: &SchedulerConfig) -> Self {
        self.selector = selector_for(config);
        self
    }
}

/// Run store work on the blocking pool
pub(crate) async fn blocking<T, F>(state: &Arc<ServerState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ServerState) -> league_core::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || work(&state)).await?;
    Ok(result?)
}
