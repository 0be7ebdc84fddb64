// Application state module
// Immutable per-process state shared by every request

use std::path::PathBuf;

use super::types::Config;
use crate::store::RecordStore;

/// Application state
///
/// Resolved once at startup and never mutated afterwards, so requests share
/// it through an `Arc` without locking.
pub struct AppState {
    pub config: Config,
    pub store: RecordStore,
}

impl AppState {
    pub const fn new(config: Config, data_root: PathBuf) -> Self {
        Self {
            config,
            store: RecordStore::new(data_root),
        }
    }

    /// Whether request lines are written to the access log
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
