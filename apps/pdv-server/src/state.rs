//! Shared application state handed to every handler via axum's `State`.

use pdv_db::Database;

use crate::config::PdvConfig;

/// Shared application state. Cheap to clone: the database handle wraps a
/// pooled connection set.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: PdvConfig,
}

impl AppState {
    pub fn new(db: Database, config: PdvConfig) -> Self {
        AppState { db, config }
    }
}
