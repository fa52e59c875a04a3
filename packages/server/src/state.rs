use std::sync::Arc;

use common::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

/// Shared application state, cloned into every request handler.
///
/// Constructed once at startup; there is no other process-wide mutable state.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub object_store: Arc<dyn ObjectStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        object_store: Arc<dyn ObjectStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            object_store,
            config,
        }
    }
}
