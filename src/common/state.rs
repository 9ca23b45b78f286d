// Application state shared across all modules

use handlebars::Handlebars;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::config::AppConfig;
use crate::queue::JobQueue;
use crate::services::storage::PhotoStorage;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: PhotoStorage,
    pub queue: JobQueue,
    /// Registry holding the product page templates
    pub views: Arc<Handlebars<'static>>,
}

/// How handlers receive the state, through an `Extension` layer
pub type SharedState = Arc<RwLock<AppState>>;
