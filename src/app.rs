//! Application assembly shared by the server binary and the tests

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::common::{AppConfig, AppState, SharedState};
use crate::queue::{self, JobContext, JobReceiver, RetryPolicy};
use crate::services::{MailTemplates, Mailer, PhotoStorage};
use crate::{auth, logging_middleware, notifications, products, users};

/// Request bodies above this are rejected; photos are capped lower by validation
pub const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Builds the shared state and the receiving end of its job queue
pub fn build_state(db: SqlitePool, config: AppConfig) -> anyhow::Result<(AppState, JobReceiver)> {
    let views = products::views::build_views()
        .map_err(|e| anyhow::anyhow!("failed to register product views: {}", e))?;
    let (queue, receiver) = queue::channel();

    let state = AppState {
        db,
        storage: PhotoStorage::new(config.storage_dir.clone()),
        config: Arc::new(config),
        queue,
        views: Arc::new(views),
    };

    Ok((state, receiver))
}

/// Everything the worker needs, derived from the running state
pub fn build_job_context(state: &AppState, mailer: Arc<dyn Mailer>) -> anyhow::Result<JobContext> {
    let templates =
        MailTemplates::new().map_err(|e| anyhow::anyhow!("failed to load mail templates: {}", e))?;

    info!(mailer = mailer.name(), "Job context ready");

    Ok(JobContext {
        db: state.db.clone(),
        mailer,
        templates,
        queue: state.queue.clone(),
        notify_email: state.config.notify_email.clone(),
        retry: RetryPolicy {
            max_attempts: state.config.queue_max_attempts,
            base_delay: state.config.queue_backoff,
        },
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Merges every module router and applies the shared layers
pub fn build_router(shared: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        // ====================================================================
        // API: accounts and user management
        // ====================================================================
        .merge(auth::auth_routes())
        .merge(users::user_routes())
        .merge(notifications::notification_routes())
        // ====================================================================
        // Products: API, pages, photos and the specification download
        // ====================================================================
        .merge(products::product_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(Extension(shared))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Convenience for callers that already hold a plain [`AppState`]
pub fn share(state: AppState) -> SharedState {
    Arc::new(RwLock::new(state))
}
