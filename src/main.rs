// src/main.rs
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_api::app::{build_job_context, build_router, build_state, share};
use catalog_api::common::{migrations, safe_email_log, AppConfig};
use catalog_api::queue::run_worker;
use catalog_api::services::{build_mailer, monitoring};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer())
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env();
    let _sentry = monitoring::init_sentry(config.sentry_dsn.as_deref());

    let admins: Vec<String> = config.admin_emails.iter().map(|e| safe_email_log(e)).collect();
    info!(admins = ?admins, mail_driver = ?config.mail_driver, "Configuration loaded");

    // ========================================================================
    // DIRECTORY SETUP
    // ========================================================================

    tokio::fs::create_dir_all(&config.storage_dir).await?;
    if !tokio::fs::try_exists(&config.spec_file_path).await.unwrap_or(false) {
        warn!(path = %config.spec_file_path.display(), "Specification file missing, /download will 404");
    }

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    migrations::run_migrations(&pool).await?;

    // ========================================================================
    // APPLICATION STATE AND WORKER
    // ========================================================================

    let port = config.port;
    let cors_origins = config.cors_origins.clone();
    let mailer = build_mailer(&config);

    let (state, receiver) = build_state(pool, config)?;
    let job_context = Arc::new(build_job_context(&state, mailer)?);
    tokio::spawn(run_worker(receiver, job_context));

    let app = build_router(share(state), &cors_origins);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
