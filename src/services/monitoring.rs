// Monitoring with Sentry integration
use serde_json::Value;
use tracing::{error, info};

/// Initialize Sentry when a DSN is configured
///
/// The returned guard must be held for the life of the process.
pub fn init_sentry(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let Some(dsn) = dsn.filter(|d| !d.is_empty()) else {
        info!("Sentry DSN not configured");
        return None;
    };

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(
                std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string())
                    .into(),
            ),
            traces_sample_rate: 0.0,
            ..Default::default()
        },
    ));

    info!("Sentry initialized successfully");
    Some(guard)
}

/// Log an error with context and forward it to Sentry
///
/// Without an initialized client the Sentry calls are no-ops.
pub fn log_error(error: &dyn std::error::Error, context: Option<Value>) {
    error!("Error occurred: {}", error);

    if let Some(ctx) = &context {
        error!(
            "Context: {}",
            serde_json::to_string_pretty(ctx).unwrap_or_default()
        );
    }

    sentry::with_scope(
        |scope| {
            if let Some(context) = context {
                scope.set_extra("error_context", context);
            }
        },
        || sentry::capture_error(error),
    );
}
