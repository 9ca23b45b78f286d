//! Job worker
//!
//! Each received job runs on its own task. Failures are retried with
//! exponential backoff; permanent failures and exhausted jobs are written
//! to `failed_jobs` and reported.

use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::jobs::{Job, JobQueue, JobReceiver, QueueError, QueuedJob};
use crate::notifications::services::notify_admins;
use crate::products::models::Product;
use crate::products::services::{ProductError, ProductsService, PublishError};
use crate::services::mailer::{MailError, Mailer};
use crate::services::monitoring;
use crate::services::MailTemplates;

/// Backoff never grows past this
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum JobError {
    #[error("product {0} no longer exists")]
    ProductMissing(i64),

    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl JobError {
    /// Errors that cannot succeed on retry
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            JobError::ProductMissing(_)
                | JobError::Mail(MailError::Template(_))
                | JobError::Mail(MailError::NotConfigured(_))
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Everything a job handler may touch
#[derive(Clone)]
pub struct JobContext {
    pub db: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub templates: MailTemplates,
    pub queue: JobQueue,
    /// Recipient of the new product email
    pub notify_email: String,
    pub retry: RetryPolicy,
}

/// Runs until every sender is dropped
pub async fn run_worker(mut receiver: JobReceiver, ctx: Arc<JobContext>) {
    info!("🧵 Job worker started");

    while let Some(queued) = receiver.recv().await {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            process_job(queued, &ctx).await;
        });
    }

    info!("Job worker stopped: queue closed");
}

/// Runs one job to completion, including retries and dead-lettering.
/// Returns whether it eventually succeeded.
pub async fn process_job(queued: QueuedJob, ctx: &JobContext) -> bool {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match handle(&queued.job, ctx).await {
            Ok(()) => {
                info!(
                    job_id = %queued.id,
                    job = queued.job.name(),
                    attempt = attempt,
                    "Job completed"
                );
                return true;
            }
            Err(e) if e.is_permanent() || attempt >= ctx.retry.max_attempts => {
                record_failure(ctx, &queued, &e, attempt).await;
                return false;
            }
            Err(e) => {
                let delay = ctx.retry.delay_for(attempt);
                warn!(
                    job_id = %queued.id,
                    job = queued.job.name(),
                    attempt = attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Job failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn handle(job: &Job, ctx: &JobContext) -> Result<(), JobError> {
    let products = ProductsService::new(ctx.db.clone());

    match job {
        Job::NewProductNotify { product_id } => {
            ensure_product(&products, *product_id).await?;
            ctx.queue.dispatch(Job::SendNewProductMail {
                product_id: *product_id,
            })?;
            ctx.queue.dispatch(Job::NotifyAdmins {
                product_id: *product_id,
            })?;
            Ok(())
        }
        Job::SendNewProductMail { product_id } => {
            let product = ensure_product(&products, *product_id).await?;
            let message = ctx.templates.new_product(&product, &ctx.notify_email)?;
            ctx.mailer.send(&message).await?;
            info!(
                product_id = product.id,
                mailer = ctx.mailer.name(),
                "New product mail sent"
            );
            Ok(())
        }
        Job::NotifyAdmins { product_id } => {
            let product = ensure_product(&products, *product_id).await?;
            let notified = notify_admins(&ctx.db, &product).await?;
            info!(product_id = product.id, admins = notified, "Admins notified");
            Ok(())
        }
        Job::ProductPublish { product_id } => match products.publish(*product_id).await {
            Ok(_) => Ok(()),
            Err(PublishError::AlreadyPublished) => {
                info!(product_id = *product_id, "Publish job skipped: already published");
                Ok(())
            }
            Err(PublishError::NotFound) => Err(JobError::ProductMissing(*product_id)),
            Err(PublishError::Database(e)) => Err(JobError::Database(e)),
        },
    }
}

async fn ensure_product(
    products: &ProductsService,
    product_id: i64,
) -> Result<Product, JobError> {
    products.find(product_id).await.map_err(|e| match e {
        ProductError::NotFound => JobError::ProductMissing(product_id),
        ProductError::Database(e) => JobError::Database(e),
    })
}

async fn record_failure(ctx: &JobContext, queued: &QueuedJob, err: &JobError, attempts: u32) {
    error!(
        job_id = %queued.id,
        job = queued.job.name(),
        attempts = attempts,
        permanent = err.is_permanent(),
        error = %err,
        "Job failed permanently"
    );

    let payload = serde_json::to_string(&queued.job).unwrap_or_default();
    if let Err(e) = sqlx::query(
        "INSERT INTO failed_jobs (job_id, payload, error, attempts) VALUES (?, ?, ?, ?)",
    )
    .bind(&queued.id)
    .bind(&payload)
    .bind(err.to_string())
    .bind(attempts as i64)
    .execute(&ctx.db)
    .await
    {
        error!(error = %e, job_id = %queued.id, "Failed to record failed job");
    }

    monitoring::log_error(
        err,
        Some(json!({
            "job_id": queued.id,
            "job": queued.job,
            "attempts": attempts,
        })),
    );
}

/// Processes queued jobs (and any they enqueue) until the queue is empty
#[cfg(test)]
pub(crate) async fn drain(receiver: &mut JobReceiver, ctx: &JobContext) -> usize {
    let mut processed = 0;
    while let Some(queued) = receiver.try_recv() {
        process_job(queued, ctx).await;
        processed += 1;
    }
    processed
}
