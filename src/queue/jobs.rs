//! Job definitions and the in-process dispatch channel

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::common::generate_job_id;

/// Background work, serialized as `{"type": "...", "product_id": n}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Fired after a product is created; fans out into the two jobs below
    NewProductNotify { product_id: i64 },
    SendNewProductMail { product_id: i64 },
    NotifyAdmins { product_id: i64 },
    ProductPublish { product_id: i64 },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::NewProductNotify { .. } => "new_product_notify",
            Job::SendNewProductMail { .. } => "send_new_product_mail",
            Job::NotifyAdmins { .. } => "notify_admins",
            Job::ProductPublish { .. } => "product_publish",
        }
    }

    pub fn product_id(&self) -> i64 {
        match self {
            Job::NewProductNotify { product_id }
            | Job::SendNewProductMail { product_id }
            | Job::NotifyAdmins { product_id }
            | Job::ProductPublish { product_id } => *product_id,
        }
    }
}

/// A job together with its queue identity
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: String,
    pub job: Job,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Sending half of the job channel; cheap to clone into handlers
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: UnboundedSender<QueuedJob>,
}

/// Receiving half, owned by the worker
#[derive(Debug)]
pub struct JobReceiver {
    rx: UnboundedReceiver<QueuedJob>,
}

/// Creates a connected queue and receiver
pub fn channel() -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (JobQueue { tx }, JobReceiver { rx })
}

impl JobQueue {
    /// Enqueues a job without waiting for it to run
    pub fn dispatch(&self, job: Job) -> Result<String, QueueError> {
        let id = generate_job_id();
        let name = job.name();

        self.tx
            .send(QueuedJob {
                id: id.clone(),
                job,
            })
            .map_err(|_| {
                error!(job_id = %id, job = name, "Failed to dispatch job: queue closed");
                QueueError::Closed
            })?;

        debug!(job_id = %id, job = name, "Job dispatched");
        Ok(id)
    }
}

impl JobReceiver {
    pub async fn recv(&mut self) -> Option<QueuedJob> {
        self.rx.recv().await
    }

    /// Next job if one is waiting; `None` when the queue is empty or closed
    pub fn try_recv(&mut self) -> Option<QueuedJob> {
        match self.rx.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
