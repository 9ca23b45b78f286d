//! # Queue Module
//!
//! In-process background jobs: product notifications and publishing.
//! Handlers dispatch through [`JobQueue`]; [`run_worker`] executes them.

pub mod jobs;
pub mod worker;

#[cfg(test)]
mod tests;

pub use jobs::{channel, Job, JobQueue, JobReceiver, QueueError, QueuedJob};
pub use worker::{process_job, run_worker, JobContext, JobError, RetryPolicy};
