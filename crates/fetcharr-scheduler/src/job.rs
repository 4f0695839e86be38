// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;

/// Context handed to a job for one attempt. `attempt` starts at 1 and
/// increments across retries of the same scheduled run.
#[derive(Clone)]
pub struct JobContext {
    pub job_id: String,
    pub attempt: u32,
    pub scheduled_at: DateTime<Utc>,
}

impl JobContext {
    pub fn new(job_id: impl Into<String>, attempt: u32) -> Self {
        Self {
            job_id: job_id.into(),
            attempt,
            scheduled_at: Utc::now(),
        }
    }
}

/// Outcome of one attempt. A failure marked `retry` is re-run until the
/// job's retry budget is spent.
#[derive(Debug)]
pub enum JobResult {
    Success,
    Failure { error: String, retry: bool },
}

/// A schedulable unit of background work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn job_type(&self) -> &'static str;

    fn name(&self) -> String;

    async fn execute(&self, ctx: JobContext) -> Result<JobResult>;

    /// Additional attempts allowed after a retriable failure.
    fn max_retries(&self) -> u32 {
        0
    }

    /// Backoff between retries.
    fn retry_delay_seconds(&self) -> u64 {
        30
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}, {:?})", self.job_type(), self.name())
    }
}
