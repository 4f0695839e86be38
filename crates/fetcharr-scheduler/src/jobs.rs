// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use anyhow::Result;
use fetcharr_application::QueueService;

use crate::job::{Job, JobContext, JobResult};

/// Periodic poll of all download clients feeding queue reconciliation.
/// Refresh isolates per-client failures itself, so the job as a whole only
/// fails on internal errors.
pub struct QueueRefreshJob {
    queue: Arc<QueueService>,
}

impl QueueRefreshJob {
    pub fn new(queue: Arc<QueueService>) -> Self {
        Self { queue }
    }
}

#[async_trait::async_trait]
impl Job for QueueRefreshJob {
    fn job_type(&self) -> &'static str {
        "queue_refresh"
    }

    fn name(&self) -> String {
        "Refresh download queue".to_string()
    }

    async fn execute(&self, _ctx: JobContext) -> Result<JobResult> {
        self.queue.refresh().await;
        Ok(JobResult::Success)
    }
}
