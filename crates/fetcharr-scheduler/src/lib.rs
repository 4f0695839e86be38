// SPDX-License-Identifier: GPL-3.0-or-later
pub mod job;
pub mod jobs;
pub mod registry;

pub use job::{Job, JobContext, JobResult};
pub use jobs::QueueRefreshJob;
pub use registry::{JobRegistry, Schedule};

use std::sync::Arc;

use fetcharr_application::QueueService;
use fetcharr_config::SchedulerConfig;
use tokio::time::Duration;

/// Wires the standard background jobs onto a registry.
pub struct Scheduler {
    registry: JobRegistry,
    queue_refresh_interval: Duration,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            registry: JobRegistry::new(config.max_concurrent_jobs),
            queue_refresh_interval: Duration::from_secs(
                config.queue_refresh_interval_secs.max(1),
            ),
        }
    }

    pub fn register_jobs(&mut self, queue: Arc<QueueService>) {
        let interval = self.queue_refresh_interval;
        self.registry.register(
            "queue_refresh",
            QueueRefreshJob::new(queue),
            Schedule::Interval(interval),
        );
    }

    pub fn start(self) {
        self.registry.start();
    }
}
