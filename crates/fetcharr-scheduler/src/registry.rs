// SPDX-License-Identifier: GPL-3.0-or-later
use crate::job::{Job, JobContext, JobResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

/// Job schedule configuration
#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    /// Run at fixed intervals
    Interval(Duration),
    /// Run once at startup
    Once,
}

struct Registration {
    job_id: String,
    job: Arc<dyn Job>,
    schedule: Schedule,
}

/// Holds registered jobs until `start` consumes the registry and spawns the
/// executor tasks. Concurrency across all jobs is capped by a semaphore.
pub struct JobRegistry {
    registrations: Vec<Registration>,
    max_concurrent: usize,
}

impl JobRegistry {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            registrations: Vec::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn register(
        &mut self,
        job_id: impl Into<String>,
        job: impl Job + 'static,
        schedule: Schedule,
    ) {
        let job_id = job_id.into();
        info!(target: "scheduler", %job_id, job_type = job.job_type(), "registering job");
        self.registrations.push(Registration {
            job_id,
            job: Arc::new(job),
            schedule,
        });
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Spawn an executor task per registered job and return.
    pub fn start(self) {
        info!(
            target: "scheduler",
            jobs = self.registrations.len(),
            max_concurrent = self.max_concurrent,
            "starting job registry"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        for registration in self.registrations {
            let semaphore = semaphore.clone();

            match registration.schedule {
                Schedule::Interval(period) => {
                    tokio::spawn(async move {
                        let mut ticker = interval(period);
                        loop {
                            ticker.tick().await;
                            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                                return;
                            };
                            let job = registration.job.clone();
                            let job_id = registration.job_id.clone();
                            tokio::spawn(async move {
                                let _permit = permit;
                                execute_job(&job_id, job).await;
                            });
                        }
                    });
                }
                Schedule::Once => {
                    tokio::spawn(async move {
                        if let Ok(_permit) = semaphore.acquire_owned().await {
                            execute_job(&registration.job_id, registration.job).await;
                        }
                    });
                }
            }
        }
    }
}

/// Run one job attempt plus any retries it asks for.
async fn execute_job(job_id: &str, job: Arc<dyn Job>) {
    let max_attempts = job.max_retries() + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let ctx = JobContext::new(job_id, attempt);

        let outcome = job.execute(ctx).await;

        match outcome {
            Ok(JobResult::Success) => {
                info!(
                    target: "scheduler",
                    %job_id,
                    job_type = job.job_type(),
                    attempt,
                    "job completed"
                );
                return;
            }
            Ok(JobResult::Failure { error, retry }) => {
                error!(
                    target: "scheduler",
                    %job_id,
                    job_type = job.job_type(),
                    attempt,
                    %error,
                    "job failed"
                );
                if !retry || attempt >= max_attempts {
                    return;
                }
            }
            Err(err) => {
                error!(
                    target: "scheduler",
                    %job_id,
                    job_type = job.job_type(),
                    attempt,
                    error = %err,
                    "job execution error"
                );
                if attempt >= max_attempts {
                    return;
                }
            }
        }

        let delay = Duration::from_secs(job.retry_delay_seconds());
        warn!(target: "scheduler", %job_id, ?delay, "retrying job after delay");
        tokio::time::sleep(delay).await;
    }
}
