//! Job poller
//!
//! Waits for a submitted job by fetching its status at a fixed interval until
//! the service reports it complete. A fetch that times out is logged and the
//! loop carries on; any other client error ends the wait. The wait itself is
//! bounded by `PollSettings::max_wait`.

use ec2cluster_client::{ClientError, JobApi, JobStatus};
use std::sync::Arc;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

/// Polling cadence and deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between status checks
    pub interval: Duration,
    /// Give up once this much time has passed; `None` waits forever
    pub max_wait: Option<Duration>,
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The service reported the job complete
    Complete(JobStatus),
    /// `max_wait` elapsed first; `last` is the most recent snapshot
    TimedOut { last: JobStatus, waited: Duration },
}

/// Polls one job until it completes or the deadline passes
pub struct JobPoller {
    jobs: Arc<dyn JobApi>,
    settings: PollSettings,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(jobs: Arc<dyn JobApi>, settings: PollSettings) -> Self {
        Self { jobs, settings }
    }

    /// Waits for the job described by `initial` to complete
    ///
    /// `initial` is the snapshot returned on submission; if it is already
    /// complete no request is made.
    pub async fn wait_for_completion(&self, initial: JobStatus) -> Result<PollOutcome, ClientError> {
        let started = Instant::now();
        let job_id = initial.id.clone();
        let mut last = initial;

        if last.state.is_complete() {
            return Ok(PollOutcome::Complete(last));
        }

        info!(
            "Waiting for job {} to complete (interval: {:?})",
            job_id, self.settings.interval
        );

        loop {
            match self.jobs.fetch(&job_id).await {
                Ok(status) => {
                    log_status(&status);
                    last = status;
                }
                Err(e) if e.is_timeout() => {
                    warn!("Timed out calling REST server for job {}: {}", job_id, e);
                }
                Err(e) => return Err(e),
            }

            if last.state.is_complete() {
                info!("Job {} complete", job_id);
                return Ok(PollOutcome::Complete(last));
            }

            let waited = started.elapsed();
            if let Some(max_wait) = self.settings.max_wait {
                if waited >= max_wait {
                    warn!(
                        "Job {} still {} after {:?}, giving up",
                        job_id, last.state, waited
                    );
                    return Ok(PollOutcome::TimedOut { last, waited });
                }
            }

            time::sleep(self.settings.interval).await;
        }
    }
}

fn log_status(status: &JobStatus) {
    match &status.progress {
        Some(progress) => info!("[State]: {} [Progress]: {}", status.state, progress),
        None => debug!("[State]: {}", status.state),
    }
}
