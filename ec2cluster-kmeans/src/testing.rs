//! Scripted `JobApi` used by the poller and workflow tests

use async_trait::async_trait;
use ec2cluster_client::{ClientError, JobApi, JobDescription, JobState, JobStatus};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const JOB_ID: &str = "42";

/// One scripted answer to `fetch`
pub(crate) enum Reply {
    Status(JobState, Option<&'static str>),
    Timeout,
    Fail(u16),
}

/// Answers `submit` with a pending job and `fetch` from a script.
///
/// Once the script runs out every fetch reports the job as pending.
pub(crate) struct ScriptedJobs {
    replies: Mutex<VecDeque<Reply>>,
    fetches: AtomicUsize,
    submitted: Mutex<Vec<JobDescription>>,
    cancelled: Mutex<Vec<String>>,
}

impl ScriptedJobs {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fetches: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<JobDescription> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobApi for ScriptedJobs {
    async fn submit(&self, job: &JobDescription) -> Result<JobStatus, ClientError> {
        self.submitted.lock().unwrap().push(job.clone());
        Ok(JobStatus::new(JOB_ID, JobState::Pending, None))
    }

    async fn fetch(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Status(state, progress)) => {
                Ok(JobStatus::new(job_id, state, progress.map(String::from)))
            }
            Some(Reply::Timeout) => Err(ClientError::Timeout("operation timed out".to_string())),
            Some(Reply::Fail(status)) => Err(ClientError::api_error(status, "scripted failure")),
            None => Ok(JobStatus::new(job_id, JobState::Pending, None)),
        }
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}
