//! Job-related API endpoints

use async_trait::async_trait;
use ec2cluster_core::domain::job::{JobDescription, JobStatus};
use ec2cluster_core::dto::job::JobEnvelope;
use tracing::debug;

use crate::error::Result;
use crate::{ClusterClient, JobApi};

impl ClusterClient {
    fn job_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}.json", self.base_url, job_id)
    }

    fn flag_unexpected_fields(status: &JobStatus) {
        let unexpected = status.unexpected_fields();
        if !unexpected.is_empty() {
            debug!(
                "Ignoring unexpected fields in job {} response: {}",
                status.id,
                unexpected.join(", ")
            );
        }
    }
}

#[async_trait]
impl JobApi for ClusterClient {
    /// Submit a job description
    ///
    /// # Arguments
    /// * `job` - The job description
    ///
    /// # Returns
    /// The created job's id with its initial state and progress
    async fn submit(&self, job: &JobDescription) -> Result<JobStatus> {
        let url = format!("{}/jobs.json", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.auth.user, Some(&self.auth.password))
            .json(&JobEnvelope::new(job))
            .send()
            .await?;

        let status: JobStatus = self.handle_response(response).await?;
        Self::flag_unexpected_fields(&status);
        Ok(status)
    }

    /// Get the current status of a job
    ///
    /// # Arguments
    /// * `job_id` - The id returned by `submit`
    async fn fetch(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.job_url(job_id))
            .basic_auth(&self.auth.user, Some(&self.auth.password))
            .send()
            .await?;

        let status: JobStatus = self.handle_response(response).await?;
        Self::flag_unexpected_fields(&status);
        Ok(status)
    }

    /// Send the cancel directive for a job
    ///
    /// # Arguments
    /// * `job_id` - The id returned by `submit`
    async fn cancel(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/jobs/{}/cancel.json", self.base_url, job_id);
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.auth.user, Some(&self.auth.password))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
