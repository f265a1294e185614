//! Demo workflow
//!
//! Runs the whole job in order: make sure both buckets exist, upload the
//! inputs, submit the job, wait for it, and download the results. Each step
//! runs only after the previous one succeeded. Nothing is rolled back when a
//! later step fails; files already uploaded and jobs already submitted stay
//! where they are.

use anyhow::{Context, Result};
use ec2cluster_client::{JobApi, JobDescription, JobStatus};
use ec2cluster_storage::{BucketStatus, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::demo::JobPlan;
use crate::poller::{JobPoller, PollOutcome, PollSettings};

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub job_id: String,
    /// `bucket/key` of every uploaded input, in upload order
    pub remote_inputs: Vec<String>,
    /// Local paths of the downloaded outputs
    pub downloaded: Vec<PathBuf>,
}

/// Sequences the object store and the job service for one run
pub struct Workflow<'a> {
    config: &'a Config,
    store: Arc<dyn ObjectStore>,
    jobs: Arc<dyn JobApi>,
    /// Directory inputs are read from and outputs are written under
    workdir: PathBuf,
    poll: PollSettings,
}

impl<'a> Workflow<'a> {
    pub fn new(
        config: &'a Config,
        store: Arc<dyn ObjectStore>,
        jobs: Arc<dyn JobApi>,
        workdir: impl Into<PathBuf>,
        poll: PollSettings,
    ) -> Self {
        Self {
            config,
            store,
            jobs,
            workdir: workdir.into(),
            poll,
        }
    }

    /// Runs every step for `plan`, writing results under `out_path`
    ///
    /// `out_path` is the `output/<timestamp>/` prefix used both as the remote
    /// key prefix in the output bucket and as the local output directory.
    pub async fn run(&self, plan: &JobPlan, out_path: &str) -> Result<RunReport> {
        self.ensure_buckets().await?;

        let remote_inputs = self.stage_inputs(&plan.inputs).await?;

        let job = self.build_job(plan, &remote_inputs, out_path);
        let submitted = self.submit(&job).await?;
        let job_id = submitted.id.clone();

        let poller = JobPoller::new(Arc::clone(&self.jobs), self.poll);
        let outcome = poller
            .wait_for_completion(submitted)
            .await
            .with_context(|| format!("Failed while waiting for job {}", job_id))?;

        if let PollOutcome::TimedOut { last, waited } = outcome {
            info!("Cancelling job {}", job_id);
            if let Err(e) = self.jobs.cancel(&job_id).await {
                warn!("Failed to cancel job {}: {}", job_id, e);
            }
            anyhow::bail!(
                "Job {} did not complete within {:?} (last state: {})",
                job_id,
                waited,
                last.state
            );
        }

        info!("Job complete, downloading results");
        let downloaded = self.fetch_outputs(out_path, &plan.expected_outputs).await?;

        Ok(RunReport {
            job_id,
            remote_inputs,
            downloaded,
        })
    }

    /// Creates the input and output buckets unless they already exist
    pub async fn ensure_buckets(&self) -> Result<()> {
        info!("Creating buckets...");
        for bucket in [&self.config.inputbucket, &self.config.outputbucket] {
            let status = self
                .store
                .ensure_bucket(bucket)
                .await
                .with_context(|| format!("Failed to create bucket {}", bucket))?;

            if status == BucketStatus::AlreadyPresent {
                info!("{} bucket already exists...", bucket);
            }
        }
        Ok(())
    }

    /// Uploads each input under its own relative path as the key
    ///
    /// # Returns
    /// `inputbucket/path` for each input, in the given order
    pub async fn stage_inputs(&self, inputs: &[String]) -> Result<Vec<String>> {
        info!("Uploading {} file(s)", inputs.len());
        let bucket = &self.config.inputbucket;
        let mut remote = Vec::with_capacity(inputs.len());

        for input in inputs {
            info!("uploading: {}", input);
            self.store
                .upload(bucket, input, &self.workdir.join(input))
                .await
                .with_context(|| format!("Failed to upload {}", input))?;
            remote.push(format!("{}/{}", bucket, input));
        }

        Ok(remote)
    }

    /// Builds the job description referencing the staged inputs
    pub fn build_job(&self, plan: &JobPlan, remote_inputs: &[String], out_path: &str) -> JobDescription {
        let mut options = plan.options.clone();
        if options.keypair.is_none() {
            options.keypair = self.config.keypair.clone();
        }

        JobDescription {
            name: plan.name.clone(),
            description: plan.description.clone(),
            input_files: remote_inputs.to_vec(),
            commands: plan.commands.clone(),
            output_files: plan.expected_outputs.clone(),
            output_path: format!("{}/{}", self.config.outputbucket, out_path),
            number_of_instances: plan.number_of_instances,
            instance_type: plan.instance_type.clone(),
            options,
        }
    }

    async fn submit(&self, job: &JobDescription) -> Result<JobStatus> {
        info!("Submitting job {:?}", job.name);
        let status = self
            .jobs
            .submit(job)
            .await
            .context("Failed to submit job")?;

        info!("Job ID: {}", status.id);
        info!("State: {}", status.state);
        if let Some(progress) = &status.progress {
            info!("Progress: {}", progress);
        }

        Ok(status)
    }

    /// Downloads each expected output from `outputbucket/out_path`
    ///
    /// # Returns
    /// The local path written for each output
    pub async fn fetch_outputs(&self, out_path: &str, outputs: &[String]) -> Result<Vec<PathBuf>> {
        let bucket = &self.config.outputbucket;
        let local_dir = self.workdir.join(out_path);
        let mut written = Vec::with_capacity(outputs.len());

        for output in outputs {
            info!("fetching: {}", output);
            let key = format!("{}{}", out_path, output);
            let local_path = local_dir.join(output);
            self.store
                .download(bucket, &key, &local_path)
                .await
                .with_context(|| format!("Failed to download {}/{}", bucket, key))?;
            written.push(local_path);
        }

        Ok(written)
    }
}
