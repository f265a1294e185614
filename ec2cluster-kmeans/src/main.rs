//! ec2cluster k-means demo
//!
//! Uploads the k-means MPI sources and input data to S3, submits a job to an
//! ec2cluster REST service, waits for it to finish, then downloads the
//! cluster assignments and centres.
//!
//! Architecture:
//! - Configuration: credentials, endpoint and buckets from `config.yml`
//! - Demo: the job plan (inputs, commands, expected outputs)
//! - Poller: status polling with a deadline
//! - Workflow: sequences buckets, uploads, submission, polling and downloads

mod config;
mod demo;
mod poller;
mod workflow;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::demo::{JobPlan, output_path_for};
use crate::workflow::Workflow;
use ec2cluster_client::{ClusterClient, JobApi};
use ec2cluster_storage::{ObjectStore, S3ObjectStore};

#[derive(Parser)]
#[command(name = "ec2cluster-kmeans")]
#[command(about = "Run the k-means MPI demo on an ec2cluster service", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "EC2CLUSTER_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Directory holding `input/` and `code/`; results go under `output/` here
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Seconds to wait for the job before cancelling it (overrides max_wait_secs)
    #[arg(long, value_name = "SECS")]
    max_wait: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ec2cluster_kmeans=info,ec2cluster_client=info,ec2cluster_storage=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(secs) = cli.max_wait {
        config.max_wait_secs = secs;
    }
    config.validate()?;
    info!(
        "Loaded configuration: rest_url={}, inputbucket={}, outputbucket={}",
        config.rest_url, config.inputbucket, config.outputbucket
    );

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(config.s3_settings()).await);
    let jobs: Arc<dyn JobApi> = Arc::new(
        ClusterClient::new(&config.rest_url, config.basic_auth(), config.request_timeout())
            .context("Failed to create job client")?,
    );

    let plan = JobPlan::kmeans();
    let out_path = output_path_for(&chrono::Local::now());

    let workflow = Workflow::new(&config, store, jobs, cli.workdir, config.poll_settings());
    let report = workflow.run(&plan, &out_path).await?;

    info!(
        "Job {} finished using inputs: {}",
        report.job_id,
        report.remote_inputs.join(" ")
    );
    info!(
        "{} result file(s) written under {}",
        report.downloaded.len(),
        out_path
    );
    for path in &report.downloaded {
        info!("  - {}", path.display());
    }

    Ok(())
}
