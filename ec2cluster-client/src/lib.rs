//! ec2cluster HTTP Client
//!
//! A small, type-safe client for the ec2cluster job REST API.
//!
//! Jobs are a plain REST resource: created with `POST /jobs.json`, read with
//! `GET /jobs/{id}.json`, and cancelled with `PUT /jobs/{id}/cancel.json`.
//! Every call authenticates with HTTP basic auth and is bounded by a short
//! per-request timeout.
//!
//! # Example
//!
//! ```no_run
//! use ec2cluster_client::{BasicAuth, ClusterClient, DEFAULT_REQUEST_TIMEOUT, JobApi};
//!
//! # async fn example() -> ec2cluster_client::Result<()> {
//! let client = ClusterClient::new(
//!     "http://ec2cluster.example.com",
//!     BasicAuth::new("admin", "secret"),
//!     DEFAULT_REQUEST_TIMEOUT,
//! )?;
//!
//! let status = client.fetch("42").await?;
//! println!("Job {} is {}", status.id, status.state);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use ec2cluster_core::domain::job::{JobDescription, JobOptions, JobState, JobStatus};
pub use error::{ClientError, Result};

use async_trait::async_trait;
use ec2cluster_core::dto::job::decode_job_body;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Job operations offered by the cluster service
///
/// `ClusterClient` is the HTTP implementation; the trait exists so the
/// polling loop and the driver can be exercised against fakes.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submit a job description, returning the created job's id and initial state
    async fn submit(&self, job: &JobDescription) -> Result<JobStatus>;

    /// Fetch the current state and progress of a submitted job
    async fn fetch(&self, job_id: &str) -> Result<JobStatus>;

    /// Ask the service to cancel a job
    async fn cancel(&self, job_id: &str) -> Result<()>;
}

/// Credentials for the service's admin account
#[derive(Clone)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the ec2cluster job API
#[derive(Debug, Clone)]
pub struct ClusterClient {
    /// Base URL of the service (e.g., "http://ec2cluster.example.com")
    base_url: String,
    /// Admin credentials sent with every request
    auth: BasicAuth,
    /// HTTP client instance
    client: Client,
}

impl ClusterClient {
    /// Create a new client whose requests give up after `timeout`
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service
    /// * `auth` - Admin credentials
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, auth: BasicAuth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(base_url, auth, client)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, auth: BasicAuth, client: Client) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(ClientError::InvalidRequest(
                "base URL cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            auth,
            client,
        })
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize a JSON job resource
    ///
    /// Accepts the resource with or without its `job` root element.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;

        decode_job_body(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is ignored
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
