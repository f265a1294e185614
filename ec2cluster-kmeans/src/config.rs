//! Demo configuration
//!
//! Credentials, the job service endpoint and bucket names are read once at
//! startup from a YAML file (`config.yml` by default). The resulting `Config`
//! is passed by reference to everything that needs it.

use anyhow::{Context, Result};
use ec2cluster_client::BasicAuth;
use ec2cluster_storage::{S3Credentials, S3Settings};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::poller::PollSettings;

/// Demo configuration
///
/// The first seven fields are required and have no defaults. The remaining
/// settings may be left out of the file.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,

    /// Bucket that receives the input files and code
    pub inputbucket: String,

    /// Bucket the job writes its results to
    pub outputbucket: String,

    /// Base URL of the job REST service
    pub rest_url: String,

    pub admin_user: String,
    pub admin_password: String,

    /// EC2 keypair passed through to the cluster, if set
    #[serde(default)]
    pub keypair: Option<String>,

    #[serde(default = "default_aws_region")]
    pub aws_region: String,

    /// Endpoint override for S3-compatible stores
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    /// Delay between job status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Timeout applied to each REST call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long to wait for the job before cancelling it
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Loads configuration from a YAML file
    ///
    /// Fails if the file is missing, is not valid YAML, or lacks a required key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parses configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse configuration")
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("aws_access_key_id", &self.aws_access_key_id),
            ("aws_secret_access_key", &self.aws_secret_access_key),
            ("inputbucket", &self.inputbucket),
            ("outputbucket", &self.outputbucket),
            ("rest_url", &self.rest_url),
            ("admin_user", &self.admin_user),
            ("admin_password", &self.admin_password),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", key);
            }
        }

        if !self.rest_url.starts_with("http://") && !self.rest_url.starts_with("https://") {
            anyhow::bail!("rest_url must start with http:// or https://");
        }

        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.max_wait_secs == 0 {
            anyhow::bail!("max_wait_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Some(Duration::from_secs(self.max_wait_secs)),
        }
    }

    pub fn basic_auth(&self) -> BasicAuth {
        BasicAuth::new(&self.admin_user, &self.admin_password)
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            region: self.aws_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            credentials: Some(S3Credentials {
                access_key_id: self.aws_access_key_id.clone(),
                secret_access_key: self.aws_secret_access_key.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("inputbucket", &self.inputbucket)
            .field("outputbucket", &self.outputbucket)
            .field("rest_url", &self.rest_url)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"<redacted>")
            .field("keypair", &self.keypair)
            .field("aws_region", &self.aws_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_wait_secs", &self.max_wait_secs)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
aws_access_key_id: AKIDEXAMPLE
aws_secret_access_key: wJalrXUtnFEMI
inputbucket: in-1
outputbucket: out-1
rest_url: http://ec2cluster.example.com
admin_user: admin
admin_password: secret
"#;

    pub(crate) fn sample_config() -> Config {
        Config::from_yaml_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_required_keys_and_defaults() {
        let config = sample_config();

        assert_eq!(config.inputbucket, "in-1");
        assert_eq!(config.outputbucket, "out-1");
        assert_eq!(config.keypair, None);
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));

        let poll = config.poll_settings();
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_wait, Some(Duration::from_secs(86_400)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_keys() {
        let yaml = format!(
            "{}keypair: gsg-keypair\ns3_endpoint: http://localhost:9000\nmax_wait_secs: 600\n",
            SAMPLE
        );
        let config = Config::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.keypair.as_deref(), Some("gsg-keypair"));
        assert_eq!(
            config.s3_settings().endpoint.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(
            config.poll_settings().max_wait,
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_missing_required_key_fails() {
        let yaml = SAMPLE.replace("admin_password: secret\n", "");
        let err = Config::from_yaml_str(&yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("admin_password"));
    }

    #[test]
    fn test_malformed_yaml_fails() {
        assert!(Config::from_yaml_str("rest_url: [unterminated").is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        let err = Config::load("/nonexistent/config.yml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/config.yml"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rest_url, "http://ec2cluster.example.com");
    }

    #[test]
    fn test_config_validation() {
        let mut config = sample_config();

        config.inputbucket = String::new();
        assert!(config.validate().is_err());
        config.inputbucket = "in-1".to_string();

        config.rest_url = "ec2cluster.example.com".to_string();
        assert!(config.validate().is_err());
        config.rest_url = "https://ec2cluster.example.com".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", sample_config());
        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("wJalrXUtnFEMI"));
        assert!(!rendered.contains("secret\""));
    }
}
