//! Job domain types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Description of a batch job submitted to the cluster service
///
/// Built once by the driver and submitted once. The file lists are kept as
/// vectors locally and flattened into the string form the service expects
/// when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescription {
    pub name: String,
    pub description: String,
    /// Object-store references (`bucket/key`) staged before submission
    #[serde(serialize_with = "join_spaced")]
    pub input_files: Vec<String>,
    /// Shell commands run on the master node
    #[serde(serialize_with = "join_lines")]
    pub commands: Vec<String>,
    /// File names the job is expected to produce
    #[serde(serialize_with = "join_spaced")]
    pub output_files: Vec<String>,
    /// `bucket/prefix/` the service writes results under
    pub output_path: String,
    pub number_of_instances: u32,
    pub instance_type: String,
    #[serde(flatten)]
    pub options: JobOptions,
}

/// Optional cluster settings; unset fields are left off the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_ami: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_ami: Option<String>,
    /// Space-separated list of extra packages installed on every node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_packages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypair: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpi_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_after_complete: Option<bool>,
}

#[allow(clippy::ptr_arg)]
fn join_spaced<S: Serializer>(items: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join(" "))
}

#[allow(clippy::ptr_arg)]
fn join_lines<S: Serializer>(items: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join("\n"))
}

/// Job state as reported by the cluster service
///
/// Only `Complete` ends the polling loop. States this client does not know
/// about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Cancelled,
    Failed,
    Other(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Complete => "complete",
            JobState::Cancelled => "cancelled",
            JobState::Failed => "failed",
            JobState::Other(s) => s,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, JobState::Complete)
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => JobState::Pending,
            "running" => JobState::Running,
            "complete" => JobState::Complete,
            "cancelled" => JobState::Cancelled,
            "failed" => JobState::Failed,
            _ => JobState::Other(s),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a remote job
///
/// The service owns the job record; this is whatever the last response said.
/// Only `id`, `state` and `progress` are read. Any other field in the response
/// is remembered by name so callers can flag it, but its value is not exposed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStatus {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub state: JobState,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(flatten)]
    unexpected: BTreeMap<String, serde_json::Value>,
}

impl JobStatus {
    pub fn new(id: impl Into<String>, state: JobState, progress: Option<String>) -> Self {
        Self {
            id: id.into(),
            state,
            progress,
            unexpected: BTreeMap::new(),
        }
    }

    /// Names of response fields outside the documented `id`/`state`/`progress` set
    pub fn unexpected_fields(&self) -> Vec<&str> {
        self.unexpected.keys().map(String::as_str).collect()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn description(inputs: Vec<&str>, outputs: Vec<&str>) -> JobDescription {
        JobDescription {
            name: "Kmeans demo".to_string(),
            description: "Simple Kmeans C MPI example".to_string(),
            input_files: inputs.into_iter().map(String::from).collect(),
            commands: vec!["bash run_kmeans.sh".to_string()],
            output_files: outputs.into_iter().map(String::from).collect(),
            output_path: "out-1/output/0101240000/".to_string(),
            number_of_instances: 3,
            instance_type: "m1.small".to_string(),
            options: JobOptions::default(),
        }
    }

    #[test]
    fn test_file_lists_serialize_space_joined() {
        let job = description(
            vec!["in-1/input/a.txt", "in-1/code/run.sh"],
            vec!["a.out", "b.out"],
        );
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["input_files"], "in-1/input/a.txt in-1/code/run.sh");
        assert_eq!(value["output_files"], "a.out b.out");
        assert_eq!(value["commands"], "bash run_kmeans.sh");
    }

    #[test]
    fn test_empty_lists_still_serialize_with_instance_fields() {
        let job = description(vec![], vec![]);
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["input_files"], "");
        assert_eq!(value["output_files"], "");
        assert_eq!(value["number_of_instances"], 3);
        assert_eq!(value["instance_type"], "m1.small");
    }

    #[test]
    fn test_unset_options_are_omitted() {
        let mut job = description(vec![], vec![]);
        job.options.keypair = Some("gsg-keypair".to_string());
        job.options.shutdown_after_complete = Some(false);
        let value = serde_json::to_value(&job).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(value["keypair"], "gsg-keypair");
        assert_eq!(value["shutdown_after_complete"], false);
        assert!(!object.contains_key("master_ami"));
        assert!(!object.contains_key("options"));
    }

    #[test]
    fn test_multiple_commands_join_with_newlines() {
        let mut job = description(vec![], vec![]);
        job.commands = vec!["unzip code.zip".to_string(), "make".to_string()];
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["commands"], "unzip code.zip\nmake");
    }

    #[test]
    fn test_job_state_parsing() {
        assert_eq!(JobState::from("pending".to_string()), JobState::Pending);
        assert_eq!(JobState::from("complete".to_string()), JobState::Complete);
        assert_eq!(
            JobState::from("launching_instances".to_string()),
            JobState::Other("launching_instances".to_string())
        );
        assert!(JobState::Complete.is_complete());
        assert!(!JobState::Failed.is_complete());
        assert!(!JobState::Other("complete ".to_string()).is_complete());
    }

    #[test]
    fn test_job_state_round_trips_unknown_values() {
        let state: JobState = serde_json::from_value(json!("configuring_cluster")).unwrap();
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("configuring_cluster"));
        assert_eq!(state.to_string(), "configuring_cluster");
    }

    #[test]
    fn test_status_accepts_numeric_and_string_ids() {
        let numeric: JobStatus =
            serde_json::from_value(json!({"id": 42, "state": "pending", "progress": null})).unwrap();
        let text: JobStatus =
            serde_json::from_value(json!({"id": "42", "state": "pending"})).unwrap();

        assert_eq!(numeric.id, "42");
        assert_eq!(numeric.progress, None);
        assert_eq!(numeric, text);
    }

    #[test]
    fn test_status_flags_unexpected_fields() {
        let status: JobStatus = serde_json::from_value(json!({
            "id": 7,
            "state": "running",
            "progress": "configuring cluster",
            "created_at": "2009-05-01T10:00:00Z",
            "master_hostname": "ip-10-0-0-1"
        }))
        .unwrap();

        assert_eq!(status.state, JobState::Running);
        assert_eq!(status.progress.as_deref(), Some("configuring cluster"));
        assert_eq!(status.unexpected_fields(), vec!["created_at", "master_hostname"]);
    }

    #[test]
    fn test_status_without_state_is_rejected() {
        let result: Result<JobStatus, _> = serde_json::from_value(json!({"id": 1}));
        assert!(result.is_err());
    }
}
