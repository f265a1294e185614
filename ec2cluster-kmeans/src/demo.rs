//! The k-means MPI demo job
//!
//! `code/Simple_Kmeans.zip` holds the MPI C source; `code/run_kmeans.sh`
//! unzips, compiles and runs it on every node of the cluster.

use chrono::{DateTime, TimeZone};
use ec2cluster_core::domain::job::JobOptions;

/// What to upload, what to run, and what to collect afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub name: String,
    pub description: String,
    /// Local paths, relative to the working directory; also used as object keys
    pub inputs: Vec<String>,
    pub commands: Vec<String>,
    /// Files the job writes; may include a path relative to the job's working directory
    pub expected_outputs: Vec<String>,
    pub number_of_instances: u32,
    pub instance_type: String,
    pub options: JobOptions,
}

impl JobPlan {
    pub fn kmeans() -> Self {
        Self {
            name: "Kmeans demo".to_string(),
            description: "Simple Kmeans C MPI example".to_string(),
            inputs: vec![
                "input/color100.txt".to_string(),
                "code/Simple_Kmeans.zip".to_string(),
                "code/run_kmeans.sh".to_string(),
            ],
            commands: vec!["bash run_kmeans.sh".to_string()],
            expected_outputs: vec![
                "color100.txt.membership".to_string(),
                "color100.txt.cluster_centres".to_string(),
            ],
            number_of_instances: 3,
            instance_type: "m1.small".to_string(),
            options: JobOptions::default(),
        }
    }
}

/// Output prefix for a run started at `time`: `output/<MMDDYYHHmm>/`
pub fn output_path_for<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("output/{}/", time.format("%m%d%y%H%M"))
}
