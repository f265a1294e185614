//! Job DTOs for the cluster REST API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body root element (`{"job": {...}}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope<T> {
    pub job: T,
}

impl<T> JobEnvelope<T> {
    pub fn new(job: T) -> Self {
        Self { job }
    }
}

/// Decodes a job resource from a response body, with or without the `job` root element
///
/// The service has answered both ways depending on its serializer settings.
/// Decode errors come from the resource itself, not from the envelope.
pub fn decode_job_body<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
    let mut value: Value = serde_json::from_slice(body)?;

    if let Value::Object(map) = &mut value {
        if map.len() == 1 {
            if let Some(job) = map.remove("job") {
                return serde_json::from_value(job);
            }
        }
    }

    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobState, JobStatus};
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_enveloped_and_bare_responses_decode_alike() {
        let enveloped: JobStatus =
            decode_job_body(&body(json!({"job": {"id": 42, "state": "pending"}}))).unwrap();
        let bare: JobStatus =
            decode_job_body(&body(json!({"id": 42, "state": "pending"}))).unwrap();

        assert_eq!(enveloped.id, "42");
        assert_eq!(enveloped.state, JobState::Pending);
        assert_eq!(enveloped, bare);
    }

    #[test]
    fn test_enveloped_decode_error_names_the_missing_field() {
        let err = decode_job_body::<JobStatus>(&body(json!({"job": {"id": 42}}))).unwrap_err();
        assert!(err.to_string().contains("missing field `state`"), "{}", err);
    }

    #[test]
    fn test_bare_decode_error_names_the_missing_field() {
        let err = decode_job_body::<JobStatus>(&body(json!({"state": "pending"}))).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"), "{}", err);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(decode_job_body::<JobStatus>(b"<job></job>").is_err());
    }

    #[test]
    fn test_envelope_serializes_root_element() {
        let body = serde_json::to_value(JobEnvelope::new(json!({"name": "demo"}))).unwrap();
        assert_eq!(body, json!({"job": {"name": "demo"}}));
    }
}
