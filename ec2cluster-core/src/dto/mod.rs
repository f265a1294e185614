//! Data transfer objects for the job REST API

pub mod job;
