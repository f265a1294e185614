//! ec2cluster Core
//!
//! Core types shared by the ec2cluster job client and the demo driver.
//!
//! This crate contains:
//! - Domain types: the job description submitted to the cluster service and
//!   the status snapshots it returns
//! - DTOs: the request/response envelopes used on the wire

pub mod domain;
pub mod dto;
