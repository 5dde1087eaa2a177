#![doc = "emma-ia-transfer: EMMA to Internet Archive submission transfer."]

//! This crate moves submission information packages out of the EMMA staging
//! buckets on AWS S3, translates their metadata into the Internet Archive
//! schema, uploads file and metadata to the archive, and removes successfully
//! transmitted submissions from staging.
//!
//! Processing of a member-repository/deployment pair can be halted externally
//! through a control sentinel object; see [`control`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod contract;
pub mod control;
pub mod metadata;
pub mod package;
pub mod pipeline;
pub mod runner;
pub mod store;
pub mod submission;
pub mod translate;
