//! # Collaborator interfaces: staging object store and target archive
//!
//! This module defines the two traits the pipeline depends on, together with
//! their plain request/response types and error enums.
//!
//! ## Interface & extensibility
//! - Implement [`ObjectStore`] for a storage backend (the crate ships an S3
//!   client in [`crate::store`] and an in-process map for tests and local
//!   experiments).
//! - Implement [`Archive`] for an upload destination (the crate ships the
//!   Internet Archive client in [`crate::archive`]).
//! - All methods are async and return typed errors so callers can tell a
//!   transient remote failure from a misconfiguration.
//!
//! ## Mocking & testing
//! - Both traits are annotated for `mockall`, so consumers can generate
//!   deterministic mocks for unit and integration tests.

use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::metadata::MetadataMap;

/// One object in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{context}: {message}")]
    Api { context: String, message: String },
}

impl StoreError {
    pub fn api(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        StoreError::Api {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

/// Object storage by bucket and key.
///
/// Buckets are addressed by name on every call; an implementation holds only
/// its connection state. `rename` is copy-then-delete, matching what the
/// backing stores actually provide.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object in the bucket, with its size in bytes.
    async fn list_all(&self, bucket: &str) -> Result<Vec<ObjectEntry>, StoreError>;

    /// The full contents of one object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or replace one object.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>)
        -> Result<(), StoreError>;

    /// Remove the given objects in one batch request. Keys that do not exist
    /// are not an error.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), StoreError>;

    /// Replace `old_key` with an identical object under `new_key`.
    async fn rename(&self, bucket: &str, old_key: &str, new_key: &str)
        -> Result<(), StoreError>;

    /// The number of objects whose key starts with `key_or_prefix`.
    async fn count_matching(&self, bucket: &str, key_or_prefix: &str)
        -> Result<usize, StoreError>;
}

/// Handle for a located (or about-to-be-created) archive item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    pub identifier: String,
}

/// Outcome of one part of an archive upload. `method` and `url` describe the
/// request for dry-run display.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub ok: bool,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("missing archive credential: {0}")]
    Credentials(&'static str),
    #[error("archive request failed: {0}")]
    Api(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload destination for processed submissions.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Archive: Send + Sync {
    /// Locate the archive item filed under `identifier`, creating it if the
    /// archive requires an explicit creation step.
    async fn get_or_create_item(&self, identifier: &str) -> Result<ItemHandle, ArchiveError>;

    /// Upload one local file and its metadata to the item, returning one
    /// result per transmitted part.
    async fn upload(
        &self,
        item: &ItemHandle,
        file: &Path,
        metadata: &MetadataMap,
    ) -> Result<Vec<UploadPart>, ArchiveError>;
}
