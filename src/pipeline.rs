//! The submission pipeline: discover staged submissions in one bucket, parse
//! their packages, translate and upload them to the archive, and remove the
//! completed ones from staging.
//!
//! # Stages
//! - [`discover`]: group the bucket listing into a [`SubmissionTable`]
//! - parse: fetch each package object and extract EMMA metadata
//! - upload: translate metadata, download the data file to a temporary copy,
//!   transmit file and metadata to the archive
//! - cleanup: batch-delete the objects of completed submissions
//!
//! # Failure policy
//! One submission failing to parse, download or upload is logged and left
//! incomplete; the run continues and the submission stays in staging for the
//! next invocation (at-least-once delivery). Only two things abort a run: a
//! failed bucket listing (there is nothing to iterate) and a translation
//! value outside its fixed table (a contract violation, not a runtime
//! condition).
//!
//! In dry-run mode the translation and local download still happen, the
//! archive client only renders what it would send, and nothing is deleted.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::RunOptions;
use crate::contract::{Archive, ObjectStore, StoreError};
use crate::metadata::{MetadataMap, MetadataValue};
use crate::package::parse_package;
use crate::store::KeyPrefix;
use crate::submission::SubmissionTable;
use crate::translate::{self, TranslateError, TARGET_IDENTIFIER_FIELD};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Retrieve all submissions present in a staging bucket, grouping object
/// keys by submission identifier.
pub async fn discover<S: ObjectStore>(
    store: &S,
    bucket: &str,
    filter: &KeyPrefix,
) -> Result<SubmissionTable, StoreError> {
    let mut table = SubmissionTable::new();
    for entry in store.list_all(bucket).await? {
        if filter.accepts(&entry.key) {
            table.insert_key(&entry.key);
        }
    }
    debug!(bucket = %bucket, submissions = table.len(), "bucket contents grouped");
    Ok(table)
}

/// For each submission with a package and no metadata yet, download the
/// package object and extract its metadata values.
async fn parse_stage<S: ObjectStore>(store: &S, bucket: &str, table: &mut SubmissionTable) {
    for (sid, submission) in table.iter_mut() {
        if submission.metadata.is_some() {
            continue;
        }
        let Some(package_key) = submission.package_key.clone() else {
            debug!(submission = %sid, "no package discovered; nothing to parse");
            continue;
        };
        let bytes = match store.get_object(bucket, &package_key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(submission = %sid, key = %package_key, error = %err, "failed to fetch package");
                continue;
            }
        };
        match parse_package(&bytes) {
            Ok(metadata) => {
                debug!(submission = %sid, fields = metadata.len(), "package parsed");
                submission.metadata = Some(metadata);
            }
            Err(err) => {
                error!(submission = %sid, key = %package_key, error = %err, "failed to parse package");
            }
        }
    }
}

/// For each parsed submission, translate its metadata and transmit data file
/// plus metadata to the archive. Marks submissions completed only when every
/// part of the archive response reports success.
async fn upload_stage<S: ObjectStore, A: Archive>(
    store: &S,
    archive: &A,
    bucket: &str,
    table: &mut SubmissionTable,
    options: &RunOptions,
) -> Result<(), TranslateError> {
    for (sid, submission) in table.iter_mut() {
        let Some(source) = submission.metadata.as_ref() else {
            continue;
        };

        let metadata = translate::translate(source)?;
        let Some(target_id) = target_identifier(&metadata) else {
            error!(submission = %sid, "empty emma_repositoryRecordId; skipping upload");
            continue;
        };
        let Some(data_key) = submission.data_key.clone() else {
            error!(submission = %sid, "no data file discovered; skipping upload");
            continue;
        };

        let bytes = match store.get_object(bucket, &data_key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(submission = %sid, key = %data_key, error = %err, "failed to fetch data file");
                continue;
            }
        };
        let local = match local_copy(&target_id, &bytes).await {
            Ok(local) => local,
            Err(err) => {
                error!(submission = %sid, key = %data_key, error = %err, "failed to stage data file locally");
                continue;
            }
        };

        // When the split is requested, only file-level fields travel with
        // the upload; the title half is surfaced for inspection.
        let payload = if options.split_file_metadata {
            let (title, file) = translate::split_file_level(&metadata);
            debug!(submission = %sid, fields = title.len(), "title-level metadata withheld from file upload");
            file
        } else {
            metadata.clone()
        };

        info!(
            submission = %sid,
            identifier = %target_id,
            file = %data_key,
            size = bytes.len(),
            dry_run = options.dry_run,
            "submitting data file to archive"
        );

        let item = match archive.get_or_create_item(&target_id).await {
            Ok(item) => item,
            Err(err) => {
                error!(submission = %sid, identifier = %target_id, error = %err, "failed to locate archive item");
                continue;
            }
        };
        match archive.upload(&item, local.path(), &payload).await {
            Ok(parts) => {
                if options.dry_run {
                    for part in &parts {
                        info!(method = %part.method, url = %part.url, "dry run: would send");
                    }
                }
                let expected = 1;
                let succeeded = parts.len() == expected
                    && (options.dry_run || parts.iter().all(|part| part.ok));
                if !succeeded {
                    error!(submission = %sid, identifier = %target_id, "archive reported upload failure");
                }
                submission.completed = succeeded;
            }
            Err(err) => {
                error!(submission = %sid, identifier = %target_id, error = %err, "upload failed");
            }
        }
        // The temporary copy is dropped here, success or failure.
    }
    Ok(())
}

/// Remove the objects of completed submissions from staging, returning the
/// affected keys. Dry runs report eligibility without deleting.
async fn cleanup_stage<S: ObjectStore>(
    store: &S,
    bucket: &str,
    table: &SubmissionTable,
    dry_run: bool,
) -> Vec<String> {
    let mut keys = Vec::new();
    for (_, submission) in table.iter() {
        if submission.completed {
            keys.extend(submission.keys());
        }
    }
    if keys.is_empty() {
        debug!(bucket = %bucket, "no completed submissions to remove");
        return keys;
    }
    if dry_run {
        info!(bucket = %bucket, keys = ?keys, "dry run: objects eligible for deletion");
    } else {
        info!(bucket = %bucket, keys = ?keys, "deleting processed objects");
        if let Err(err) = store.delete_objects(bucket, &keys).await {
            error!(bucket = %bucket, error = %err, "failed to delete processed objects");
        }
    }
    keys
}

/// Run the full pipeline against one staging bucket. The result is the
/// number of completed submissions, counted by their package objects.
pub async fn process<S: ObjectStore, A: Archive>(
    store: &S,
    archive: &A,
    bucket: &str,
    options: &RunOptions,
) -> Result<usize, PipelineError> {
    let mut table = discover(store, bucket, &options.prefix).await?;
    parse_stage(store, bucket, &mut table).await;
    upload_stage(store, archive, bucket, &mut table, options).await?;
    let removed = cleanup_stage(store, bucket, &table, options.dry_run).await;
    Ok(removed.iter().filter(|key| key.ends_with(".xml")).count())
}

/// The archive identifier a submission files under, from its translated
/// metadata.
fn target_identifier(metadata: &MetadataMap) -> Option<String> {
    match metadata.get(TARGET_IDENTIFIER_FIELD) {
        Some(value) if value.is_present() => match value {
            MetadataValue::Text(text) => Some(text.clone()),
            MetadataValue::List(items) => items.first().cloned(),
            MetadataValue::Flag(flag) => Some(flag.to_string()),
        },
        _ => None,
    }
}

/// Write the data-file bytes to a named temporary file for the upload
/// attempt. The file is removed when the returned handle drops.
async fn local_copy(
    identifier: &str,
    bytes: &[u8],
) -> std::io::Result<tempfile::NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{identifier}_emma_"))
        .tempfile()?;
    tokio::fs::write(file.path(), bytes).await?;
    Ok(file)
}
