//! Internet Archive client.
//!
//! Uploads go through the archive's S3-like endpoint: one `PUT` per file,
//! with the item metadata carried as `x-archive-meta-*` headers. Items come
//! into existence with their first upload, so `get_or_create_item` is a
//! lookup plus an instruction to auto-create on upload.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::contract::{Archive, ArchiveError, ItemHandle, UploadPart};
use crate::metadata::{MetadataMap, MetadataValue};

const DEFAULT_ENDPOINT: &str = "https://s3.us.archive.org";

/// Client for the archive's S3-like upload API.
///
/// Credentials are read from the environment at construction
/// (`IA_ACCESS`/`IA_SECRET`); they are only required once an actual upload is
/// attempted, so control actions and dry runs work without them.
pub struct IaClient {
    http: reqwest::Client,
    endpoint: String,
    access: Option<String>,
    secret: Option<String>,
    dry_run: bool,
}

impl IaClient {
    pub fn from_env(dry_run: bool) -> Self {
        IaClient {
            http: reqwest::Client::new(),
            endpoint: std::env::var("IA_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            access: std::env::var("IA_ACCESS").ok(),
            secret: std::env::var("IA_SECRET").ok(),
            dry_run,
        }
    }

    fn authorization(&self) -> Result<String, ArchiveError> {
        let access = self
            .access
            .as_deref()
            .ok_or(ArchiveError::Credentials("IA_ACCESS"))?;
        let secret = self
            .secret
            .as_deref()
            .ok_or(ArchiveError::Credentials("IA_SECRET"))?;
        Ok(format!("LOW {access}:{secret}"))
    }

    /// Render metadata as `x-archive-meta-*` headers. Sequences enumerate as
    /// `x-archive-meta01-`, `x-archive-meta02-`, and so on.
    fn metadata_headers(metadata: &MetadataMap) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        for (field, value) in metadata {
            match value {
                MetadataValue::Text(text) => {
                    headers.push((format!("x-archive-meta-{field}"), text.clone()));
                }
                MetadataValue::Flag(flag) => {
                    headers.push((format!("x-archive-meta-{field}"), flag.to_string()));
                }
                MetadataValue::List(items) => {
                    for (index, item) in items.iter().enumerate() {
                        headers.push((
                            format!("x-archive-meta{:02}-{field}", index + 1),
                            item.clone(),
                        ));
                    }
                }
            }
        }
        headers
    }
}

#[async_trait]
impl Archive for IaClient {
    async fn get_or_create_item(&self, identifier: &str) -> Result<ItemHandle, ArchiveError> {
        if !self.dry_run {
            // Purely informational: the item is auto-created on upload.
            let url = format!("{}/{identifier}", self.endpoint);
            match self.http.head(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(identifier, "archive item exists");
                }
                Ok(_) => debug!(identifier, "archive item will be created on upload"),
                Err(error) => {
                    warn!(identifier, error = %error, "archive item lookup failed");
                }
            }
        }
        Ok(ItemHandle {
            identifier: identifier.to_string(),
        })
    }

    async fn upload(
        &self,
        item: &ItemHandle,
        file: &Path,
        metadata: &MetadataMap,
    ) -> Result<Vec<UploadPart>, ArchiveError> {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| item.identifier.clone());
        let url = format!("{}/{}/{}", self.endpoint, item.identifier, file_name);

        if self.dry_run {
            if let Ok(json) = serde_json::to_string(metadata) {
                debug!(identifier = %item.identifier, metadata = %json, "dry run metadata");
            }
            return Ok(vec![UploadPart {
                ok: true,
                method: "PUT".to_string(),
                url,
            }]);
        }

        let body = tokio::fs::read(file).await?;
        let mut request = self
            .http
            .put(&url)
            .header("authorization", self.authorization()?)
            .header("x-archive-queue-derive", "0")
            .header("x-archive-auto-make-bucket", "1");
        for (header, value) in Self::metadata_headers(metadata) {
            request = request.header(header, value);
        }
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| ArchiveError::Api(e.to_string()))?;
        let status = response.status();
        info!(identifier = %item.identifier, file = %file_name, status = %status, "archive upload finished");
        Ok(vec![UploadPart {
            ok: status.is_success(),
            method: "PUT".to_string(),
            url,
        }])
    }
}
