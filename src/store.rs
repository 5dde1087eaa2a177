//! Object store implementations and the bucket naming convention.
//!
//! [`S3Store`] is a thin client over the AWS SDK; [`MemoryStore`] holds its
//! buckets in-process and backs the integration tests. Which one a caller
//! gets is decided once, at construction, and everything downstream works
//! through the [`ObjectStore`] trait.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::config::{DEF_DEPLOYMENT, DEF_REPO, REPO_TABLE};
use crate::contract::{ObjectEntry, ObjectStore, StoreError};

/// The S3 bucket associated with a member repository in a deployment.
///
/// `emma` itself maps to the aggregate storage area; repository codes map to
/// their outbound queue. An unrecognised repository is matched against the
/// descriptive names before being used literally.
pub fn bucket_name(repo: &str, deployment: &str) -> String {
    let repo = if repo.is_empty() {
        DEF_REPO.to_string()
    } else {
        repo.to_lowercase()
    };
    let area = if repo == "emma" {
        "storage".to_string()
    } else if REPO_TABLE.iter().any(|(code, _)| *code == repo) {
        format!("{repo}-queue")
    } else {
        let code = REPO_TABLE
            .iter()
            .find(|(_, name)| repo.contains(name))
            .map(|(code, _)| (*code).to_string())
            .unwrap_or(repo);
        format!("{code}-queue")
    };
    let deployment = if deployment.is_empty() {
        DEF_DEPLOYMENT.to_string()
    } else {
        deployment.to_lowercase()
    };
    format!("emma-{area}-{deployment}")
}

/// The prefix of an object key: either empty or a string ending in `/`.
pub fn prefix_of(key: &str) -> String {
    match key.rfind('/') {
        Some(slash) => key[..=slash].to_string(),
        None => String::new(),
    }
}

/// Which object keys discovery considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Any prefix is acceptable.
    Any,
    /// Only keys without a prefix.
    TopLevel,
    /// Only keys directly under the given prefix.
    Under(String),
}

impl KeyPrefix {
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            KeyPrefix::Any => true,
            KeyPrefix::TopLevel => prefix_of(key).is_empty(),
            KeyPrefix::Under(prefix) if prefix.is_empty() => prefix_of(key).is_empty(),
            KeyPrefix::Under(prefix) => {
                if prefix.ends_with('/') {
                    prefix_of(key) == *prefix
                } else {
                    prefix_of(key) == format!("{prefix}/")
                }
            }
        }
    }
}

/// Thin client over the AWS S3 SDK.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        S3Store { client }
    }

    /// Build a client from the ambient AWS environment (credentials chain,
    /// region, endpoint overrides).
    pub async fn from_env() -> Self {
        let sdk_config =
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        S3Store {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_all(&self, bucket: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| StoreError::api(format!("list {bucket}"), e))?;
            for object in response.contents() {
                if let Some(key) = object.key() {
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0).max(0) as u64,
                    });
                }
            }
            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(entries)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::api(format!("get {bucket}/{key}"), e))?;
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::api(format!("read {bucket}/{key}"), e))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::api(format!("put {bucket}/{key}"), e))?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut identifiers = Vec::with_capacity(keys.len());
        for key in keys {
            let identifier = ObjectIdentifier::builder()
                .key(key.as_str())
                .build()
                .map_err(|e| StoreError::api(format!("delete {bucket}"), e))?;
            identifiers.push(identifier);
        }
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| StoreError::api(format!("delete {bucket}"), e))?;
        self.client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StoreError::api(format!("delete {bucket}"), e))?;
        Ok(())
    }

    async fn rename(
        &self,
        bucket: &str,
        old_key: &str,
        new_key: &str,
    ) -> Result<(), StoreError> {
        self.client
            .copy_object()
            .bucket(bucket)
            .key(new_key)
            .copy_source(format!("{bucket}/{old_key}"))
            .send()
            .await
            .map_err(|e| StoreError::api(format!("copy {bucket}/{old_key}"), e))?;
        self.client
            .delete_object()
            .bucket(bucket)
            .key(old_key)
            .send()
            .await
            .map_err(|e| StoreError::api(format!("delete {bucket}/{old_key}"), e))?;
        Ok(())
    }

    async fn count_matching(
        &self,
        bucket: &str,
        key_or_prefix: &str,
    ) -> Result<usize, StoreError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(key_or_prefix)
            .send()
            .await
            .map_err(|e| StoreError::api(format!("count {bucket}/{key_or_prefix}"), e))?;
        Ok(response.key_count().unwrap_or(0).max(0) as usize)
    }
}

/// In-process object store: buckets are maps from key to bytes. Buckets come
/// into existence on first write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store pre-seeded with the given objects in one bucket.
    pub fn with_objects(bucket: &str, objects: &[(&str, &[u8])]) -> Self {
        let store = MemoryStore::new();
        for (key, body) in objects {
            store.insert(bucket, key, body.to_vec());
        }
        store
    }

    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body);
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.lock()
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, BTreeMap<String, Vec<u8>>>> {
        self.buckets.lock().expect("bucket map lock poisoned")
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_all(&self, bucket: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        Ok(self
            .lock()
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(key, body)| ObjectEntry {
                        key: key.clone(),
                        size: body.len() as u64,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{key}")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), StoreError> {
        let mut buckets = self.lock();
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn rename(
        &self,
        bucket: &str,
        old_key: &str,
        new_key: &str,
    ) -> Result<(), StoreError> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{old_key}")))?;
        let body = objects
            .remove(old_key)
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{old_key}")))?;
        objects.insert(new_key.to_string(), body);
        Ok(())
    }

    async fn count_matching(
        &self,
        bucket: &str,
        key_or_prefix: &str,
    ) -> Result<usize, StoreError> {
        Ok(self
            .lock()
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|key| key.starts_with(key_or_prefix))
                    .count()
            })
            .unwrap_or(0))
    }
}
