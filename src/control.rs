//! Pause/resume control for a member-repository/deployment pair.
//!
//! Processing is gated by a sentinel object in the aggregate storage bucket:
//! while `control/paused-{repo}-{deployment}` exists, the pair's queue is not
//! processed. Pausing prefers renaming the previous active marker back into
//! the paused key so the pair keeps a single control object; clearing removes
//! both keys and returns the pair to its initial, active state.

use tracing::{debug, error, info};

use crate::contract::ObjectStore;
use crate::store::bucket_name;

fn paused_key(repo: &str, deployment: &str) -> String {
    format!("control/paused-{repo}-{deployment}")
}

fn active_key(repo: &str, deployment: &str) -> String {
    format!("control/active-{repo}-{deployment}")
}

/// Sentinel manager over any object store.
pub struct Controller<'a, S: ObjectStore> {
    store: &'a S,
}

impl<'a, S: ObjectStore> Controller<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Controller { store }
    }

    /// The control bucket and sentinel keys for a pair. Control objects
    /// always live in the aggregate storage bucket, not the queue bucket.
    fn sentinel(&self, repo: &str, deployment: &str) -> (String, String, String) {
        let repo = repo.to_lowercase();
        let deployment = deployment.to_lowercase();
        (
            bucket_name("emma", &deployment),
            paused_key(&repo, &deployment),
            active_key(&repo, &deployment),
        )
    }

    /// Whether processing for the pair is currently paused. Existence is a
    /// prefix count so that a transient listing failure reads as "absent".
    pub async fn is_paused(&self, repo: &str, deployment: &str) -> bool {
        let (bucket, paused, _) = self.sentinel(repo, deployment);
        match self.store.count_matching(&bucket, &paused).await {
            Ok(count) => count > 0,
            Err(err) => {
                error!(bucket = %bucket, key = %paused, error = %err, "pause state check failed");
                false
            }
        }
    }

    /// Halt processing for the pair. Never fails the caller: if the active
    /// marker cannot be renamed into place, a fresh paused key is created.
    pub async fn pause(&self, repo: &str, deployment: &str) {
        let (bucket, paused, active) = self.sentinel(repo, deployment);
        match self.store.rename(&bucket, &active, &paused).await {
            Ok(()) => info!(bucket = %bucket, key = %paused, "paused (renamed active marker)"),
            Err(err) => {
                debug!(bucket = %bucket, key = %active, error = %err, "no active marker to rename");
                info!(bucket = %bucket, key = %paused, "creating pause sentinel");
                if let Err(err) = self.store.put_object(&bucket, &paused, Vec::new()).await {
                    error!(bucket = %bucket, key = %paused, error = %err, "failed to create pause sentinel");
                }
            }
        }
    }

    /// Allow processing again, leaving an active marker behind. A missing
    /// paused key makes this a no-op.
    pub async fn resume(&self, repo: &str, deployment: &str) {
        let (bucket, paused, active) = self.sentinel(repo, deployment);
        match self.store.rename(&bucket, &paused, &active).await {
            Ok(()) => info!(bucket = %bucket, key = %active, "resumed"),
            Err(err) => debug!(bucket = %bucket, key = %paused, error = %err, "nothing to resume"),
        }
    }

    /// Remove both sentinel objects, returning the pair to its initial
    /// active state.
    pub async fn clear(&self, repo: &str, deployment: &str) {
        let (bucket, paused, active) = self.sentinel(repo, deployment);
        if let Err(err) = self.store.delete_objects(&bucket, &[paused, active]).await {
            error!(bucket = %bucket, error = %err, "failed to clear control sentinels");
        }
    }
}
