//! Bucket database handle: folder discovery and creation.

use std::sync::Arc;

use crate::client::BucketClient;
use crate::config::BucketConfig;
use crate::error::Result;
use crate::folder::{ArchiveLockPolicy, StudyFolder, UploadPolicy, MARKER_NAME};
use crate::list::{ListQuery, StorageEntry};

/// Key suffix that proves a logical folder exists.
pub const MARKER_SUFFIX: &str = "/config.json";

/// Top-level handle over one bucket of study folders. Cheap to clone;
/// the client and policy are shared read-only by every folder it
/// creates.
#[derive(Clone)]
pub struct BucketDb {
    client: Arc<BucketClient>,
    policy: Arc<dyn UploadPolicy>,
}

impl BucketDb {
    /// Handle with the default archive-lock upload policy.
    pub fn new(config: BucketConfig) -> Self {
        Self::with_policy(config, Arc::new(ArchiveLockPolicy))
    }

    /// Handle with a caller-supplied upload policy.
    pub fn with_policy(config: BucketConfig, policy: Arc<dyn UploadPolicy>) -> Self {
        Self {
            client: Arc::new(BucketClient::new(config)),
            policy,
        }
    }

    pub fn client(&self) -> Arc<BucketClient> {
        self.client.clone()
    }

    /// Discover folders by their marker objects. Each key ending in
    /// `/config.json` yields one folder named by the key minus that
    /// suffix, annotated with the marker's size and timestamp. An
    /// optional name narrows the listing to `{name}/`.
    pub async fn list_study_folders(&self, name: Option<&str>) -> Result<Vec<StudyFolder>> {
        let client = self.client.clone();
        let policy = self.policy.clone();
        let mut query = ListQuery::new()
            .filter(|entry: &StorageEntry| entry.key.ends_with(MARKER_SUFFIX))
            .map(move |entry: &StorageEntry| {
                let folder_name = entry
                    .key
                    .strip_suffix(MARKER_SUFFIX)
                    .unwrap_or(&entry.key)
                    .to_string();
                StudyFolder::existing(
                    folder_name,
                    entry.size,
                    entry.last_modified,
                    client.clone(),
                    policy.clone(),
                )
            });
        if let Some(name) = name {
            query = query.prefix(format!("{}/", name));
        }
        self.client.list(query).await
    }

    /// A folder that does not exist in storage yet. It becomes
    /// discoverable once its `config.json` marker is uploaded.
    pub fn new_folder(&self, name: &str) -> StudyFolder {
        StudyFolder::fresh(name.to_string(), self.client.clone(), self.policy.clone())
    }
}
