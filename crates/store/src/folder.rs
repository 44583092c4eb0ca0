//! Study folders: named namespaces inside the bucket.
//!
//! A folder never observes keys outside its own `{name}/` prefix; the
//! scoped lister rewrites every sub-query before it reaches the
//! bucket client.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::client::{BucketClient, FetchOptions};
use crate::error::{Result, StoreError};
use crate::list::{parse_storage_error, ListQuery, StorageEntry};
use crate::safe::expect_safe_object;
use crate::signer::StorageOp;

/// The configuration marker object every logical folder contains.
pub const MARKER_NAME: &str = "config.json";

/// Decoded file content, selected by extension.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl FileContent {
    /// Materialize into the exact bytes a PUT will carry.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            FileContent::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
            FileContent::Text(text) => Ok(Bytes::from(text.into_bytes())),
            FileContent::Binary(bytes) => Ok(bytes),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FileContent::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeKind {
    Json,
    Text,
    Binary,
}

/// Closed allow-list: anything not named here is a hard error, not a
/// best-effort guess.
const HANDLERS: [(&str, DecodeKind); 4] = [
    (".json", DecodeKind::Json),
    (".txt", DecodeKind::Text),
    (".md", DecodeKind::Text),
    (".zip", DecodeKind::Binary),
];

fn decode_kind(name: &str) -> Option<DecodeKind> {
    HANDLERS
        .iter()
        .find(|(ext, _)| name.ends_with(ext))
        .map(|(_, kind)| *kind)
}

/// One file in a folder's search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub name: String,
    pub size: u64,
}

/// Pre-upload policy hook. Runs before any network I/O; a rejection
/// propagates to the caller unchanged and the upload never starts.
#[async_trait::async_trait]
pub trait UploadPolicy: Send + Sync {
    async fn check(&self, folder: &StudyFolder, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Policy that accepts every upload.
pub struct AllowAll;

#[async_trait::async_trait]
impl UploadPolicy for AllowAll {
    async fn check(&self, _folder: &StudyFolder, _name: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Locks a folder's configuration once results exist: `config.json`
/// may not be replaced while the folder holds any `.zip` archive, and
/// must always carry valid JSON. Everything else passes.
pub struct ArchiveLockPolicy;

#[async_trait::async_trait]
impl UploadPolicy for ArchiveLockPolicy {
    async fn check(&self, folder: &StudyFolder, name: &str, bytes: &[u8]) -> Result<()> {
        if name != MARKER_NAME {
            return Ok(());
        }
        serde_json::from_slice::<Value>(bytes).map_err(|_| {
            StoreError::PolicyViolation(format!("{} must contain valid JSON", MARKER_NAME))
        })?;
        let files = folder.search(None).await?;
        if files.iter().any(|f| f.name.ends_with(".zip")) {
            return Err(StoreError::PolicyViolation(format!(
                "{} is locked: folder {} already contains result archives",
                MARKER_NAME, folder.name
            )));
        }
        Ok(())
    }
}

/// Explicit record binding the bucket client to a pre-bound namespace
/// prefix. Sub-queries can only narrow it, never escape it.
#[derive(Clone)]
pub struct ScopedLister {
    client: Arc<BucketClient>,
    prefix: String,
}

impl ScopedLister {
    pub fn new(client: Arc<BucketClient>, folder_name: &str) -> Self {
        Self {
            client,
            prefix: format!("{}/", folder_name),
        }
    }

    pub async fn list<T>(&self, query: ListQuery<T>) -> Result<Vec<T>> {
        self.client.list(query.scoped(&self.prefix)).await
    }
}

/// Upload payload: target file name plus its content.
#[derive(Debug)]
pub struct UploadRequest {
    pub name: String,
    pub content: FileContent,
}

/// A named folder inside the bucket. Immutable after construction;
/// discovered folders carry the marker object's size and timestamp,
/// fresh ones carry neither.
#[derive(Clone)]
pub struct StudyFolder {
    pub name: String,
    pub size: Option<u64>,
    pub dated: Option<OffsetDateTime>,
    scope: ScopedLister,
    client: Arc<BucketClient>,
    policy: Arc<dyn UploadPolicy>,
}

impl std::fmt::Debug for StudyFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyFolder")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("dated", &self.dated)
            .finish()
    }
}

impl StudyFolder {
    /// Folder discovered in storage via its marker object.
    pub(crate) fn existing(
        name: String,
        size: u64,
        dated: Option<OffsetDateTime>,
        client: Arc<BucketClient>,
        policy: Arc<dyn UploadPolicy>,
    ) -> Self {
        let scope = ScopedLister::new(client.clone(), &name);
        Self {
            name,
            size: Some(size),
            dated,
            scope,
            client,
            policy,
        }
    }

    /// Folder not yet present in storage.
    pub(crate) fn fresh(
        name: String,
        client: Arc<BucketClient>,
        policy: Arc<dyn UploadPolicy>,
    ) -> Self {
        let scope = ScopedLister::new(client.clone(), &name);
        Self {
            name,
            size: None,
            dated: None,
            scope,
            client,
            policy,
        }
    }

    fn key_for(&self, name: &str) -> String {
        format!("{}/{}", self.name, name)
    }

    /// List files under this folder, optionally narrowed by `prefix`,
    /// each reduced to its final path segment and size. Order is the
    /// storage service's key order.
    pub async fn search(&self, prefix: Option<&str>) -> Result<Vec<FileStat>> {
        let mut query = ListQuery::new().map(|entry: &StorageEntry| FileStat {
            name: basename(&entry.key).to_string(),
            size: entry.size,
        });
        if let Some(prefix) = prefix {
            query = query.prefix(prefix);
        }
        self.scope.list(query).await
    }

    /// Download one file, decoded according to the extension
    /// allow-list: `.json` to a structured value, `.txt`/`.md` to a
    /// string, `.zip` to raw bytes. Text files must be valid UTF-8;
    /// invalid bytes fail with [`StoreError::Utf8`], never a lossy
    /// decode.
    pub async fn download(&self, name: &str) -> Result<FileContent> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument(
                "name[string] required".to_string(),
            ));
        }
        let kind = decode_kind(name).ok_or_else(|| {
            StoreError::Unsupported(format!("download unimplemented for {}", name))
        })?;

        let key = self.key_for(name);
        let op = StorageOp::Get { key: key.clone() };
        let response = self.client.fetch_raw(&op, FetchOptions::default()).await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(key));
        }
        if !status.is_success() {
            return Err(StoreError::DownloadFailed(name.to_string()));
        }

        let bytes = response.bytes().await?;
        match kind {
            DecodeKind::Json => {
                let value: Value = serde_json::from_slice(&bytes)?;
                expect_safe_object(&value)?;
                Ok(FileContent::Json(value))
            }
            DecodeKind::Text => String::from_utf8(bytes.to_vec())
                .map(FileContent::Text)
                .map_err(|_| StoreError::Utf8(name.to_string())),
            DecodeKind::Binary => Ok(FileContent::Binary(bytes)),
        }
    }

    /// Upload one file via a single signed PUT. The policy hook runs
    /// first; on rejection no network I/O happens.
    pub async fn upload(&self, request: UploadRequest) -> Result<()> {
        if request.name.is_empty() {
            return Err(StoreError::InvalidArgument(
                "name[string] required".to_string(),
            ));
        }
        let bytes = request.content.into_bytes()?;
        self.policy.check(self, &request.name, &bytes).await?;

        let op = StorageOp::Put {
            key: self.key_for(&request.name),
        };
        let options = FetchOptions {
            headers: vec![("Content-Length".to_string(), bytes.len().to_string())],
            body: Some(bytes),
        };
        let normalized = self.client.fetch(&op, options).await?;
        if !normalized.ok {
            return Err(match parse_storage_error(&normalized.payload) {
                Some((code, message)) => StoreError::Storage { code, message },
                None => StoreError::Storage {
                    code: "UploadFailed".to_string(),
                    message: format!("upload failed for {}", request.name),
                },
            });
        }
        Ok(())
    }
}

fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_kind_allow_list() {
        assert_eq!(decode_kind("config.json"), Some(DecodeKind::Json));
        assert_eq!(decode_kind("notes.txt"), Some(DecodeKind::Text));
        assert_eq!(decode_kind("README.md"), Some(DecodeKind::Text));
        assert_eq!(decode_kind("20201004T001600.zip"), Some(DecodeKind::Binary));
        assert_eq!(decode_kind("bull.crap"), None);
        assert_eq!(decode_kind("archive.tar.gz"), None);
        // Extension match needs the dot
        assert_eq!(decode_kind("json"), None);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("Intro-1/config.json"), "config.json");
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("plain"), "plain");
    }

    #[test]
    fn test_file_content_into_bytes() {
        let bytes = FileContent::Json(json!({"name": "test123"}))
            .into_bytes()
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&bytes).unwrap(),
            json!({"name": "test123"})
        );

        let bytes = FileContent::Text("hello".to_string()).into_bytes().unwrap();
        assert_eq!(&bytes[..], b"hello");

        let raw = Bytes::from_static(b"PK\x03\x04");
        assert_eq!(
            FileContent::Binary(raw.clone()).into_bytes().unwrap(),
            raw
        );
    }
}
