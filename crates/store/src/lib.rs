//! S3-backed study folder database.
//!
//! This crate presents a hierarchical "study folder" view over an
//! S3-compatible bucket: folders identified by a `config.json` marker
//! object, files searchable within a folder, and content-typed
//! download/upload. Every operation goes through a short-lived
//! presigned URL, so no long-lived credentials reach the transport
//! layer, and response bodies are normalized from whichever wire
//! format (XML or JSON) the service answered in.
//!
//! # Example
//!
//! ```rust,no_run
//! use store::{BucketConfig, BucketDb};
//!
//! # async fn example() -> Result<(), store::StoreError> {
//! let config: BucketConfig = serde_json::from_str(&std::fs::read_to_string("s3.json").unwrap())?;
//! let db = BucketDb::new(config);
//!
//! for folder in db.list_study_folders(None).await? {
//!     for file in folder.search(None).await? {
//!         println!("{}/{} ({} bytes)", folder.name, file.name, file.size);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod folder;
pub mod list;
pub mod payload;
pub mod safe;
pub mod signer;

pub use client::{BucketClient, FetchOptions};
pub use config::BucketConfig;
pub use db::{BucketDb, MARKER_SUFFIX};
pub use error::{Result, StoreError};
pub use folder::{
    AllowAll, ArchiveLockPolicy, FileContent, FileStat, ScopedLister, StudyFolder, UploadPolicy,
    UploadRequest, MARKER_NAME,
};
pub use list::{ListQuery, StorageEntry};
pub use payload::{Normalized, Payload};
pub use signer::StorageOp;
