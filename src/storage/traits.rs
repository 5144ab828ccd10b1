use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// S3 error code returned when the caller already owns the bucket.
pub const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
/// S3 error code returned when another account owns the bucket.
pub const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";

/// Outcome of an idempotent bucket creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketStatus {
    Created,
    AlreadyOwned,
    AlreadyExists,
}

impl BucketStatus {
    /// Map a benign S3 error code onto a status, `None` for real failures.
    pub fn from_error_code(code: &str) -> Option<Self> {
        match code {
            BUCKET_ALREADY_OWNED_BY_YOU => Some(BucketStatus::AlreadyOwned),
            BUCKET_ALREADY_EXISTS => Some(BucketStatus::AlreadyExists),
            _ => None,
        }
    }
}

impl std::fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketStatus::Created => write!(f, "created"),
            BucketStatus::AlreadyOwned => write!(f, "already owned"),
            BucketStatus::AlreadyExists => write!(f, "already exists"),
        }
    }
}

/// Metadata of an object written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
}

impl StoredObject {
    /// `s3://<bucket>/<key>`
    pub fn url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Object-store operations the context source depends on
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create `bucket`, treating "already owned" and "already exists" as success.
    async fn make_bucket(&self, bucket: &str) -> Result<BucketStatus>;

    /// Upload the file at `path` as `bucket/key`.
    async fn put_object_file(&self, bucket: &str, key: &str, path: &Path) -> Result<StoredObject>;

    /// Store name used in logs
    fn name(&self) -> &str;
}
