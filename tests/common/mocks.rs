use async_trait::async_trait;
use onprem_context::storage::{BucketStatus, ObjectStore, StoredObject};
use onprem_context::{AppError, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How the mock store answers a bucket creation
#[derive(Debug, Clone)]
pub enum BucketResponse {
    Status(BucketStatus),
    Error { code: String, status: u16 },
}

/// Recorded `put_object_file` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub bucket: String,
    pub key: String,
    pub contents: Vec<u8>,
}

/// In-memory object store
pub struct MockObjectStore {
    bucket_response: Arc<RwLock<BucketResponse>>,
    put_error: Arc<RwLock<Option<String>>>,
    buckets_requested: Arc<RwLock<Vec<String>>>,
    puts: Arc<RwLock<Vec<PutCall>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            bucket_response: Arc::new(RwLock::new(BucketResponse::Status(BucketStatus::Created))),
            put_error: Arc::new(RwLock::new(None)),
            buckets_requested: Arc::new(RwLock::new(Vec::new())),
            puts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_bucket_response(&self, response: BucketResponse) {
        *self.bucket_response.write().await = response;
    }

    pub async fn fail_puts_with(&self, code: &str) {
        *self.put_error.write().await = Some(code.to_string());
    }

    pub async fn buckets_requested(&self) -> Vec<String> {
        self.buckets_requested.read().await.clone()
    }

    pub async fn puts(&self) -> Vec<PutCall> {
        self.puts.read().await.clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn make_bucket(&self, bucket: &str) -> Result<BucketStatus> {
        self.buckets_requested.write().await.push(bucket.to_string());

        match self.bucket_response.read().await.clone() {
            BucketResponse::Status(status) => Ok(status),
            BucketResponse::Error { code, status } => {
                Err(AppError::storage(code, "mock bucket failure", status))
            }
        }
    }

    async fn put_object_file(&self, bucket: &str, key: &str, path: &Path) -> Result<StoredObject> {
        if let Some(code) = self.put_error.read().await.clone() {
            return Err(AppError::storage(code, "mock upload failure", 500));
        }

        let contents = tokio::fs::read(path).await?;
        let size_bytes = contents.len() as u64;
        self.puts.write().await.push(PutCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            contents,
        });

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            etag: Some("mock-etag".to_string()),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
