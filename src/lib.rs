//! On-prem build-context source
//!
//! Uploads a local build-context archive to an S3-compatible object store and
//! renders the Kubernetes pod that fetches it and builds an image with kaniko.

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod kubernetes;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use builder::{BuildOutcome, ClusterBuilder};
pub use config::{ContextSourceConfig, StorageConfig};
pub use context::{ContextSource, OnPremContextSource, UploadedContext};
pub use error::{AppError, Result};
pub use storage::{BucketStatus, MinioClient, ObjectStore};
