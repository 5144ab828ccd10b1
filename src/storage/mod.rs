//! Object storage for uploaded build contexts
//!
//! The context source talks to an S3-compatible store (MinIO on-prem) through
//! the [`ObjectStore`] trait; [`MinioClient`] is the HTTP implementation.

pub mod minio;
pub mod sigv4;
pub mod traits;

pub use minio::MinioClient;
pub use traits::{BucketStatus, ObjectStore, StoredObject};
