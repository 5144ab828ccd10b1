//! MinIO / S3 client
//!
//! Talks the S3 REST API with path-style addressing and SigV4 header signing.
//! Only the two calls the context source needs are implemented.

use super::sigv4::{self, SigningParams};
use super::traits::{BucketStatus, ObjectStore, StoredObject};
use crate::config::{StorageConfig, DEFAULT_REGION};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Method};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

/// Largest object S3 accepts in a single `PUT` (5 GiB).
pub const MAX_SINGLE_PUT_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// S3-compatible object-store client
pub struct MinioClient {
    http: reqwest::Client,
    base_url: url::Url,
    access_key: String,
    secret_key: SecretString,
    region: String,
}

impl MinioClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        debug!("🪣 MinIO client configured for {}", base_url);

        Ok(Self {
            http,
            base_url,
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region: config.region.clone(),
        })
    }

    /// Value of the `Host` header the HTTP client will send.
    fn host_header(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn bucket_uri(bucket: &str) -> String {
        format!("/{}", urlencoding::encode(bucket))
    }

    fn object_uri(bucket: &str, key: &str) -> String {
        format!("/{}/{}", urlencoding::encode(bucket), sigv4::encode_key(key))
    }

    async fn send_signed(
        &self,
        method: Method,
        canonical_uri: &str,
        body: Body,
        content_length: u64,
        payload_hash: String,
    ) -> Result<reqwest::Response> {
        let amz_date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let headers = vec![
            ("host".to_string(), self.host_header()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];

        let params = SigningParams {
            access_key: &self.access_key,
            secret_key: self.secret_key.expose_secret(),
            region: &self.region,
            amz_date: &amz_date,
        };
        let authorization = sigv4::authorization_header(
            &params,
            method.as_str(),
            canonical_uri,
            "",
            &headers,
            &payload_hash,
        );

        let url = format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            canonical_uri
        );
        debug!("📡 {} {}", method, url);

        let response = self
            .http
            .request(method, url)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, content_length)
            .body(body)
            .send()
            .await?;

        Ok(response)
    }

    /// `CreateBucketConfiguration` body; empty for the default region.
    fn create_bucket_body(&self) -> Vec<u8> {
        if self.region.is_empty() || self.region == DEFAULT_REGION {
            return Vec::new();
        }

        format!(
            "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
            self.region
        )
        .into_bytes()
    }
}

/// Turn a non-success S3 response into a storage error.
async fn error_from_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let code = extract_xml_element(&body, "Code")
        .unwrap_or_else(|| format!("Http{}", status.as_u16()));
    let message = extract_xml_element(&body, "Message").unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    AppError::storage(code, message, status.as_u16())
}

/// Text of the first `<name>` element of an S3 error document.
pub fn extract_xml_element(document: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = document.find(&open)? + open.len();
    let end = document[start..].find(&close)? + start;
    Some(document[start..end].trim().to_string())
}

#[async_trait]
impl ObjectStore for MinioClient {
    async fn make_bucket(&self, bucket: &str) -> Result<BucketStatus> {
        debug!("🪣 Creating bucket: {}", bucket);

        let body = self.create_bucket_body();
        let content_length = body.len() as u64;
        let payload_hash = sigv4::payload_hash(&body);
        let response = self
            .send_signed(
                Method::PUT,
                &Self::bucket_uri(bucket),
                Body::from(body),
                content_length,
                payload_hash,
            )
            .await?;

        if response.status().is_success() {
            info!("✅ Bucket created: {}", bucket);
            return Ok(BucketStatus::Created);
        }

        let err = error_from_response(response).await;
        if let Some(status) = err.storage_code().and_then(BucketStatus::from_error_code) {
            info!("🪣 Bucket {} {}", bucket, status);
            return Ok(status);
        }

        error!("❌ Failed to create bucket {}: {}", bucket, err);
        Err(err)
    }

    /// Streams the file in a single unsigned-payload `PUT`. Files larger than
    /// [`MAX_SINGLE_PUT_BYTES`] are rejected before any request is sent.
    async fn put_object_file(&self, bucket: &str, key: &str, path: &Path) -> Result<StoredObject> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::ArchiveNotFound(path.display().to_string())
            } else {
                AppError::from(e)
            }
        })?;
        let size_bytes = file.metadata().await?.len();

        if size_bytes > MAX_SINGLE_PUT_BYTES {
            return Err(AppError::ValidationError(format!(
                "{} is {} bytes, larger than the {} byte single upload limit",
                path.display(),
                size_bytes,
                MAX_SINGLE_PUT_BYTES
            )));
        }

        info!("📤 Uploading {} ({} bytes) to {}/{}", path.display(), size_bytes, bucket, key);

        let body = Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .send_signed(
                Method::PUT,
                &Self::object_uri(bucket, key),
                body,
                size_bytes,
                sigv4::UNSIGNED_PAYLOAD.to_string(),
            )
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("❌ Failed to upload {}/{}: {}", bucket, key, err);
            return Err(err);
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            etag,
        })
    }

    fn name(&self) -> &str {
        "minio"
    }
}
