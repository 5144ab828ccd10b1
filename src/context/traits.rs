use crate::error::Result;
use crate::kubernetes::PodSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where an uploaded build context ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedContext {
    /// `s3://<bucket>/<key>`
    pub url: String,
    /// Object name derived from the content hash, e.g. `1A2B3C4D.tar.gz`
    pub context_name: String,
}

/// A place a build context is staged for an in-cluster builder
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Stage the archive so a builder pod can fetch it.
    async fn prepare(&mut self, archive: &Path) -> Result<UploadedContext>;

    /// Pod spec that fetches the staged context and builds `image_name`.
    fn generate_pod_spec(&self, image_name: &str, push: bool) -> PodSpec;

    /// Release anything staged by `prepare`.
    async fn cleanup(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}
