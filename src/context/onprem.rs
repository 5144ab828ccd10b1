//! On-prem context source
//!
//! Stages the build context in a MinIO bucket and builds a two-stage pod:
//! an `s3cmd` init container pulls the archive into a shared empty dir and
//! kaniko builds from it, with registry credentials projected from a secret.

use super::traits::{ContextSource, UploadedContext};
use crate::config::{ContextSourceConfig, DEFAULT_BUCKET};
use crate::error::Result;
use crate::kubernetes::pod_spec::{
    Container, KeyToPath, PodSpec, RestartPolicy, Volume, VolumeProjection,
};
use crate::storage::{MinioClient, ObjectStore};
use crate::utils;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_CONTEXT_NAME: &str = "build_context.tar.gz";
pub const BUILDS_PREFIX: &str = "fairing_builds";

pub const FETCHER_CONTAINER: &str = "minio-s3-pulling";
pub const BUILDER_CONTAINER: &str = "kaniko";
pub const BUILD_CONTEXT_VOLUME: &str = "build-context";
pub const BUILD_CONTEXT_MOUNT: &str = "/build_context";
pub const REGISTRY_CREDS_VOLUME: &str = "registry-creds";
pub const REGISTRY_CREDS_MOUNT: &str = "/root";
pub const DOCKER_CONFIG_KEY: &str = ".dockerconfigjson";
pub const DOCKER_CONFIG_PATH: &str = ".docker/config.json";

pub struct OnPremContextSource {
    store: Arc<dyn ObjectStore>,
    bucket: Option<String>,
    namespace: String,
    registry_creds: Option<String>,
    fetcher_image: String,
    kaniko_image: String,
    uploaded_context_url: String,
    context_name: String,
}

impl OnPremContextSource {
    pub fn new(store: Arc<dyn ObjectStore>, config: &ContextSourceConfig) -> Self {
        Self {
            store,
            bucket: config.bucket.clone(),
            namespace: config.namespace.clone(),
            registry_creds: config.registry_creds.clone(),
            fetcher_image: config.fetcher_image.clone(),
            kaniko_image: config.kaniko_image.clone(),
            uploaded_context_url: String::new(),
            context_name: DEFAULT_CONTEXT_NAME.to_string(),
        }
    }

    /// Source backed by a [`MinioClient`] built from `config.storage`.
    pub fn from_config(config: &ContextSourceConfig) -> Result<Self> {
        let store = MinioClient::new(&config.storage)?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn registry_creds(&self) -> Option<&str> {
        self.registry_creds.as_deref()
    }

    /// Empty until the context has been prepared.
    pub fn uploaded_context_url(&self) -> &str {
        &self.uploaded_context_url
    }

    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    /// Hash the archive, make sure the bucket exists, and upload it under
    /// `fairing_builds/<hash><ext>`.
    pub async fn upload_context(&self, archive: &Path) -> Result<UploadedContext> {
        let context_hash = utils::crc(archive).await?;
        let context_name = format!("{}{}", context_hash, utils::archive_extension(archive));
        let bucket = self.bucket();

        let status = self.store.make_bucket(bucket).await?;
        debug!("🪣 Bucket {} {} ({})", bucket, status, self.store.name());

        let key = format!("{}/{}", BUILDS_PREFIX, context_name);
        let object = self.store.put_object_file(bucket, &key, archive).await?;

        let url = object.url();
        info!("📦 Uploaded build context {} ({} bytes)", url, object.size_bytes);

        Ok(UploadedContext { url, context_name })
    }

    fn builder_args(&self, image_name: &str, push: bool) -> Vec<String> {
        let mut args = vec![
            "--dockerfile=Dockerfile".to_string(),
            format!("--destination={}", image_name),
            format!("--context=dir://build_context/{}", self.context_name),
        ];
        if !push {
            args.push("--no-push".to_string());
        }
        args
    }
}

#[async_trait]
impl ContextSource for OnPremContextSource {
    async fn prepare(&mut self, archive: &Path) -> Result<UploadedContext> {
        if self.bucket.is_none() {
            self.bucket = Some(DEFAULT_BUCKET.to_string());
        }

        let uploaded = self.upload_context(archive).await?;
        self.uploaded_context_url = uploaded.url.clone();
        self.context_name = uploaded.context_name.clone();
        Ok(uploaded)
    }

    fn generate_pod_spec(&self, image_name: &str, push: bool) -> PodSpec {
        let fetcher = Container::new(FETCHER_CONTAINER, &self.fetcher_image)
            .with_args([self.uploaded_context_url.as_str(), BUILD_CONTEXT_MOUNT])
            .with_mount(BUILD_CONTEXT_VOLUME, BUILD_CONTEXT_MOUNT);

        let builder = Container::new(BUILDER_CONTAINER, &self.kaniko_image)
            .with_args(self.builder_args(image_name, push))
            .with_mount(BUILD_CONTEXT_VOLUME, BUILD_CONTEXT_MOUNT)
            .with_mount(REGISTRY_CREDS_VOLUME, REGISTRY_CREDS_MOUNT);

        PodSpec {
            init_containers: vec![fetcher],
            containers: vec![builder],
            restart_policy: Some(RestartPolicy::Never),
            volumes: vec![
                Volume::empty_dir(BUILD_CONTEXT_VOLUME),
                Volume::projected(
                    REGISTRY_CREDS_VOLUME,
                    vec![VolumeProjection::secret(
                        self.registry_creds.clone(),
                        vec![KeyToPath::new(DOCKER_CONFIG_KEY, DOCKER_CONFIG_PATH)],
                    )],
                ),
            ],
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        // uploaded contexts are keyed by content hash and reused across builds
        Ok(())
    }

    fn name(&self) -> &str {
        "onprem"
    }
}
