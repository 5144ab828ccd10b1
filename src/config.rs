use crate::error::{AppError, Result};
use crate::utils::{get_env_bool, get_env_or_default};
use secrecy::SecretString;

pub const DEFAULT_MINIO_ENDPOINT: &str = "minio:9000";
pub const DEFAULT_MINIO_ACCESS_KEY: &str = "minio";
pub const DEFAULT_MINIO_SECRET_KEY: &str = "minio123";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET: &str = "fairing";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_FETCHER_IMAGE: &str = "registry.dudaji.org/dudaji/s3cmd:latest";
pub const DEFAULT_KANIKO_IMAGE: &str = "gcr.io/kaniko-project/executor:v0.7.0";
pub const DEFAULT_BUILD_TIMEOUT_SECONDS: u64 = 600;

/// Connection settings for the S3-compatible object store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: SecretString,
    pub secure: bool,
    pub region: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MINIO_ENDPOINT.to_string(),
            access_key: DEFAULT_MINIO_ACCESS_KEY.to_string(),
            secret_key: SecretString::new(DEFAULT_MINIO_SECRET_KEY.to_string()),
            secure: false,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl StorageConfig {
    /// Base URL of the store, e.g. `http://minio:9000`.
    pub fn base_url(&self) -> Result<url::Url> {
        let endpoint = if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            let scheme = if self.secure { "https" } else { "http" };
            format!("{}://{}", scheme, self.endpoint)
        };

        url::Url::parse(&endpoint).map_err(|e| {
            AppError::ConfigError(format!("Invalid storage endpoint '{}': {}", self.endpoint, e))
        })
    }
}

/// Settings for the on-prem context source and the cluster build.
#[derive(Debug, Clone)]
pub struct ContextSourceConfig {
    pub storage: StorageConfig,
    /// Bucket holding uploaded contexts. `None` falls back to `fairing` on prepare.
    pub bucket: Option<String>,
    pub namespace: String,
    /// Name of the secret holding `.dockerconfigjson` registry credentials.
    pub registry_creds: Option<String>,
    pub fetcher_image: String,
    pub kaniko_image: String,
    pub build_timeout_seconds: u64,
    pub kubectl_path: String,
}

impl Default for ContextSourceConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            bucket: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            registry_creds: None,
            fetcher_image: DEFAULT_FETCHER_IMAGE.to_string(),
            kaniko_image: DEFAULT_KANIKO_IMAGE.to_string(),
            build_timeout_seconds: DEFAULT_BUILD_TIMEOUT_SECONDS,
            kubectl_path: "kubectl".to_string(),
        }
    }
}

impl ContextSourceConfig {
    pub fn init() -> Result<ContextSourceConfig> {
        let storage = StorageConfig {
            endpoint: get_env_or_default("MINIO_ENDPOINT", DEFAULT_MINIO_ENDPOINT),
            access_key: get_env_or_default("MINIO_ACCESS_KEY", DEFAULT_MINIO_ACCESS_KEY),
            secret_key: SecretString::new(get_env_or_default(
                "MINIO_SECRET_KEY",
                DEFAULT_MINIO_SECRET_KEY,
            )),
            secure: get_env_bool("MINIO_SECURE", false)?,
            region: get_env_or_default("MINIO_REGION", DEFAULT_REGION),
        };

        let bucket = std::env::var("CONTEXT_BUCKET").ok().filter(|b| !b.is_empty());
        let registry_creds = std::env::var("REGISTRY_CREDS_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let build_timeout_seconds = get_env_or_default(
            "BUILD_TIMEOUT_SECONDS",
            &DEFAULT_BUILD_TIMEOUT_SECONDS.to_string(),
        )
        .parse::<u64>()
        .map_err(|_| AppError::ConfigError("BUILD_TIMEOUT_SECONDS must be a number".to_string()))?;

        let config = ContextSourceConfig {
            storage,
            bucket,
            namespace: get_env_or_default("BUILD_NAMESPACE", DEFAULT_NAMESPACE),
            registry_creds,
            fetcher_image: get_env_or_default("CONTEXT_FETCHER_IMAGE", DEFAULT_FETCHER_IMAGE),
            kaniko_image: get_env_or_default("KANIKO_IMAGE", DEFAULT_KANIKO_IMAGE),
            build_timeout_seconds,
            kubectl_path: get_env_or_default("KUBECTL_PATH", "kubectl"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(AppError::ConfigError(
                "Build namespace cannot be empty".to_string(),
            ));
        }

        if self.build_timeout_seconds == 0 {
            return Err(AppError::ConfigError(
                "Build timeout must be greater than 0".to_string(),
            ));
        }

        if self.storage.region.trim().is_empty() {
            return Err(AppError::ConfigError(
                "Storage region cannot be empty".to_string(),
            ));
        }

        self.storage.base_url()?;
        Ok(())
    }
}
