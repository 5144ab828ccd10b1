#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Context archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Storage error [{code}] (status {status}): {message}")]
    StorageError {
        code: String,
        message: String,
        status: u16,
    },

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Build failed in pod {pod}: {reason}")]
    BuildFailed { pod: String, reason: String },

    #[error("Timed out after {seconds}s waiting for {what}")]
    Timeout { what: String, seconds: u64 },
}

impl AppError {
    /// Storage error raised from an S3 error document.
    pub fn storage(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        AppError::StorageError {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// S3 error code, if this is a storage error.
    pub fn storage_code(&self) -> Option<&str> {
        match self {
            AppError::StorageError { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::KubernetesError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ValidationError(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalServiceError(format!("HTTP error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
