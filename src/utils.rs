use crate::error::{AppError, Result};
use std::env;
use std::path::Path;
use tokio::io::AsyncReadExt;

const HASH_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Helper function to get environment variable with a default value
pub fn get_env_or_default(key: &str, default_value: &str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.to_string())
}

/// Parse an optional boolean environment variable
pub fn get_env_bool(key: &str, default_value: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::ConfigError(format!(
                "{} must be a boolean, got '{}'",
                key, raw
            ))),
        },
        Err(_) => Ok(default_value),
    }
}

/// Content checksum of a file: zlib CRC-32 over its bytes, uppercase hex without padding.
pub async fn crc(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::ArchiveNotFound(path.display().to_string())
        } else {
            AppError::from(e)
        }
    })?;

    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut hasher = crc32fast::Hasher::new();
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:X}", hasher.finalize()))
}

/// Extension used when naming an uploaded archive, including the leading dot.
pub fn archive_extension(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name.ends_with(".tar.gz") {
        return DEFAULT_ARCHIVE_EXTENSION.to_string();
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => DEFAULT_ARCHIVE_EXTENSION.to_string(),
    }
}
