//! Pre-flight checks against the target cluster

use crate::error::{AppError, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Validate cluster connectivity and the resources a build pod depends on
pub struct KubernetesValidator {
    kubectl: String,
}

impl KubernetesValidator {
    pub fn new(kubectl: impl Into<String>) -> Self {
        Self {
            kubectl: kubectl.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new(&self.kubectl)
            .args(args)
            .output()
            .await
            .map_err(|e| AppError::KubernetesError(format!("kubectl not runnable: {}", e)))
    }

    /// Validate that kubectl is available
    pub async fn validate_kubectl_available(&self) -> Result<()> {
        debug!("🔍 Validating kubectl availability");

        let output = self.run(&["version", "--client"]).await?;
        if !output.status.success() {
            return Err(AppError::KubernetesError(
                "kubectl is not properly configured".to_string(),
            ));
        }

        debug!("✅ kubectl available");
        Ok(())
    }

    /// Validate namespace exists and is accessible
    pub async fn validate_namespace(&self, namespace: &str) -> Result<()> {
        debug!("🔍 Validating namespace: {}", namespace);

        let output = self.run(&["get", "namespace", namespace]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(namespace_error(namespace, &stderr));
        }

        debug!("✅ Namespace '{}' is accessible", namespace);
        Ok(())
    }

    /// Validate the registry-credentials secret exists in the namespace
    pub async fn validate_secret(&self, namespace: &str, secret: &str) -> Result<()> {
        debug!("🔍 Validating secret {}/{}", namespace, secret);

        let output = self
            .run(&["get", "secret", secret, "-n", namespace, "-o", "name"])
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::KubernetesError(format!(
                "Registry credentials secret '{}' not available in '{}': {}",
                secret,
                namespace,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Run every check needed before submitting a build pod
    pub async fn validate_build_prerequisites(
        &self,
        namespace: &str,
        registry_creds: Option<&str>,
    ) -> Result<()> {
        self.validate_kubectl_available().await?;
        self.validate_namespace(namespace).await?;
        if let Some(secret) = registry_creds {
            self.validate_secret(namespace, secret).await?;
        }

        info!("✅ Cluster prerequisites validated for namespace {}", namespace);
        Ok(())
    }
}

fn namespace_error(namespace: &str, stderr: &str) -> AppError {
    if stderr.contains("not found") {
        AppError::KubernetesError(format!("Namespace '{}' does not exist", namespace))
    } else {
        AppError::KubernetesError(format!(
            "Cannot access namespace '{}': {}",
            namespace,
            stderr.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_error_messages() {
        let missing = namespace_error("builds", "Error from server (NotFound): namespaces \"builds\" not found");
        assert_eq!(missing.to_string(), "Kubernetes error: Namespace 'builds' does not exist");

        let denied = namespace_error("builds", "forbidden\n");
        assert!(denied.to_string().contains("Cannot access namespace 'builds': forbidden"));
    }

    #[tokio::test]
    async fn test_missing_kubectl_fails_prerequisites() {
        let validator = KubernetesValidator::new("/nonexistent/kubectl");
        let err = validator
            .validate_build_prerequisites("default", Some("regcred"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("kubectl not runnable"));
    }
}
