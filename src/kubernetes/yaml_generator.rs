//! Kubernetes manifest generation
//!
//! Wraps a generated pod spec in a `v1/Pod` object and renders it as YAML for
//! `kubectl`.

use super::pod_spec::{ObjectMeta, Pod, PodSpec};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

pub const GENERATE_NAME_PREFIX: &str = "fairing-builder-";
pub const BUILDER_LABEL: &str = "fairing-builder";
pub const BUILD_ID_LABEL: &str = "fairing-build-id";

/// Kubernetes YAML generator for builder pods
pub struct KubernetesYamlGenerator;

impl KubernetesYamlGenerator {
    /// Labels attached to every builder pod.
    pub fn builder_labels(build_id: &Uuid) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(BUILDER_LABEL.to_string(), "kaniko".to_string());
        labels.insert(BUILD_ID_LABEL.to_string(), build_id.to_string());
        labels
    }

    /// Wrap `spec` in a pod object named by the API server.
    pub fn build_pod(spec: PodSpec, namespace: &str, build_id: &Uuid) -> Pod {
        let metadata = ObjectMeta {
            generate_name: Some(GENERATE_NAME_PREFIX.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Self::builder_labels(build_id),
            ..Default::default()
        };
        Pod::new(metadata, spec)
    }

    /// Render a pod as YAML.
    pub fn generate_pod_yaml(pod: &Pod) -> Result<String> {
        let yaml = serde_yaml::to_string(pod)?;
        debug!("✅ Generated Pod YAML ({} bytes)", yaml.len());
        Ok(yaml)
    }

    /// Render a bare pod spec as YAML.
    pub fn generate_pod_spec_yaml(spec: &PodSpec) -> Result<String> {
        Ok(serde_yaml::to_string(spec)?)
    }

    /// Validate generated YAML syntax (basic check)
    pub fn validate_yaml_syntax(yaml: &str) -> Result<()> {
        for (i, line) in yaml.lines().enumerate() {
            if line.contains('\t') {
                return Err(AppError::ValidationError(format!(
                    "YAML contains tab character at line {}",
                    i + 1
                )));
            }
        }

        serde_yaml::from_str::<serde_yaml::Value>(yaml)
            .map_err(|e| AppError::ValidationError(format!("Invalid YAML syntax: {}", e)))?;

        debug!("✅ YAML syntax validation passed");
        Ok(())
    }
}
