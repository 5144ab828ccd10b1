use crate::config::ContextSourceConfig;
use crate::context::{onprem::BUILDER_CONTAINER, ContextSource, UploadedContext};
use crate::error::{AppError, Result};
use crate::kubernetes::{
    KubernetesPodManager, KubernetesValidator, KubernetesYamlGenerator, PodPhase, PodStatus,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of an in-cluster image build
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub build_id: Uuid,
    pub pod_name: String,
    pub phase: PodPhase,
    pub context: UploadedContext,
    pub image: String,
    pub logs: String,
    pub duration_seconds: u64,
}

/// Runs an image build as a pod in the cluster
pub struct ClusterBuilder<S: ContextSource> {
    context_source: S,
    pod_manager: KubernetesPodManager,
    validator: KubernetesValidator,
    registry_creds: Option<String>,
    keep_pod: bool,
}

impl<S: ContextSource> ClusterBuilder<S> {
    pub fn new(context_source: S, config: &ContextSourceConfig) -> Self {
        Self {
            context_source,
            pod_manager: KubernetesPodManager::new(
                config.kubectl_path.clone(),
                config.namespace.clone(),
                Duration::from_secs(config.build_timeout_seconds),
            ),
            validator: KubernetesValidator::new(config.kubectl_path.clone()),
            registry_creds: config.registry_creds.clone(),
            keep_pod: false,
        }
    }

    /// Leave the builder pod in the cluster after it finishes.
    pub fn keep_pod(mut self, keep: bool) -> Self {
        self.keep_pod = keep;
        self
    }

    pub fn context_source(&self) -> &S {
        &self.context_source
    }

    /// Stage the context and render the builder pod manifest without submitting it.
    pub async fn render(&mut self, archive: &Path, image: &str, push: bool) -> Result<String> {
        self.context_source.prepare(archive).await?;
        let spec = self.context_source.generate_pod_spec(image, push);
        let pod = KubernetesYamlGenerator::build_pod(spec, self.pod_manager.namespace(), &Uuid::new_v4());
        let yaml = KubernetesYamlGenerator::generate_pod_yaml(&pod)?;
        KubernetesYamlGenerator::validate_yaml_syntax(&yaml)?;
        Ok(yaml)
    }

    /// Upload the context, run the builder pod to completion, and collect its logs.
    pub async fn build(&mut self, archive: &Path, image: &str, push: bool) -> Result<BuildOutcome> {
        let start_time = chrono::Utc::now();
        let build_id = Uuid::new_v4();
        info!("🔨 Starting build {} of {} via {}", build_id, image, self.context_source.name());

        self.validator
            .validate_build_prerequisites(self.pod_manager.namespace(), self.registry_creds.as_deref())
            .await?;

        let context = self.context_source.prepare(archive).await?;
        let spec = self.context_source.generate_pod_spec(image, push);
        let pod = KubernetesYamlGenerator::build_pod(spec, self.pod_manager.namespace(), &build_id);
        let yaml = KubernetesYamlGenerator::generate_pod_yaml(&pod)?;
        KubernetesYamlGenerator::validate_yaml_syntax(&yaml)?;

        let pod_name = self.pod_manager.submit_pod(&yaml).await?;
        let result = self.run_pod(&pod_name).await;

        if !self.keep_pod {
            if let Err(e) = self.pod_manager.delete_pod(&pod_name).await {
                warn!("⚠️ Builder pod {} left behind: {}", pod_name, e);
            }
        }
        if let Err(e) = self.context_source.cleanup().await {
            warn!("⚠️ Context cleanup failed: {}", e);
        }

        let (status, logs) = result?;
        let duration_seconds = (chrono::Utc::now() - start_time).num_seconds().max(0) as u64;
        info!("✅ Build {} finished in {}s", build_id, duration_seconds);

        Ok(BuildOutcome {
            build_id,
            pod_name,
            phase: status.phase,
            context,
            image: image.to_string(),
            logs,
            duration_seconds,
        })
    }

    async fn run_pod(&self, pod_name: &str) -> Result<(PodStatus, String)> {
        let status = self.pod_manager.wait_for_completion(pod_name).await?;
        let logs = match self.pod_manager.get_logs(pod_name, BUILDER_CONTAINER).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!("⚠️ Could not fetch builder logs: {}", e);
                String::new()
            }
        };

        if status.phase == PodPhase::Failed {
            error!("❌ Builder pod {} failed", pod_name);
            return Err(AppError::BuildFailed {
                pod: pod_name.to_string(),
                reason: status.failure_summary(),
            });
        }

        Ok((status, logs))
    }
}
