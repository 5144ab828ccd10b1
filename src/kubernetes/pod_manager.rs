//! Builder pod lifecycle management
//!
//! This module drives a builder pod through `kubectl`:
//! - Pod submission
//! - Phase polling until completion
//! - Log collection
//! - Cleanup

use crate::error::{AppError, Result};
use serde::Serialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Pod phase as reported in `status.phase`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        write!(f, "{}", phase)
    }
}

/// Pod status information
#[derive(Debug, Clone)]
pub struct PodStatus {
    pub phase: PodPhase,
    pub reason: Option<String>,
    pub message: Option<String>,
    /// Exit code of the first terminated container that failed, if any
    pub failed_exit_code: Option<i64>,
}

impl PodStatus {
    /// Extract status from `kubectl get pod -o json` output.
    pub fn from_json(pod: &Value) -> Self {
        let status = &pod["status"];
        let phase = PodPhase::parse(status["phase"].as_str().unwrap_or("Unknown"));

        let mut reason = status["reason"].as_str().map(str::to_string);
        let mut message = status["message"].as_str().map(str::to_string);
        let mut failed_exit_code = None;

        let statuses = status["initContainerStatuses"]
            .as_array()
            .into_iter()
            .flatten()
            .chain(status["containerStatuses"].as_array().into_iter().flatten());

        for container in statuses {
            let terminated = &container["state"]["terminated"];
            if let Some(code) = terminated["exitCode"].as_i64() {
                if code != 0 {
                    failed_exit_code = Some(code);
                    if reason.is_none() {
                        reason = terminated["reason"].as_str().map(|r| {
                            format!("{} ({})", r, container["name"].as_str().unwrap_or("?"))
                        });
                    }
                    if message.is_none() {
                        message = terminated["message"].as_str().map(str::to_string);
                    }
                    break;
                }
            }
        }

        Self {
            phase,
            reason,
            message,
            failed_exit_code,
        }
    }

    pub fn failure_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(reason) = &self.reason {
            parts.push(reason.clone());
        }
        if let Some(code) = self.failed_exit_code {
            parts.push(format!("exit code {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(message.trim().to_string());
        }
        if parts.is_empty() {
            format!("pod phase {}", self.phase)
        } else {
            parts.join(": ")
        }
    }
}

/// Pod manager wrapping `kubectl`
pub struct KubernetesPodManager {
    kubectl: String,
    namespace: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl KubernetesPodManager {
    pub fn new(kubectl: impl Into<String>, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kubectl: kubectl.into(),
            namespace: namespace.into(),
            timeout,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create the pod from a manifest and return the server-assigned name.
    pub async fn submit_pod(&self, yaml: &str) -> Result<String> {
        debug!("📝 Submitting pod manifest to namespace {}", self.namespace);

        let mut child = Command::new(&self.kubectl)
            .args(["create", "-f", "-", "-o", "name", "-n", &self.namespace])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AppError::KubernetesError(format!("Failed to spawn kubectl create: {}", e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(yaml.as_bytes()).await.map_err(|e| {
                AppError::KubernetesError(format!("Failed to write YAML to kubectl: {}", e))
            })?;
            stdin.shutdown().await.map_err(|e| {
                AppError::KubernetesError(format!("Failed to close kubectl stdin: {}", e))
            })?;
        }

        let output = child.wait_with_output().await.map_err(|e| {
            AppError::KubernetesError(format!("Failed to wait for kubectl create: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::KubernetesError(format!(
                "Failed to create pod: {}",
                stderr.trim()
            )));
        }

        let name = parse_created_name(&String::from_utf8_lossy(&output.stdout))?;
        info!("🚀 Builder pod created: {}", name);
        Ok(name)
    }

    pub async fn get_pod_status(&self, pod_name: &str) -> Result<PodStatus> {
        let output = Command::new(&self.kubectl)
            .args(["get", "pod", pod_name, "-n", &self.namespace, "-o", "json"])
            .output()
            .await
            .map_err(|e| AppError::KubernetesError(format!("Failed to get pod status: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::KubernetesError(format!(
                "Failed to get pod {}: {}",
                pod_name,
                stderr.trim()
            )));
        }

        let pod: Value = serde_json::from_slice(&output.stdout)?;
        Ok(PodStatus::from_json(&pod))
    }

    /// Poll the pod until it reaches `Succeeded` or `Failed`.
    pub async fn wait_for_completion(&self, pod_name: &str) -> Result<PodStatus> {
        info!("⏳ Waiting for builder pod: {}", pod_name);
        let start_time = Instant::now();

        loop {
            if start_time.elapsed() > self.timeout {
                return Err(AppError::Timeout {
                    what: format!("pod {}", pod_name),
                    seconds: self.timeout.as_secs(),
                });
            }

            let status = self.get_pod_status(pod_name).await?;
            debug!("📊 Pod {} phase: {}", pod_name, status.phase);

            if status.phase.is_terminal() {
                info!("🏁 Pod {} finished with phase {}", pod_name, status.phase);
                return Ok(status);
            }

            sleep(self.poll_interval).await;
        }
    }

    pub async fn get_logs(&self, pod_name: &str, container: &str) -> Result<String> {
        let output = Command::new(&self.kubectl)
            .args(["logs", pod_name, "-c", container, "-n", &self.namespace])
            .output()
            .await
            .map_err(|e| AppError::KubernetesError(format!("Failed to fetch logs: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::KubernetesError(format!(
                "Failed to fetch logs for {}/{}: {}",
                pod_name,
                container,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub async fn delete_pod(&self, pod_name: &str) -> Result<()> {
        let output = Command::new(&self.kubectl)
            .args([
                "delete",
                "pod",
                pod_name,
                "-n",
                &self.namespace,
                "--ignore-not-found=true",
            ])
            .output()
            .await
            .map_err(|e| AppError::KubernetesError(format!("Failed to delete pod: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("⚠️ Failed to delete pod {}: {}", pod_name, stderr.trim());
            return Err(AppError::KubernetesError(format!(
                "Failed to delete pod {}: {}",
                pod_name,
                stderr.trim()
            )));
        }

        info!("🧹 Deleted builder pod: {}", pod_name);
        Ok(())
    }
}

/// Parse the `pod/<name>` line printed by `kubectl create -o name`.
pub fn parse_created_name(stdout: &str) -> Result<String> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty()).ok_or_else(|| {
        AppError::KubernetesError("kubectl create returned no object name".to_string())
    })?;

    let name = line.rsplit('/').next().unwrap_or(line);
    if name.is_empty() {
        return Err(AppError::KubernetesError(format!(
            "Unexpected kubectl create output: {}",
            line
        )));
    }
    Ok(name.to_string())
}
