//! Kubernetes module
//!
//! Typed pod model for builder pods, manifest rendering, and the `kubectl`
//! plumbing used to run a build in-cluster.

pub mod pod_manager;
pub mod pod_spec;
pub mod validation;
pub mod yaml_generator;

pub use pod_manager::{KubernetesPodManager, PodPhase, PodStatus};
pub use pod_spec::{Pod, PodSpec};
pub use validation::KubernetesValidator;
pub use yaml_generator::KubernetesYamlGenerator;
