/// Kubernetes cluster operations
pub mod client;

pub use client::KubernetesClient;
