/// Upstream Kubernetes control plane images
use anyhow::Result;

use super::table::{substitute, VersionTable};
use super::version::KubernetesVersion;

pub static API_SERVER: VersionTable = VersionTable::new(
    "kube-apiserver",
    &[
        ("1.28", "registry.k8s.io/kube-apiserver:v1.28.0"),
        ("1.27", "registry.k8s.io/kube-apiserver:v1.27.3"),
        ("1.26", "registry.k8s.io/kube-apiserver:v1.26.6"),
        ("1.25", "registry.k8s.io/kube-apiserver:v1.25.11"),
        ("1.24", "registry.k8s.io/kube-apiserver:v1.24.15"),
    ],
);

pub static CONTROLLER_MANAGER: VersionTable = VersionTable::new(
    "kube-controller-manager",
    &[
        ("1.28", "registry.k8s.io/kube-controller-manager:v1.28.0"),
        ("1.27", "registry.k8s.io/kube-controller-manager:v1.27.3"),
        ("1.26", "registry.k8s.io/kube-controller-manager:v1.26.6"),
        ("1.25", "registry.k8s.io/kube-controller-manager:v1.25.11"),
        ("1.24", "registry.k8s.io/kube-controller-manager:v1.24.15"),
    ],
);

pub static SCHEDULER: VersionTable = VersionTable::new(
    "kube-scheduler",
    &[
        ("1.28", "registry.k8s.io/kube-scheduler:v1.28.0"),
        ("1.27", "registry.k8s.io/kube-scheduler:v1.27.3"),
        ("1.26", "registry.k8s.io/kube-scheduler:v1.26.6"),
        ("1.25", "registry.k8s.io/kube-scheduler:v1.25.11"),
        ("1.24", "registry.k8s.io/kube-scheduler:v1.24.15"),
    ],
);

pub static ETCD: VersionTable = VersionTable::new(
    "etcd",
    &[
        ("1.28", "registry.k8s.io/etcd:3.5.9-0"),
        ("1.27", "registry.k8s.io/etcd:3.5.7-0"),
        ("1.26", "registry.k8s.io/etcd:3.5.6-0"),
        ("1.25", "registry.k8s.io/etcd:3.5.6-0"),
        ("1.24", "registry.k8s.io/etcd:3.5.6-0"),
    ],
);

const VALUES_TEMPLATE: &str = "api:
  image: ##API_IMAGE##
scheduler:
  image: ##SCHEDULER_IMAGE##
controller:
  image: ##CONTROLLER_IMAGE##
etcd:
  image: ##ETCD_IMAGE##
";

/// Control plane image values for a generic Kubernetes host
pub fn default_values(version: &KubernetesVersion) -> Result<String> {
    let key = ETCD.resolve_key(version)?;

    Ok(substitute(
        VALUES_TEMPLATE,
        &[
            ("##API_IMAGE##", API_SERVER.image(key)?),
            ("##CONTROLLER_IMAGE##", CONTROLLER_MANAGER.image(key)?),
            ("##SCHEDULER_IMAGE##", SCHEDULER.image(key)?),
            ("##ETCD_IMAGE##", ETCD.image(key)?),
        ],
    ))
}
