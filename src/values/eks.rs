/// EKS distro control plane images
use anyhow::Result;

use super::table::{substitute, VersionTable};
use super::version::KubernetesVersion;

pub static API_SERVER: VersionTable = VersionTable::new(
    "kube-apiserver",
    &[
        ("1.27", "public.ecr.aws/eks-distro/kubernetes/kube-apiserver:v1.27.3-eks-1-27-7"),
        ("1.26", "public.ecr.aws/eks-distro/kubernetes/kube-apiserver:v1.26.6-eks-1-26-13"),
        ("1.25", "public.ecr.aws/eks-distro/kubernetes/kube-apiserver:v1.25.11-eks-1-25-17"),
        ("1.24", "public.ecr.aws/eks-distro/kubernetes/kube-apiserver:v1.24.15-eks-1-24-21"),
        ("1.23", "public.ecr.aws/eks-distro/kubernetes/kube-apiserver:v1.23.17-eks-1-23-26"),
    ],
);

pub static CONTROLLER_MANAGER: VersionTable = VersionTable::new(
    "kube-controller-manager",
    &[
        ("1.27", "public.ecr.aws/eks-distro/kubernetes/kube-controller-manager:v1.27.3-eks-1-27-7"),
        ("1.26", "public.ecr.aws/eks-distro/kubernetes/kube-controller-manager:v1.26.6-eks-1-26-13"),
        ("1.25", "public.ecr.aws/eks-distro/kubernetes/kube-controller-manager:v1.25.11-eks-1-25-17"),
        ("1.24", "public.ecr.aws/eks-distro/kubernetes/kube-controller-manager:v1.24.15-eks-1-24-21"),
        ("1.23", "public.ecr.aws/eks-distro/kubernetes/kube-controller-manager:v1.23.17-eks-1-23-26"),
    ],
);

pub static ETCD: VersionTable = VersionTable::new(
    "etcd",
    &[
        ("1.27", "public.ecr.aws/eks-distro/etcd-io/etcd:v3.5.7-eks-1-27-7"),
        ("1.26", "public.ecr.aws/eks-distro/etcd-io/etcd:v3.5.7-eks-1-26-13"),
        ("1.25", "public.ecr.aws/eks-distro/etcd-io/etcd:v3.5.7-eks-1-25-17"),
        ("1.24", "public.ecr.aws/eks-distro/etcd-io/etcd:v3.5.7-eks-1-24-21"),
        ("1.23", "public.ecr.aws/eks-distro/etcd-io/etcd:v3.5.7-eks-1-23-26"),
    ],
);

pub static COREDNS: VersionTable = VersionTable::new(
    "coredns",
    &[
        ("1.27", "public.ecr.aws/eks-distro/coredns/coredns:v1.10.1-eks-1-27-7"),
        ("1.26", "public.ecr.aws/eks-distro/coredns/coredns:v1.9.3-eks-1-26-13"),
        ("1.25", "public.ecr.aws/eks-distro/coredns/coredns:v1.9.3-eks-1-25-17"),
        ("1.24", "public.ecr.aws/eks-distro/coredns/coredns:v1.9.3-eks-1-24-21"),
        ("1.23", "public.ecr.aws/eks-distro/coredns/coredns:v1.8.7-eks-1-23-26"),
    ],
);

const VALUES_TEMPLATE: &str = "api:
  image: ##API_IMAGE##
controller:
  image: ##CONTROLLER_IMAGE##
etcd:
  image: ##ETCD_IMAGE##
coredns:
  image: ##COREDNS_IMAGE##
";

/// Control plane image values for an EKS host
pub fn default_values(version: &KubernetesVersion) -> Result<String> {
    let key = COREDNS.resolve_key(version)?;

    Ok(substitute(
        VALUES_TEMPLATE,
        &[
            ("##API_IMAGE##", API_SERVER.image(key)?),
            ("##CONTROLLER_IMAGE##", CONTROLLER_MANAGER.image(key)?),
            ("##ETCD_IMAGE##", ETCD.image(key)?),
            ("##COREDNS_IMAGE##", COREDNS.image(key)?),
        ],
    ))
}
