/// Default Helm values for virtual control planes
///
/// The control plane images are chosen from static tables keyed by the host
/// cluster's `major.minor` version, rendered into a fixed YAML block and
/// followed by the values shared by every distro.
pub mod eks;
pub mod k8s;
pub mod table;
pub mod version;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use version::{KubernetesVersion, VersionInfo};

/// Control plane distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    #[default]
    K8s,
    Eks,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distro::K8s => f.write_str("k8s"),
            Distro::Eks => f.write_str("eks"),
        }
    }
}

/// Values appended to every rendered chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonValues {
    /// Service CIDR of the host cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,

    /// Expose the virtual API server through a LoadBalancer service
    #[serde(skip_serializing_if = "is_false")]
    pub expose: bool,

    /// Use a NodePort service (ignored when `expose` is set)
    #[serde(skip_serializing_if = "is_false")]
    pub node_port: bool,

    /// Sync real host nodes instead of fake ones
    #[serde(skip_serializing_if = "is_false")]
    pub sync_nodes: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub disable_ingress_sync: bool,

    /// Enable workload isolation
    #[serde(skip_serializing_if = "is_false")]
    pub isolate: bool,

    /// Context name written into the generated kubeconfig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_config_context_name: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Inputs for [`render_default_values`]
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub kubernetes_version: KubernetesVersion,
    pub distro: Distro,
    pub common: CommonValues,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct ValuesDoc {
    #[serde(rename = "serviceCIDR", skip_serializing_if = "Option::is_none")]
    service_cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<ServiceValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<SyncValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    isolation: Option<Enabled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    syncer: Option<SyncerValues>,
}

#[derive(Serialize)]
struct ServiceValues {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct SyncValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<Enabled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingresses: Option<Enabled>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncerValues {
    kube_config_context_name: String,
}

#[derive(Serialize)]
struct Enabled {
    enabled: bool,
}

impl CommonValues {
    fn to_doc(&self) -> ValuesDoc {
        let service_kind = if self.expose {
            Some("LoadBalancer")
        } else if self.node_port {
            Some("NodePort")
        } else {
            None
        };

        let sync = SyncValues {
            nodes: self.sync_nodes.then_some(Enabled { enabled: true }),
            ingresses: self
                .disable_ingress_sync
                .then_some(Enabled { enabled: false }),
        };
        let has_sync = sync.nodes.is_some() || sync.ingresses.is_some();

        ValuesDoc {
            service_cidr: self.service_cidr.clone(),
            service: service_kind.map(|kind| ServiceValues { kind }),
            sync: has_sync.then_some(sync),
            isolation: self.isolate.then_some(Enabled { enabled: true }),
            syncer: self
                .kube_config_context_name
                .clone()
                .map(|kube_config_context_name| SyncerValues {
                    kube_config_context_name,
                }),
        }
    }

    /// YAML for the configured values, empty when nothing is set
    pub fn render(&self) -> Result<String> {
        if *self == CommonValues::default() {
            return Ok(String::new());
        }
        serde_yaml::to_string(&self.to_doc()).context("Failed to serialize common values")
    }
}

/// Append the common values to a rendered block
fn add_common_values(values: String, options: &ChartOptions) -> Result<String> {
    let common = options.common.render()?;
    Ok(values + &common)
}

/// Render the default chart values for the host cluster described by `options`
pub fn render_default_values(options: &ChartOptions) -> Result<String> {
    let values = match options.distro {
        Distro::K8s => k8s::default_values(&options.kubernetes_version)?,
        Distro::Eks => eks::default_values(&options.kubernetes_version)?,
    };
    add_common_values(values, options)
}
