/// Configuration management for kubekit
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::values::{CommonValues, Distro, KubernetesVersion};

/// Environment variable overriding `install_dir`
pub const INSTALL_DIR_ENV: &str = "KUBEKIT_INSTALL_DIR";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubekitConfig {
    /// Directory managed tool copies are installed into
    /// (defaults to ~/.kubekit/bin, can also be set via KUBEKIT_INSTALL_DIR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,

    /// Versions installed when a tool is missing
    #[serde(default)]
    pub tools: ToolVersions,

    /// Download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Defaults for rendered chart values
    #[serde(default)]
    pub chart: ChartConfig,
}

/// Release versions of the managed tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    #[serde(default = "default_kubectl_version")]
    pub kubectl: String,

    #[serde(default = "default_helm_version")]
    pub helm: String,

    #[serde(default = "default_talosctl_version")]
    pub talosctl: String,
}

/// Download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Treat non-2xx responses as download failures
    #[serde(default = "default_true")]
    pub reject_http_errors: bool,

    /// Parent directory for temporary download directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

/// Chart value defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Host cluster Kubernetes version (e.g., "1.28")
    #[serde(default = "default_kubernetes_version")]
    pub kubernetes_version: String,

    /// Control plane distribution
    #[serde(default)]
    pub distro: Distro,

    /// Values appended to every rendered chart
    #[serde(flatten)]
    pub common: CommonValues,
}

fn default_kubectl_version() -> String {
    "v1.30.2".to_string()
}

fn default_helm_version() -> String {
    "v3.14.4".to_string()
}

fn default_talosctl_version() -> String {
    "v1.7.6".to_string()
}

fn default_kubernetes_version() -> String {
    "1.28".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for ToolVersions {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl_version(),
            helm: default_helm_version(),
            talosctl: default_talosctl_version(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            reject_http_errors: true,
            temp_dir: None,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            kubernetes_version: default_kubernetes_version(),
            distro: Distro::default(),
            common: CommonValues::default(),
        }
    }
}

impl Default for KubekitConfig {
    fn default() -> Self {
        Self::example()
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl KubekitConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: KubekitConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (tool, version) in [
            ("kubectl", &self.tools.kubectl),
            ("helm", &self.tools.helm),
            ("talosctl", &self.tools.talosctl),
        ] {
            if version.trim().is_empty() {
                anyhow::bail!("tools.{} version cannot be empty", tool);
            }
        }

        if self.download.timeout_secs == 0 {
            anyhow::bail!("download.timeout_secs must be greater than zero");
        }

        KubernetesVersion::parse(&self.chart.kubernetes_version)
            .context("Invalid chart.kubernetes_version")?;

        Ok(())
    }

    /// Install directory from config or environment
    pub fn get_install_dir(&self) -> Option<PathBuf> {
        self.install_dir
            .clone()
            .or_else(|| std::env::var_os(INSTALL_DIR_ENV).map(PathBuf::from))
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            install_dir: None,
            tools: ToolVersions::default(),
            download: DownloadConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

/// `~/.kubekit/bin`
pub fn default_install_dir() -> anyhow::Result<PathBuf> {
    install_dir_under(std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")))
}

fn install_dir_under(home: Option<OsString>) -> anyhow::Result<PathBuf> {
    let home = home.filter(|h| !h.is_empty()).ok_or_else(|| {
        anyhow::anyhow!(
            "Cannot determine home directory. Set {} or install_dir in the config",
            INSTALL_DIR_ENV
        )
    })?;
    Ok(PathBuf::from(home).join(".kubekit").join("bin"))
}
