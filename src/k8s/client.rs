/// Host cluster queries through kubectl
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::utils::CommandBuilder;
use crate::values::{KubernetesVersion, VersionInfo};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput {
    server_version: Option<VersionInfo>,
}

/// Kubernetes client for kubectl operations
pub struct KubernetesClient {
    kubectl: PathBuf,
    kubeconfig: Option<PathBuf>,
}

impl KubernetesClient {
    /// `kubectl` is whatever the downloader resolved: a bare name or a path
    pub fn new(kubectl: PathBuf, kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubectl,
            kubeconfig,
        }
    }

    /// Ask the host cluster for its Kubernetes version
    pub async fn server_version(&self) -> Result<KubernetesVersion> {
        let mut command = CommandBuilder::new(&self.kubectl)
            .args(["version", "-o", "json"])
            .context("Failed to execute kubectl version");
        if let Some(kubeconfig) = &self.kubeconfig {
            command = command.kubeconfig(kubeconfig);
        }

        // kubectl exits non-zero when the server is unreachable but still
        // prints the client half, so parse before checking the status
        let output = command.output().await?;
        let version = parse_server_version(&output.stdout);
        match version {
            Ok(version) => {
                info!("Host cluster is running Kubernetes {}", version);
                Ok(version)
            }
            Err(e) if !output.success => Err(e.context(output.stderr.trim().to_string())),
            Err(e) => Err(e),
        }
    }
}

fn parse_server_version(stdout: &str) -> Result<KubernetesVersion> {
    let parsed: VersionOutput =
        serde_json::from_str(stdout).context("Failed to parse kubectl version output")?;
    let info = parsed
        .server_version
        .context("kubectl did not report a server version")?;
    Ok(KubernetesVersion::from_info(&info)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_version() {
        let stdout = r#"{
  "clientVersion": {"major": "1", "minor": "30", "gitVersion": "v1.30.2"},
  "serverVersion": {"major": "1", "minor": "27+", "gitVersion": "v1.27.16-eks-a18cd3a"}
}"#;
        assert_eq!(
            parse_server_version(stdout).unwrap(),
            KubernetesVersion::new(1, 27)
        );
    }

    #[test]
    fn test_parse_without_server() {
        let stdout = r#"{"clientVersion": {"major": "1", "minor": "30"}}"#;
        let err = parse_server_version(stdout).unwrap_err();
        assert_eq!(err.to_string(), "kubectl did not report a server version");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_version_from_fake_kubectl() {
        let dir = tempfile::tempdir().unwrap();
        let kubectl = crate::tools::testing::fake_binary(
            dir.path(),
            "kubectl",
            r#"[ "$KUBECONFIG" = "/tmp/host.kubeconfig" ] || exit 1
echo '{"serverVersion":{"major":"1","minor":"29"}}'"#,
        );

        let client = KubernetesClient::new(kubectl, Some(PathBuf::from("/tmp/host.kubeconfig")));
        assert_eq!(
            client.server_version().await.unwrap(),
            KubernetesVersion::new(1, 29)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let kubectl = crate::tools::testing::fake_binary(
            dir.path(),
            "kubectl",
            r#"echo '{"clientVersion":{"major":"1","minor":"30"}}'
echo 'The connection to the server localhost:8080 was refused' >&2
exit 1"#,
        );

        let client = KubernetesClient::new(kubectl, None);
        let err = client.server_version().await.unwrap_err();
        assert!(err.to_string().contains("connection to the server"));
    }
}
