/// kubectl descriptor
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{install_binary, managed_path, probe_candidate, release_tag, Platform};
use crate::downloader::Tool;

const KUBECTL_RELEASE_BASE: &str = "https://dl.k8s.io/release";

/// `kubectl version --client -o json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput {
    client_version: Option<ClientVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientVersion {
    git_version: String,
}

/// The Kubernetes command-line client
pub struct Kubectl {
    version: String,
    install_dir: Option<PathBuf>,
    platform: Platform,
}

impl Kubectl {
    pub fn new(version: &str, install_dir: Option<PathBuf>, platform: Platform) -> Self {
        Self {
            version: release_tag(version),
            install_dir,
            platform,
        }
    }
}

/// Extract the client git version from kubectl's JSON output
fn client_git_version(stdout: &str) -> Option<String> {
    let parsed: VersionOutput = serde_json::from_str(stdout).ok()?;
    parsed
        .client_version
        .map(|v| v.git_version)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Tool for Kubectl {
    fn name(&self) -> &str {
        "kubectl"
    }

    async fn is_valid(&self, candidate: &Path) -> Result<bool> {
        let Some(stdout) =
            probe_candidate(candidate, &["version", "--client", "-o", "json"]).await?
        else {
            return Ok(false);
        };

        match client_git_version(&stdout) {
            Some(version) => {
                debug!("{} reports client version {}", candidate.display(), version);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn install_path(&self) -> Result<PathBuf> {
        managed_path(self.install_dir.as_deref(), self.name(), &self.platform)
    }

    fn download_url(&self) -> String {
        format!(
            "{}/{}/bin/{}/{}/kubectl{}",
            KUBECTL_RELEASE_BASE,
            self.version,
            self.platform.os,
            self.platform.arch,
            self.platform.exe_suffix()
        )
    }

    async fn install(&self, downloaded: &Path) -> Result<()> {
        install_binary(downloaded, &self.install_path()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[test]
    fn test_download_url() {
        let kubectl = Kubectl::new("1.30.2", None, testing::linux_amd64());
        assert_eq!(
            kubectl.download_url(),
            "https://dl.k8s.io/release/v1.30.2/bin/linux/amd64/kubectl"
        );

        let windows = Platform::from_parts("windows", "x86_64").unwrap();
        let kubectl = Kubectl::new("v1.30.2", None, windows);
        assert!(kubectl.download_url().ends_with("/windows/amd64/kubectl.exe"));
    }

    #[test]
    fn test_client_git_version() {
        let stdout = r#"{
  "clientVersion": {
    "major": "1",
    "minor": "30",
    "gitVersion": "v1.30.2",
    "platform": "linux/amd64"
  },
  "kustomizeVersion": "v5.0.4-0.20230601165947-6ce0bf390ce3"
}"#;
        assert_eq!(client_git_version(stdout).as_deref(), Some("v1.30.2"));
        assert_eq!(client_git_version("{}"), None);
        assert_eq!(client_git_version("Client Version: v1.30.2"), None);
    }

    #[test]
    fn test_install_path() {
        let kubectl = Kubectl::new(
            "1.30.2",
            Some(PathBuf::from("/opt/kubekit/bin")),
            testing::linux_amd64(),
        );
        assert_eq!(
            kubectl.install_path().unwrap(),
            PathBuf::from("/opt/kubekit/bin/kubectl")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_is_valid_with_fake_binary() {
        let dir = tempfile::tempdir().unwrap();
        let good = testing::fake_binary(
            dir.path(),
            "kubectl",
            r#"echo '{"clientVersion":{"gitVersion":"v1.30.2"}}'"#,
        );
        let garbage = testing::fake_binary(dir.path(), "not-kubectl", "echo hello");

        let kubectl = Kubectl::new("1.30.2", None, testing::linux_amd64());
        assert!(kubectl.is_valid(&good).await.unwrap());
        assert!(!kubectl.is_valid(&garbage).await.unwrap());
        assert!(!kubectl.is_valid(&dir.path().join("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_install_copies_download() {
        let dir = tempfile::tempdir().unwrap();
        let downloaded = dir.path().join("download");
        std::fs::write(&downloaded, "kubectl-binary").unwrap();
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();

        let kubectl = Kubectl::new("1.30.2", Some(bin_dir.clone()), testing::linux_amd64());
        kubectl.install(&downloaded).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(bin_dir.join("kubectl")).unwrap(),
            "kubectl-binary"
        );
    }
}
