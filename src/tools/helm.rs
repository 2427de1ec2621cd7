/// helm descriptor
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{install_binary, managed_path, probe_candidate, release_tag, Platform};
use crate::downloader::Tool;
use crate::utils::CommandBuilder;

const HELM_RELEASE_BASE: &str = "https://get.helm.sh";

/// Directory the release archive is unpacked into, next to the download
const UNPACK_DIR: &str = "unpacked";

/// The Helm package manager
pub struct Helm {
    version: String,
    install_dir: Option<PathBuf>,
    platform: Platform,
}

impl Helm {
    pub fn new(version: &str, install_dir: Option<PathBuf>, platform: Platform) -> Self {
        Self {
            version: release_tag(version),
            install_dir,
            platform,
        }
    }

    fn archive_extension(&self) -> &'static str {
        if self.platform.os == "windows" {
            "zip"
        } else {
            "tar.gz"
        }
    }

    /// Path of the helm binary inside an unpacked release archive
    fn binary_in_archive(&self, unpacked: &Path) -> PathBuf {
        unpacked
            .join(format!("{}-{}", self.platform.os, self.platform.arch))
            .join(format!("helm{}", self.platform.exe_suffix()))
    }
}

/// Helm 3 and 4 print `v3.x.y+g<sha>` for `version --short`
fn is_supported_version(stdout: &str) -> bool {
    let version = stdout.trim();
    version.starts_with("v3.") || version.starts_with("v4.")
}

#[async_trait]
impl Tool for Helm {
    fn name(&self) -> &str {
        "helm"
    }

    async fn is_valid(&self, candidate: &Path) -> Result<bool> {
        let Some(stdout) = probe_candidate(candidate, &["version", "--short"]).await? else {
            return Ok(false);
        };
        debug!("{} reports {}", candidate.display(), stdout.trim());
        Ok(is_supported_version(&stdout))
    }

    fn install_path(&self) -> Result<PathBuf> {
        managed_path(self.install_dir.as_deref(), self.name(), &self.platform)
    }

    fn download_url(&self) -> String {
        format!(
            "{}/helm-{}-{}-{}.{}",
            HELM_RELEASE_BASE,
            self.version,
            self.platform.os,
            self.platform.arch,
            self.archive_extension()
        )
    }

    /// Unpack the release archive with the system `tar` and move the binary into place
    async fn install(&self, downloaded: &Path) -> Result<()> {
        let workdir = downloaded
            .parent()
            .context("downloaded archive has no parent directory")?;
        let unpacked = workdir.join(UNPACK_DIR);
        tokio::fs::create_dir_all(&unpacked)
            .await
            .with_context(|| format!("create {}", unpacked.display()))?;

        CommandBuilder::new("tar")
            .arg("-xf")
            .arg(downloaded)
            .arg("-C")
            .arg(&unpacked)
            .context("Failed to execute tar")
            .run_silent()
            .await
            .context("unpack helm archive")?;

        let binary = self.binary_in_archive(&unpacked);
        if !tokio::fs::try_exists(&binary).await? {
            anyhow::bail!("helm binary not found in archive at {}", binary.display());
        }

        install_binary(&binary, &self.install_path()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[test]
    fn test_download_url() {
        let helm = Helm::new("3.14.4", None, testing::linux_amd64());
        assert_eq!(
            helm.download_url(),
            "https://get.helm.sh/helm-v3.14.4-linux-amd64.tar.gz"
        );

        let windows = Platform::from_parts("windows", "aarch64").unwrap();
        let helm = Helm::new("v3.14.4", None, windows);
        assert_eq!(
            helm.download_url(),
            "https://get.helm.sh/helm-v3.14.4-windows-arm64.zip"
        );
    }

    #[test]
    fn test_supported_versions() {
        assert!(is_supported_version("v3.14.4+g81c902a\n"));
        assert!(is_supported_version("v4.0.0"));
        assert!(!is_supported_version("Client: &version.Version{SemVer:\"v2.17.0\"}"));
        assert!(!is_supported_version(""));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let helm3 = testing::fake_binary(dir.path(), "helm", "echo v3.14.4+g81c902a");
        let helm2 = testing::fake_binary(dir.path(), "helm2", "echo v2.17.0");

        let helm = Helm::new("3.14.4", None, testing::linux_amd64());
        assert!(helm.is_valid(&helm3).await.unwrap());
        assert!(!helm.is_valid(&helm2).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_unpacks_archive() {
        let dir = tempfile::tempdir().unwrap();

        // build a release-shaped archive with the system tar
        let staging = dir.path().join("staging");
        std::fs::create_dir_all(staging.join("linux-amd64")).unwrap();
        std::fs::write(staging.join("linux-amd64").join("helm"), "helm-binary").unwrap();
        std::fs::write(staging.join("linux-amd64").join("LICENSE"), "license").unwrap();

        let workdir = dir.path().join("work");
        std::fs::create_dir(&workdir).unwrap();
        let archive = workdir.join("download");
        CommandBuilder::new("tar")
            .arg("-czf")
            .arg(&archive)
            .args(["-C", staging.to_str().unwrap(), "linux-amd64"])
            .run_silent()
            .await
            .unwrap();

        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        let helm = Helm::new("3.14.4", Some(bin_dir.clone()), testing::linux_amd64());
        helm.install(&archive).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(bin_dir.join("helm")).unwrap(),
            "helm-binary"
        );
        assert!(workdir.join(UNPACK_DIR).join("linux-amd64").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_rejects_non_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("download");
        std::fs::write(&archive, "<html>not found</html>").unwrap();

        let helm = Helm::new("3.14.4", Some(dir.path().join("bin")), testing::linux_amd64());
        let err = helm.install(&archive).await.unwrap_err();

        assert_eq!(err.to_string(), "unpack helm archive");
    }
}
