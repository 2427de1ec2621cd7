/// talosctl descriptor
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{install_binary, managed_path, probe_candidate, release_tag, Platform};
use crate::downloader::Tool;

const TALOS_RELEASE_BASE: &str = "https://github.com/siderolabs/talos/releases/download";

/// The Talos Linux management client
pub struct Talosctl {
    version: String,
    install_dir: Option<PathBuf>,
    platform: Platform,
}

impl Talosctl {
    pub fn new(version: &str, install_dir: Option<PathBuf>, platform: Platform) -> Self {
        Self {
            version: release_tag(version),
            install_dir,
            platform,
        }
    }
}

#[async_trait]
impl Tool for Talosctl {
    fn name(&self) -> &str {
        "talosctl"
    }

    async fn is_valid(&self, candidate: &Path) -> Result<bool> {
        Ok(probe_candidate(candidate, &["version", "--client"])
            .await?
            .is_some())
    }

    fn install_path(&self) -> Result<PathBuf> {
        managed_path(self.install_dir.as_deref(), self.name(), &self.platform)
    }

    fn download_url(&self) -> String {
        format!(
            "{}/{}/talosctl-{}-{}{}",
            TALOS_RELEASE_BASE,
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
