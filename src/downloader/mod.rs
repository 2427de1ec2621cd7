/// Resolution and installation of command-line tools
///
/// A [`Downloader`] makes sure one tool is usable: it first tries the tool's
/// bare name (a PATH lookup), then its managed install path, and only when
/// both probes fail does it download and install a fresh copy.
pub mod fetcher;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

pub use fetcher::{HttpFetcher, ReqwestFetcher};

/// Name of the downloaded artifact inside the private working directory
const DOWNLOAD_FILE_NAME: &str = "download";

/// An installable command-line tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Executable name, used for PATH lookup and for log messages
    fn name(&self) -> &str;

    /// Check whether `candidate` (a bare name or a path) is a working copy
    async fn is_valid(&self, candidate: &Path) -> Result<bool>;

    /// Where a managed copy of the tool lives
    fn install_path(&self) -> Result<PathBuf>;

    /// Source of the artifact for the current platform
    fn download_url(&self) -> String;

    /// Turn the downloaded artifact into an executable at [`Tool::install_path`]
    async fn install(&self, downloaded: &Path) -> Result<()>;
}

/// Tunables for the download step
#[derive(Debug, Clone, Default)]
pub struct DownloaderOptions {
    /// Parent directory for the private download directory.
    /// Defaults to the system temp dir.
    pub temp_root: Option<PathBuf>,
}

/// Ensures a single tool is available, installing it if needed
pub struct Downloader {
    tool: Box<dyn Tool>,
    fetcher: Box<dyn HttpFetcher>,
    options: DownloaderOptions,
}

impl Downloader {
    /// Create a downloader for `tool`
    pub fn new(
        tool: Box<dyn Tool>,
        fetcher: Box<dyn HttpFetcher>,
        options: DownloaderOptions,
    ) -> Self {
        Self {
            tool,
            fetcher,
            options,
        }
    }

    /// Return a usable path for the tool, downloading it when necessary.
    ///
    /// The installed copy is not probed again after a download.
    pub async fn ensure_command(&self) -> Result<PathBuf> {
        let command = self.tool.name();
        let by_name = PathBuf::from(command);
        if self.tool.is_valid(&by_name).await? {
            debug!("{} found in PATH", command);
            return Ok(by_name);
        }

        let install_path = self.tool.install_path()?;
        if self.tool.is_valid(&install_path).await? {
            debug!("{} found at {}", command, install_path.display());
            return Ok(install_path);
        }

        self.download_executable(command, &install_path, &self.tool.download_url())
            .await?;

        Ok(install_path)
    }

    async fn download_executable(
        &self,
        command: &str,
        install_path: &Path,
        install_from_url: &str,
    ) -> Result<()> {
        if let Some(parent) = install_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_install_dir(parent).await.with_context(|| {
                    format!("create install directory {}", parent.display())
                })?;
            }
        }

        self.download_file(command, install_from_url)
            .await
            .context("download file")?;

        make_executable(install_path)
            .await
            .context("cannot make file executable")?;

        info!("Installed {} to {}", command, install_path.display());
        Ok(())
    }

    /// Fetch into a private directory and hand the file to the tool's install step.
    ///
    /// The directory is removed when this returns, whatever the outcome.
    async fn download_file(&self, command: &str, install_from_url: &str) -> Result<()> {
        info!("Downloading {}...", command);

        let url = Url::parse(install_from_url)
            .with_context(|| format!("invalid download url {}", install_from_url))?;

        let workdir = self.create_workdir()?;
        let archive_file = workdir.path().join(DOWNLOAD_FILE_NAME);

        let mut file = File::create(&archive_file)
            .await
            .with_context(|| format!("create {}", archive_file.display()))?;
        self.fetcher.fetch(&url, &mut file).await?;
        file.flush().await?;
        drop(file);

        self.tool.install(&archive_file).await
    }

    fn create_workdir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("kubekit-");
        let dir = match &self.options.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.context("create download directory")
    }
}

async fn create_install_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(dir).await
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    tokio::fs::metadata(path).await.map(|_| ())
}
