/// Concrete tool descriptors
pub mod helm;
pub mod kubectl;
pub mod platform;
pub mod talosctl;

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use helm::Helm;
pub use kubectl::Kubectl;
pub use platform::Platform;
pub use talosctl::Talosctl;

use crate::config::KubekitConfig;
use crate::downloader::Tool;
use crate::utils::CommandBuilder;

/// Tools kubekit knows how to install
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolKind {
    Kubectl,
    Helm,
    Talosctl,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Kubectl, ToolKind::Helm, ToolKind::Talosctl];

    /// Build the descriptor for this tool from configuration
    pub fn build(self, config: &KubekitConfig) -> Result<Box<dyn Tool>> {
        let platform = Platform::current()?;
        let install_dir = config.get_install_dir();
        let tool: Box<dyn Tool> = match self {
            ToolKind::Kubectl => Box::new(Kubectl::new(
                &config.tools.kubectl,
                install_dir,
                platform,
            )),
            ToolKind::Helm => Box::new(Helm::new(&config.tools.helm, install_dir, platform)),
            ToolKind::Talosctl => Box::new(Talosctl::new(
                &config.tools.talosctl,
                install_dir,
                platform,
            )),
        };
        Ok(tool)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolKind::Kubectl => "kubectl",
            ToolKind::Helm => "helm",
            ToolKind::Talosctl => "talosctl",
        };
        f.write_str(name)
    }
}

/// Release tags always carry a leading `v`
pub(crate) fn release_tag(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

/// Managed location of `name` inside the configured or default install dir
pub(crate) fn managed_path(
    install_dir: Option<&Path>,
    name: &str,
    platform: &Platform,
) -> Result<PathBuf> {
    let dir = match install_dir {
        Some(dir) => dir.to_path_buf(),
        None => crate::config::default_install_dir()?,
    };
    Ok(dir.join(format!("{}{}", name, platform.exe_suffix())))
}

fn is_path_like(candidate: &Path) -> bool {
    candidate.is_absolute() || candidate.components().count() > 1
}

/// Run `candidate` with `args` and return stdout when it exits successfully.
///
/// A path that does not exist, or a program that cannot be spawned because
/// it is missing or not executable, yields `Ok(None)`. An existing path that
/// fails to spawn for any other reason (a truncated download, a binary for
/// another architecture) is also treated as invalid.
pub(crate) async fn probe_candidate(candidate: &Path, args: &[&str]) -> Result<Option<String>> {
    let path_like = is_path_like(candidate);
    if path_like && !tokio::fs::try_exists(candidate).await? {
        return Ok(None);
    }

    let probe = CommandBuilder::new(candidate)
        .args(args)
        .context(format!("Failed to execute {}", candidate.display()))
        .probe()
        .await;
    let output = match probe {
        Err(e) if path_like => {
            debug!("{} cannot be run: {:#}", candidate.display(), e);
            None
        }
        other => other?,
    };

    Ok(output.filter(|out| out.success).map(|out| out.stdout))
}

/// Place a single downloaded binary at `target`
pub(crate) async fn install_binary(source: &Path, target: &Path) -> Result<()> {
    // replacing a running executable in place fails with ETXTBSY
    if tokio::fs::try_exists(target).await? {
        tokio::fs::remove_file(target)
            .await
            .with_context(|| format!("remove old {}", target.display()))?;
    }

    tokio::fs::copy(source, target)
        .await
        .with_context(|| format!("copy {} to {}", source.display(), target.display()))?;
    Ok(())
}
