/// Kubekit - Kubernetes tool bootstrapper
///
/// Makes sure kubectl, helm and talosctl are available (downloading them
/// when they are not) and renders host-version-aware default values for
/// virtual control plane Helm charts.
mod config;
mod downloader;
mod k8s;
mod tools;
mod utils;
mod values;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::KubekitConfig;
use crate::downloader::{Downloader, DownloaderOptions, ReqwestFetcher};
use crate::k8s::KubernetesClient;
use crate::tools::ToolKind;
use crate::values::{ChartOptions, Distro, KubernetesVersion};

#[derive(Parser)]
#[command(name = "kubekit")]
#[command(about = "Install Kubernetes tooling and render control plane values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "kubekit.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Make sure a tool is installed and print its path
    Ensure {
        #[arg(value_enum)]
        tool: ToolKind,
    },

    /// Report which tools are usable without installing anything
    Check,

    /// Render default control plane values for a host cluster version
    Values {
        /// Host Kubernetes version (e.g. 1.28, v1.27.3)
        #[arg(long, conflicts_with = "from_cluster")]
        kubernetes_version: Option<String>,

        /// Read the version from the current host cluster via kubectl
        #[arg(long)]
        from_cluster: bool,

        /// Kubeconfig used with --from-cluster
        #[arg(long, requires = "from_cluster")]
        kubeconfig: Option<PathBuf>,

        /// Control plane distribution
        #[arg(long, value_enum)]
        distro: Option<Distro>,

        /// Write values to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate example configuration file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("kubekit={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Ensure { tool } => ensure(&cli, tool).await,
        Commands::Check => check(&cli).await,
        Commands::Values {
            ref kubernetes_version,
            from_cluster,
            ref kubeconfig,
            distro,
            ref output,
        } => {
            render_values(
                &cli,
                kubernetes_version.as_deref(),
                from_cluster,
                kubeconfig.clone(),
                distro,
                output.as_deref(),
            )
            .await
        }
        Commands::Init => init_config(&cli).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Resolve a tool, downloading it if neither PATH nor the install dir has one
async fn ensure_tool(config: &KubekitConfig, kind: ToolKind) -> Result<PathBuf> {
    let tool = kind.build(config)?;
    let fetcher = ReqwestFetcher::new(
        Some(config.download.timeout()),
        config.download.reject_http_errors,
    )?;
    let downloader = Downloader::new(
        tool,
        Box::new(fetcher),
        DownloaderOptions {
            temp_root: config.download.temp_dir.clone(),
        },
    );

    downloader
        .ensure_command()
        .await
        .with_context(|| format!("Failed to ensure {}", kind))
}

/// Ensure a single tool and print where it lives
async fn ensure(cli: &Cli, kind: ToolKind) -> Result<()> {
    let config =
        KubekitConfig::load_or_default(&cli.config).context("Failed to load configuration")?;

    let path = ensure_tool(&config, kind).await?;
    info!("✓ {} is available at {}", kind, path.display());
    println!("{}", path.display());

    Ok(())
}

/// Probe every known tool without installing
async fn check(cli: &Cli) -> Result<()> {
    let config =
        KubekitConfig::load_or_default(&cli.config).context("Failed to load configuration")?;

    let mut missing = Vec::new();
    for kind in ToolKind::ALL {
        let tool = kind.build(&config)?;
        let by_name = PathBuf::from(tool.name());
        if tool.is_valid(&by_name).await? {
            info!("✓ {} (PATH)", kind);
            continue;
        }

        let install_path = tool.install_path()?;
        if tool.is_valid(&install_path).await? {
            info!("✓ {} ({})", kind, install_path.display());
        } else {
            warn!("✗ {} not installed", kind);
            missing.push(kind);
        }
    }

    if !missing.is_empty() {
        info!("");
        info!("Install missing tools with:");
        for kind in missing {
            info!("  kubekit ensure {}", kind);
        }
    }

    Ok(())
}

/// Render default chart values
async fn render_values(
    cli: &Cli,
    kubernetes_version: Option<&str>,
    from_cluster: bool,
    kubeconfig: Option<PathBuf>,
    distro: Option<Distro>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let config =
        KubekitConfig::load_or_default(&cli.config).context("Failed to load configuration")?;

    let version = if from_cluster {
        let kubectl = ensure_tool(&config, ToolKind::Kubectl).await?;
        KubernetesClient::new(kubectl, kubeconfig)
            .server_version()
            .await
            .context("Failed to detect host cluster version")?
    } else {
        let requested = kubernetes_version.unwrap_or(&config.chart.kubernetes_version);
        KubernetesVersion::parse(requested).context("Invalid Kubernetes version")?
    };

    let options = ChartOptions {
        kubernetes_version: version,
        distro: distro.unwrap_or(config.chart.distro),
        common: config.chart.common.clone(),
    };
    let values = values::render_default_values(&options)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &values)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "Wrote {} values for {} to {}",
                options.distro,
                version,
                path.display()
            );
        }
        None => print!("{}", values),
    }

    Ok(())
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = KubekitConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Edit the configuration file to pin tool versions");
    info!("  2. Install the tools you need:");
    info!("     kubekit ensure kubectl");
    info!("  3. Render values for your host cluster:");
    info!("     kubekit values --from-cluster");

    Ok(())
}
