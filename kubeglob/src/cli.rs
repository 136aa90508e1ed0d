///
/// This module implements the CLI interface for kubeglob: flag parsing, turning
/// flags into an [`ApplyConfig`], building the cluster client and reporting.
///
/// All pipeline logic (discovery, decoding, defaulting, submission) lives in the
/// [`kubeglob-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: run the `kubeglob` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`kubeglob-core`]: ../../kubeglob_core/
use crate::cluster::ClusterClient;
use crate::load_config::{default_kubeconfig_path, load_config};
use anyhow::{Context, Result};
use clap::Parser;
use kubeglob_core::config::{ApplyConfig, FailurePolicy};
use kubeglob_core::pattern::Pattern;
use kubeglob_core::submit::{apply, ApplyReport};
use std::fmt::Write as _;
use std::path::PathBuf;

/// CLI for kubeglob: create Kubernetes resources based on a file glob.
#[derive(Parser, Debug)]
#[command(
    name = "kubeglob",
    version,
    about = "Create Kubernetes resource based on a file glob."
)]
pub struct Cli {
    /// base directory to walk
    #[arg(short = 'b', long = "base", default_value = ".")]
    pub base: PathBuf,

    /// glob to match files on
    #[arg(short = 'g', long = "glob", default_value = "*")]
    pub glob: String,

    /// kubeconfig path [default: $KUBECONFIG or $HOME/.kube/config]
    #[arg(short = 'c', long)]
    pub kubeconfig: Option<PathBuf>,

    /// kubeconfig context to use instead of current-context
    #[arg(long)]
    pub context: Option<String>,

    /// do not create resources, only print paths
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// log failing files and continue with the rest instead of stopping
    #[arg(short = 'k', long)]
    pub keep_going: bool,
}

impl Cli {
    /// Build the core run configuration. Fails only on a malformed glob.
    pub fn apply_config(&self) -> Result<ApplyConfig> {
        let pattern = Pattern::compile(&self.glob).context("error parsing glob")?;
        let policy = if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::FailFast
        };
        Ok(ApplyConfig::new(self.base.clone(), pattern)
            .dry_run(self.dry_run)
            .on_error(policy))
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    // The glob is checked before anything touches the filesystem or the cluster.
    let config = cli.apply_config()?;

    let kubeconfig = cli.kubeconfig.clone().unwrap_or_else(default_kubeconfig_path);
    let cluster_config = load_config(&kubeconfig, cli.context.as_deref())
        .context("error reading kubeconfig")?;
    let client = ClusterClient::new(&cluster_config).context("error creating kube client")?;

    let report = apply(&config, &client).await?;
    print!("{}", render_report(&report));

    if report.is_success() {
        tracing::info!(files = report.total(), "kubeglob completed");
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} files failed",
            report.failed.len(),
            report.total()
        )
    }
}

/// Human-readable summary for stdout. Dry runs list the paths that would be created.
///
/// Only a finished run has a report. Under [`FailurePolicy::FailFast`] the first
/// failure is returned from [`run`] instead, so nothing reaches stdout, not even
/// the files handled before it.
pub fn render_report(report: &ApplyReport) -> String {
    let mut out = String::new();
    for resource in &report.simulated {
        let _ = writeln!(out, "{}", resource.path.display());
    }
    for resource in &report.created {
        let _ = writeln!(
            out,
            "created {}/{} in namespace {} ({})",
            resource.kind.as_deref().unwrap_or("<unknown>"),
            resource.name.as_deref().unwrap_or("<unnamed>"),
            resource.namespace,
            resource.path.display()
        );
    }
    for failed in &report.failed {
        let _ = writeln!(out, "failed {}: {}", failed.path.display(), failed.error);
    }
    out
}
