//! CLI commands

pub mod cleanup;
pub mod deploy;
pub mod deps;
pub mod labels;
pub mod render;

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use kdeploy_core::DeployConfig;

use crate::error::Result;

/// Options selecting the overlay and the cluster it goes to
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Deploy configuration file (default: ./kdeploy.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overlay directory (overrides kustomize.path)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Target namespace (overrides cluster.namespace)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Kubeconfig context (default: cluster.kubeContext, then the current context)
    #[arg(long)]
    pub kube_context: Option<String>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl TargetArgs {
    /// Load the deploy configuration with command line overrides applied
    pub fn load(&self) -> Result<DeployConfig> {
        let mut config = load_config(self.config.as_deref(), self.path.as_deref())?;

        if let Some(namespace) = &self.namespace {
            config.cluster.namespace = Some(namespace.clone());
        }
        if let Some(context) = &self.kube_context {
            config.cluster.kube_context = Some(context.clone());
        }
        if config.cluster.kube_context.is_none() {
            config.cluster.kube_context = current_kube_context();
        }

        tracing::debug!(
            path = %config.kustomize.path.display(),
            namespace = config.cluster.namespace.as_deref().unwrap_or("<default>"),
            context = config.cluster.kube_context.as_deref().unwrap_or("<none>"),
            "loaded deploy configuration"
        );
        Ok(config)
    }
}

/// Load the deploy configuration, letting `path` override the overlay directory
pub fn load_config(config: Option<&Path>, path: Option<&Path>) -> Result<DeployConfig> {
    let mut config = DeployConfig::load(config)?;
    if let Some(path) = path {
        config.kustomize.path = path.to_path_buf();
    }
    Ok(config)
}

/// `current-context` of the local kubeconfig, if there is one
fn current_kube_context() -> Option<String> {
    match kube::config::Kubeconfig::read() {
        Ok(kubeconfig) => kubeconfig.current_context,
        Err(e) => {
            tracing::debug!(error = %e, "no kubeconfig, using kubectl defaults");
            None
        }
    }
}

/// Child of `cancel` that also fires once `timeout` seconds have passed
pub fn deadline(cancel: &CancellationToken, timeout: Option<u64>) -> CancellationToken {
    let token = cancel.child_token();

    if let Some(secs) = timeout {
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    tracing::warn!(timeout = secs, "timed out, cancelling");
                    timer.cancel();
                }
                _ = timer.cancelled() => {}
            }
        });
    }

    token
}
