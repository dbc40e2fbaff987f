//! Cleanup command - delete everything an overlay renders

use console::style;
use tokio_util::sync::CancellationToken;

use kdeploy_kube::KustomizeDeployer;

use super::{TargetArgs, deadline};
use crate::error::Result;

/// Run the cleanup command
pub async fn run(target: &TargetArgs, cancel: &CancellationToken) -> Result<()> {
    let config = target.load()?;
    let path = config.kustomize.path.clone();
    let deployer = KustomizeDeployer::kubectl(config.kustomize, &config.cluster)?
        .with_kubectl_output(std::io::stdout());

    println!(
        "{} Deleting resources of {}",
        style("→").blue().bold(),
        style(path.display()).cyan()
    );

    let cancel = deadline(cancel, target.timeout);
    deployer.cleanup(&cancel).await?;

    println!("{} Cleaned up", style("✓").green().bold());
    Ok(())
}
