//! Deploy command - render an overlay, point it at built images and apply it

use console::style;
use tokio_util::sync::CancellationToken;

use kdeploy_core::BuildArtifact;
use kdeploy_kube::{DeployResult, KustomizeDeployer};

use super::{TargetArgs, deadline};
use crate::error::{CliError, Result};

/// Run the deploy command
pub async fn run(
    target: &TargetArgs,
    images: &[BuildArtifact],
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = target.load()?;
    let path = config.kustomize.path.clone();
    let deployer = KustomizeDeployer::kubectl(config.kustomize, &config.cluster)?;
    // Keep stdout clean for the JSON document
    let deployer = if json {
        deployer.with_kubectl_output(std::io::stderr())
    } else {
        deployer.with_kubectl_output(std::io::stdout())
    };

    if !json {
        println!(
            "{} Deploying {} to namespace {}",
            style("→").blue().bold(),
            style(path.display()).cyan(),
            style(config.cluster.namespace.as_deref().unwrap_or("<default>")).yellow()
        );
    }

    let cancel = deadline(cancel, target.timeout);
    let results = deployer.deploy(images, &cancel).await?;

    if json {
        let out = serde_json::to_string_pretty(&results)
            .map_err(|e| CliError::other(format!("failed to serialize results: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

fn print_results(results: &[DeployResult]) {
    if results.is_empty() {
        println!("{} Nothing changed", style("✓").green().bold());
        return;
    }

    for result in results {
        println!("  {} {}", style("•").dim(), result);
    }
    println!(
        "{} Deployed {} resource(s)",
        style("✓").green().bold(),
        results.len()
    );
}
