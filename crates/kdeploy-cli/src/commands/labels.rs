//! Labels command - print the labels attached to deployed resources

use kdeploy_core::{ClusterTarget, KustomizeConfig};
use kdeploy_kube::KustomizeDeployer;

use crate::error::{CliError, Result};

/// Run the labels command
pub fn run(json: bool) -> Result<()> {
    let deployer = KustomizeDeployer::kubectl(KustomizeConfig::default(), &ClusterTarget::default())?;
    let labels = deployer.labels();

    if json {
        let out = serde_json::to_string_pretty(&labels)
            .map_err(|e| CliError::other(format!("failed to serialize labels: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    for (key, value) in &labels {
        println!("{}={}", key, value);
    }
    Ok(())
}
