//! Render command - print the manifests an overlay renders to

use std::io::Write;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use kdeploy_core::BuildArtifact;
use kdeploy_kube::{DeployError, KustomizeRenderer, ManifestRenderer, Stage};

use super::load_config;
use crate::error::Result;

/// Run the render command
pub async fn run(
    dir: Option<&Path>,
    config: Option<&Path>,
    images: &[BuildArtifact],
    cancel: &CancellationToken,
) -> Result<()> {
    let config = load_config(config, dir)?;
    let renderer = KustomizeRenderer::from_command_line(&config.kustomize.renderer)?;

    let mut manifests = renderer
        .render(&config.kustomize.path, cancel)
        .await
        .map_err(|e| e.in_stage(Stage::ReadingManifests))?;

    if !images.is_empty() {
        manifests = manifests
            .replace_images(images)
            .map_err(|e| DeployError::from(e).in_stage(Stage::ReplacingImages))?;
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&manifests.to_bytes())?;
    stdout.flush()?;
    Ok(())
}
