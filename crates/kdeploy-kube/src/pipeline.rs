//! Render → replace images → apply/delete
//!
//! Each call runs the stages in order and stops at the first failure, which
//! is reported wrapped with the name of the failing stage. Nothing is kept
//! between calls and nothing is retried.

use std::path::Path;
use tokio_util::sync::CancellationToken;

use kdeploy_core::BuildArtifact;

use crate::client::ClusterClient;
use crate::error::{DeployError, Result, Stage};
use crate::render::ManifestRenderer;
use crate::resources::{DeployResult, parse_deploy_results};

/// Deploy pipeline over an injected renderer and cluster client
pub struct DeployPipeline<R, C> {
    renderer: R,
    cluster: C,
}

impl<R: ManifestRenderer, C: ClusterClient> DeployPipeline<R, C> {
    pub fn new(renderer: R, cluster: C) -> Self {
        Self { renderer, cluster }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn into_parts(self) -> (R, C) {
        (self.renderer, self.cluster)
    }

    /// Render `overlay_dir`, point its images at `builds` and apply it
    ///
    /// An overlay rendering to no manifests is a successful no-op and the
    /// cluster is not contacted.
    pub async fn deploy(
        &self,
        overlay_dir: &Path,
        builds: &[BuildArtifact],
        cancel: &CancellationToken,
    ) -> Result<Vec<DeployResult>> {
        let manifests = self
            .renderer
            .render(overlay_dir, cancel)
            .await
            .map_err(|e| e.in_stage(Stage::ReadingManifests))?;

        if manifests.is_empty() {
            tracing::info!(overlay = %overlay_dir.display(), "no manifests to deploy");
            return Ok(Vec::new());
        }

        let manifests = manifests
            .replace_images(builds)
            .map_err(|e| DeployError::from(e).in_stage(Stage::ReplacingImages))?;

        let updated = self
            .cluster
            .apply(&manifests, cancel)
            .await
            .map_err(|e| e.in_stage(Stage::Apply))?;

        tracing::info!(
            overlay = %overlay_dir.display(),
            rendered = manifests.len(),
            updated = updated.len(),
            "deployed"
        );
        Ok(parse_deploy_results(&updated))
    }

    /// Render `overlay_dir` and delete its resources
    ///
    /// Images are not substituted; deletion only needs resource identities.
    pub async fn cleanup(&self, overlay_dir: &Path, cancel: &CancellationToken) -> Result<()> {
        let manifests = self
            .renderer
            .render(overlay_dir, cancel)
            .await
            .map_err(|e| e.in_stage(Stage::ReadingManifests))?;

        self.cluster
            .delete(&manifests, cancel)
            .await
            .map_err(|e| e.in_stage(Stage::Delete))?;

        tracing::info!(
            overlay = %overlay_dir.display(),
            manifests = manifests.len(),
            "cleaned up"
        );
        Ok(())
    }
}
