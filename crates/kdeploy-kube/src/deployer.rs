//! Kustomize deployer
//!
//! Binds a [`KustomizeConfig`] to a [`DeployPipeline`] so callers only deal
//! with build artifacts and a cancellation token.

use std::collections::BTreeMap;
use std::io::Write;
use tokio_util::sync::CancellationToken;

use kdeploy_core::{
    BuildArtifact, ClusterTarget, CoreError, DependencyError, DependencySet, KustomizeConfig,
    resolve_dependencies,
};

use crate::client::ClusterClient;
use crate::error::Result;
use crate::kubectl::KubectlCli;
use crate::pipeline::DeployPipeline;
use crate::render::{KustomizeRenderer, ManifestRenderer};
use crate::resources::DeployResult;

/// Label key identifying the deployer that created a resource
pub const DEPLOYER_LABEL: &str = "kdeploy.io/deployer";

/// Label value for resources deployed from kustomize overlays
pub const KUSTOMIZE_DEPLOYER: &str = "kustomize";

/// Deploys the overlay at `config.path`
pub struct KustomizeDeployer<R, C> {
    config: KustomizeConfig,
    pipeline: DeployPipeline<R, C>,
}

impl KustomizeDeployer<KustomizeRenderer, KubectlCli> {
    /// Deployer rendering with the configured command and applying with `kubectl`
    pub fn kubectl(
        config: KustomizeConfig,
        target: &ClusterTarget,
    ) -> std::result::Result<Self, CoreError> {
        let renderer = KustomizeRenderer::from_command_line(&config.renderer)?;
        let cluster = KubectlCli::new(target, config.flags.clone());
        Ok(Self::new(config, renderer, cluster))
    }

    /// Send kubectl's own output to `out`
    pub fn with_kubectl_output(self, out: impl Write + Send + 'static) -> Self {
        let (renderer, cluster) = self.pipeline.into_parts();
        Self::new(self.config, renderer, cluster.with_output(out))
    }
}

impl<R: ManifestRenderer, C: ClusterClient> KustomizeDeployer<R, C> {
    pub fn new(config: KustomizeConfig, renderer: R, cluster: C) -> Self {
        Self {
            config,
            pipeline: DeployPipeline::new(renderer, cluster),
        }
    }

    pub fn config(&self) -> &KustomizeConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &DeployPipeline<R, C> {
        &self.pipeline
    }

    /// Labels to attach to everything this deployer creates
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(DEPLOYER_LABEL.to_string(), KUSTOMIZE_DEPLOYER.to_string())])
    }

    /// Render, substitute `builds` and apply the overlay
    pub async fn deploy(
        &self,
        builds: &[BuildArtifact],
        cancel: &CancellationToken,
    ) -> Result<Vec<DeployResult>> {
        tracing::debug!(path = %self.config.path.display(), builds = builds.len(), "deploying overlay");
        self.pipeline.deploy(&self.config.path, builds, cancel).await
    }

    /// Render the overlay and delete its resources
    pub async fn cleanup(&self, cancel: &CancellationToken) -> Result<()> {
        tracing::debug!(path = %self.config.path.display(), "cleaning up overlay");
        self.pipeline.cleanup(&self.config.path, cancel).await
    }

    /// Files the overlay depends on
    pub fn dependencies(&self) -> std::result::Result<DependencySet, DependencyError> {
        resolve_dependencies(&self.config.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::mock::{MockClusterClient, StaticRenderer};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn config(path: impl Into<PathBuf>) -> KustomizeConfig {
        KustomizeConfig {
            path: path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_labels() {
        let deployer = KustomizeDeployer::new(
            config("."),
            StaticRenderer::new(""),
            MockClusterClient::new(),
        );
        let labels = deployer.labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("kdeploy.io/deployer").map(String::as_str), Some("kustomize"));
    }

    #[tokio::test]
    async fn test_deploy_uses_configured_path() {
        let deployer = KustomizeDeployer::new(
            config("overlays/prod"),
            StaticRenderer::new(
                "apiVersion: v1\nkind: Pod\nmetadata:\n  name: app\nspec:\n  containers:\n    - image: app\n",
            ),
            MockClusterClient::new(),
        );

        let results = deployer
            .deploy(&[BuildArtifact::new("app", "app:v2")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].to_string(), "Pod/app");
        assert_eq!(
            deployer.pipeline().renderer().rendered(),
            vec![Path::new("overlays/prod").to_path_buf()]
        );
        let applied = deployer.pipeline().cluster().applied();
        assert!(applied[0].get(0).unwrap().to_string_lossy().contains("app:v2"));
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_staged() {
        let deployer = KustomizeDeployer::new(
            config("k8s"),
            StaticRenderer::new("kind: A\n"),
            MockClusterClient::new().failing_delete("unreachable"),
        );

        let err = deployer.cleanup(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Delete));
    }

    #[test]
    fn test_dependencies() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("kustomization.yaml"),
            "resources:\n  - deployment.yaml\n",
        )
        .unwrap();

        let deployer = KustomizeDeployer::new(
            config(dir.path()),
            StaticRenderer::new(""),
            MockClusterClient::new(),
        );
        let deps = deployer.dependencies().unwrap();
        assert_eq!(
            deps.into_vec(),
            vec![
                dir.path().join("kustomization.yaml"),
                dir.path().join("deployment.yaml"),
            ]
        );
    }

    #[test]
    fn test_kubectl_deployer_from_config() {
        let config = KustomizeConfig {
            path: PathBuf::from("k8s"),
            renderer: "kubectl kustomize".to_string(),
            ..Default::default()
        };
        let target = ClusterTarget {
            namespace: Some("dev".to_string()),
            ..Default::default()
        };

        let deployer = KustomizeDeployer::kubectl(config, &target).unwrap();
        assert_eq!(deployer.pipeline().renderer().program(), "kubectl");
        assert_eq!(deployer.pipeline().renderer().args(), ["kustomize".to_string()]);
        assert_eq!(deployer.pipeline().cluster().namespace(), Some("dev"));
    }

    #[test]
    fn test_kubectl_deployer_rejects_empty_renderer() {
        let config = KustomizeConfig {
            renderer: "  ".to_string(),
            ..Default::default()
        };
        let result = KustomizeDeployer::kubectl(config, &ClusterTarget::default());
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }
}
