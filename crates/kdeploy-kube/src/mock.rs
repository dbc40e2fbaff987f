//! In-memory renderer and cluster client for testing
//!
//! These stand in for `kustomize` and `kubectl` so the deploy pipeline can be
//! exercised without external programs or a cluster.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

use kdeploy_core::ManifestCollection;

use crate::client::ClusterClient;
use crate::error::{DeployError, Result};
use crate::render::ManifestRenderer;

/// Renderer returning canned output for every overlay
#[derive(Clone)]
pub struct StaticRenderer {
    output: std::result::Result<Vec<u8>, String>,
    rendered: Arc<RwLock<Vec<PathBuf>>>,
}

impl StaticRenderer {
    /// Render every overlay to `output`
    pub fn new(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: Ok(output.into()),
            rendered: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fail every render with `stderr`
    pub fn failing(stderr: impl Into<String>) -> Self {
        Self {
            output: Err(stderr.into()),
            rendered: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Overlay directories rendered so far
    pub fn rendered(&self) -> Vec<PathBuf> {
        self.rendered.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ManifestRenderer for StaticRenderer {
    async fn render(
        &self,
        overlay_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<ManifestCollection> {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled {
                program: "static renderer".to_string(),
            });
        }

        self.rendered.write().unwrap_or_else(PoisonError::into_inner).push(overlay_dir.to_path_buf());

        match &self.output {
            Ok(bytes) => Ok(ManifestCollection::from_bytes(bytes)),
            Err(stderr) => Err(DeployError::CommandFailed {
                command: format!("static renderer {}", overlay_dir.display()),
                code: Some(1),
                stderr: stderr.clone(),
            }),
        }
    }
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub applies: usize,
    pub deletes: usize,
}

/// Cluster client recording what it was asked to apply and delete
///
/// Every applied manifest is reported back as changed.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    applied: Arc<RwLock<Vec<ManifestCollection>>>,
    deleted: Arc<RwLock<Vec<ManifestCollection>>>,
    operations: Arc<RwLock<OperationCounts>>,
    fail_apply: Option<String>,
    fail_delete: Option<String>,
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply fail with `stderr`
    pub fn failing_apply(mut self, stderr: impl Into<String>) -> Self {
        self.fail_apply = Some(stderr.into());
        self
    }

    /// Make every delete fail with `stderr`
    pub fn failing_delete(mut self, stderr: impl Into<String>) -> Self {
        self.fail_delete = Some(stderr.into());
        self
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Collections passed to `apply`, in call order
    pub fn applied(&self) -> Vec<ManifestCollection> {
        self.applied.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Collections passed to `delete`, in call order
    pub fn deleted(&self) -> Vec<ManifestCollection> {
        self.deleted.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ClusterClient for MockClusterClient {
    async fn apply(
        &self,
        manifests: &ManifestCollection,
        _cancel: &CancellationToken,
    ) -> Result<ManifestCollection> {
        self.operations.write().unwrap_or_else(PoisonError::into_inner).applies += 1;

        if let Some(stderr) = &self.fail_apply {
            return Err(DeployError::CommandFailed {
                command: "mock apply".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            });
        }

        self.applied.write().unwrap_or_else(PoisonError::into_inner).push(manifests.clone());
        Ok(manifests.clone())
    }

    async fn delete(&self, manifests: &ManifestCollection, _cancel: &CancellationToken) -> Result<()> {
        self.operations.write().unwrap_or_else(PoisonError::into_inner).deletes += 1;

        if let Some(stderr) = &self.fail_delete {
            return Err(DeployError::CommandFailed {
                command: "mock delete".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            });
        }

        self.deleted.write().unwrap_or_else(PoisonError::into_inner).push(manifests.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_renderer_records_dirs() {
        let renderer = StaticRenderer::new("kind: A\n---\nkind: B\n");
        let manifests = renderer
            .render(Path::new("overlays/dev"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(manifests.len(), 2);
        assert_eq!(renderer.rendered(), vec![PathBuf::from("overlays/dev")]);
    }

    #[tokio::test]
    async fn test_mock_client_counts() {
        let client = MockClusterClient::new();
        let cancel = CancellationToken::new();
        let manifests = ManifestCollection::from_bytes(b"kind: A\n");

        client.apply(&manifests, &cancel).await.unwrap();
        client.delete(&manifests, &cancel).await.unwrap();
        client.delete(&manifests, &cancel).await.unwrap();

        let counts = client.operation_counts();
        assert_eq!(counts.applies, 1);
        assert_eq!(counts.deletes, 2);
        assert_eq!(client.applied(), vec![manifests]);
    }

    #[tokio::test]
    async fn test_mock_client_failure_still_counts() {
        let client = MockClusterClient::new().failing_apply("denied");
        let err = client
            .apply(&ManifestCollection::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("denied"));
        assert_eq!(client.operation_counts().applies, 1);
        assert!(client.applied().is_empty());
    }
}
