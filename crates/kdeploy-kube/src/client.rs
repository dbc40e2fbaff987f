//! Cluster boundary for applying and deleting manifests

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use kdeploy_core::ManifestCollection;

use crate::error::Result;

/// Applies and deletes manifests on a cluster
///
/// Namespace, context and flags are fixed when the client is built.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Apply `manifests`, returning the ones that were actually changed
    async fn apply(
        &self,
        manifests: &ManifestCollection,
        cancel: &CancellationToken,
    ) -> Result<ManifestCollection>;

    /// Delete the resources described by `manifests`
    async fn delete(&self, manifests: &ManifestCollection, cancel: &CancellationToken)
    -> Result<()>;
}
