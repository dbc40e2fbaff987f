//! Identities of deployed resources

use kube::api::DynamicObject;
use serde::Serialize;
use std::fmt;

use kdeploy_core::ManifestCollection;

/// A resource the cluster reported as applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// None when the manifest does not set one (cluster-scoped, or the default namespace)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl fmt::Display for DeployResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", ns, self.kind, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// Parse applied manifests into resource identities
///
/// Documents without `apiVersion`, `kind` or `metadata.name` are skipped.
pub fn parse_deploy_results(manifests: &ManifestCollection) -> Vec<DeployResult> {
    let mut results = Vec::with_capacity(manifests.len());

    for (index, manifest) in manifests.iter().enumerate() {
        let obj: DynamicObject = match serde_yaml::from_slice(manifest.as_bytes()) {
            Ok(obj) => obj,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unparseable manifest");
                continue;
            }
        };

        let (Some(types), Some(name)) = (obj.types, obj.metadata.name) else {
            tracing::warn!(index, "skipping manifest without apiVersion, kind or name");
            continue;
        };

        results.push(DeployResult {
            api_version: types.api_version,
            kind: types.kind,
            name,
            namespace: obj.metadata.namespace,
        });
    }

    results
}
