//! Deploy configuration
//!
//! Read from `kdeploy.yaml` in the working directory unless another file is
//! given. A relative overlay path is taken relative to the config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "kdeploy.yaml";

/// Deploy configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub kustomize: KustomizeConfig,

    #[serde(default)]
    pub cluster: ClusterTarget,
}

fn default_api_version() -> String {
    "kdeploy/v1".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kustomize: KustomizeConfig::default(),
            cluster: ClusterTarget::default(),
        }
    }
}

impl DeployConfig {
    /// Load an explicit config file, or `kdeploy.yaml` if present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|source| CoreError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if !config.api_version.starts_with("kdeploy/") {
            return Err(CoreError::Config {
                message: format!(
                    "unsupported apiVersion '{}' in {}",
                    config.api_version,
                    path.display()
                ),
            });
        }

        if config.kustomize.path.is_relative()
            && let Some(parent) = path.parent()
        {
            config.kustomize.path = parent.join(&config.kustomize.path);
        }

        Ok(config)
    }
}

/// Kustomize overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeConfig {
    /// Overlay directory holding `kustomization.yaml`
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Renderer command line; the overlay path is appended as last argument
    #[serde(default = "default_renderer")]
    pub renderer: String,

    /// Extra kubectl flags
    #[serde(default)]
    pub flags: KubectlFlags,
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_renderer() -> String {
    "kustomize build".to_string()
}

impl Default for KustomizeConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            renderer: default_renderer(),
            flags: KubectlFlags::default(),
        }
    }
}

/// Additional flags passed to kubectl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlFlags {
    /// Passed to every invocation, before the command
    pub global: Vec<String>,
    /// Passed to `kubectl apply`
    pub apply: Vec<String>,
    /// Passed to `kubectl delete`
    pub delete: Vec<String>,
}

/// Where manifests are applied
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTarget {
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub kube_context: Option<String>,

    /// kubectl program
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

impl Default for ClusterTarget {
    fn default() -> Self {
        Self {
            namespace: None,
            kube_context: None,
            kubectl: default_kubectl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: DeployConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.api_version, "kdeploy/v1");
        assert_eq!(config.kustomize.path, PathBuf::from("."));
        assert_eq!(config.kustomize.renderer, "kustomize build");
        assert_eq!(config.kustomize.flags, KubectlFlags::default());
        assert!(config.cluster.namespace.is_none());
        assert_eq!(config.cluster.kubectl, "kubectl");
    }

    #[test]
    fn test_load_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kdeploy.yaml");
        std::fs::write(
            &path,
            r#"
apiVersion: kdeploy/v1
kustomize:
  path: overlays/dev
  flags:
    global: ["--v=2"]
    apply: ["--server-side"]
cluster:
  namespace: dev
  kubeContext: minikube
"#,
        )
        .unwrap();

        let config = DeployConfig::load(Some(&path)).unwrap();
        assert_eq!(config.kustomize.path, tmp.path().join("overlays/dev"));
        assert_eq!(config.kustomize.flags.global, vec!["--v=2"]);
        assert_eq!(config.kustomize.flags.apply, vec!["--server-side"]);
        assert!(config.kustomize.flags.delete.is_empty());
        assert_eq!(config.cluster.namespace.as_deref(), Some("dev"));
        assert_eq!(config.cluster.kube_context.as_deref(), Some("minikube"));
    }

    #[test]
    fn test_absolute_path_is_kept() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kdeploy.yaml");
        std::fs::write(&path, "kustomize:\n  path: /srv/k8s\n").unwrap();

        let config = DeployConfig::load_from(&path).unwrap();
        assert_eq!(config.kustomize.path, PathBuf::from("/srv/k8s"));
    }

    #[test]
    fn test_rejects_foreign_api_version() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kdeploy.yaml");
        std::fs::write(&path, "apiVersion: skaffold/v1\n").unwrap();

        let err = DeployConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = DeployConfig::load(Some(&tmp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
