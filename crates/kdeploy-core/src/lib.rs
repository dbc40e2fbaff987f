//! kdeploy Core - core types for deploying kustomize overlays
//!
//! This crate provides the pieces that do not talk to a cluster:
//! - `overlay`: `kustomization.yaml` parsing and dependency resolution
//! - `manifest`: rendered multi-document YAML as an ordered collection
//! - `images`: image references, build artifacts and image substitution
//! - `config`: the `kdeploy.yaml` deploy configuration

pub mod config;
pub mod error;
pub mod images;
pub mod manifest;
pub mod overlay;

pub use config::{ClusterTarget, DeployConfig, KubectlFlags, KustomizeConfig, DEFAULT_CONFIG_FILE};
pub use error::{CoreError, DependencyError, Result};
pub use images::{BuildArtifact, ImageReference};
pub use manifest::{Manifest, ManifestCollection};
pub use overlay::{DependencySet, KUSTOMIZATION_FILE, OverlayDescriptor, clean_path, resolve_dependencies};
