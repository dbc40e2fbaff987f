//! kdeploy Kube - Kubernetes integration for kdeploy
//!
//! This crate provides:
//! - **Rendering**: `kustomize build` (or any compatible command) behind the `ManifestRenderer` trait
//! - **Cluster Boundary**: `kubectl apply` / `kubectl delete` behind the `ClusterClient` trait
//! - **Deploy Pipeline**: render → replace images → apply, and render → delete
//! - **Kustomize Deployer**: a pipeline bound to an overlay configuration, with labels and dependencies
//! - **Test Doubles**: `StaticRenderer` and `MockClusterClient` for exercising the pipeline offline

pub mod client;
mod command;
pub mod deployer;
pub mod error;
pub mod kubectl;
pub mod mock;
pub mod pipeline;
pub mod render;
pub mod resources;

pub use client::ClusterClient;
pub use deployer::{DEPLOYER_LABEL, KUSTOMIZE_DEPLOYER, KustomizeDeployer};
pub use error::{DeployError, Result, Stage};
pub use kubectl::KubectlCli;
pub use mock::{MockClusterClient, OperationCounts, StaticRenderer};
pub use pipeline::DeployPipeline;
pub use render::{DEFAULT_RENDER_COMMAND, KustomizeRenderer, ManifestRenderer};
pub use resources::{DeployResult, parse_deploy_results};
