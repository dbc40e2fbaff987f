//! Overlay rendering
//!
//! The renderer is an injected capability so the pipeline can be driven by a
//! canned renderer in tests instead of a real `kustomize` binary.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use kdeploy_core::{CoreError, ManifestCollection};

use crate::command;
use crate::error::Result;

/// Default renderer command; the overlay directory is appended
pub const DEFAULT_RENDER_COMMAND: &str = "kustomize build";

/// Turns an overlay directory into rendered manifests
#[async_trait]
pub trait ManifestRenderer: Send + Sync {
    /// Render `overlay_dir`, failing if `cancel` fires first
    async fn render(
        &self,
        overlay_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<ManifestCollection>;
}

/// Renders overlays with an external program, `kustomize build` by default
///
/// Anything that prints the overlay's manifests when given its directory as
/// last argument works, for example `kubectl kustomize`.
#[derive(Debug, Clone)]
pub struct KustomizeRenderer {
    program: String,
    args: Vec<String>,
}

impl KustomizeRenderer {
    /// Create a renderer running `kustomize build <dir>`
    pub fn new() -> Self {
        Self {
            program: "kustomize".to_string(),
            args: vec!["build".to_string()],
        }
    }

    /// Create a renderer from an explicit program and leading arguments
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create a renderer from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> std::result::Result<Self, CoreError> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or_else(|| CoreError::Config {
            message: "renderer command is empty".to_string(),
        })?;
        Ok(Self::with_program(program, words.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for KustomizeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestRenderer for KustomizeRenderer {
    async fn render(
        &self,
        overlay_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<ManifestCollection> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(overlay_dir.as_os_str().to_owned());

        let out = command::run(&self.program, &args, None, cancel).await?;
        let manifests = ManifestCollection::from_bytes(&out);
        tracing::debug!(
            overlay = %overlay_dir.display(),
            manifests = manifests.len(),
            "rendered overlay"
        );
        Ok(manifests)
    }
}
