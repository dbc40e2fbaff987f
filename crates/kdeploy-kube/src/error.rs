//! Error types for kdeploy-kube

use std::fmt;

use thiserror::Error;

/// Result type for kdeploy-kube operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rendering the overlay
    ReadingManifests,
    /// Substituting built images
    ReplacingImages,
    /// Applying to the cluster
    Apply,
    /// Deleting from the cluster
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ReadingManifests => "reading manifests",
            Stage::ReplacingImages => "replacing images in manifests",
            Stage::Apply => "apply",
            Stage::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while rendering or deploying an overlay
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeployError {
    /// A pipeline stage failed
    #[error("{stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<DeployError>,
    },

    /// External program could not be started or its pipes failed
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External program exited unsuccessfully
    #[error("{command} failed ({}): {}", exit_status(.code), .stderr.trim())]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Operation was cancelled before the program finished
    #[error("{program} was cancelled")]
    Cancelled { program: String },

    /// Manifest or overlay handling error
    #[error(transparent)]
    Core(#[from] kdeploy_core::CoreError),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    /// Attribute this error to a pipeline stage
    pub fn in_stage(self, stage: Stage) -> Self {
        DeployError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Outermost stage this error was attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, below any stage wrapping
    pub fn root(&self) -> &DeployError {
        match self {
            DeployError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check whether the failure came from cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), DeployError::Cancelled { .. })
    }
}
