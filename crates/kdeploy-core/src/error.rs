//! Core error types

use std::path::PathBuf;

use thiserror::Error;

use crate::overlay::DependencySet;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cyclic overlay: {} is one of its own bases", .path.display())]
    CyclicOverlay { path: PathBuf },

    #[error("Failed to parse manifest {index}: {source}")]
    ManifestParse {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize manifest {index}: {source}")]
    ManifestSerialize {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid build artifact '{spec}': expected NAME=TAG")]
    InvalidArtifact { spec: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Dependency resolution failure that keeps the files found before the error
///
/// Watchers still want the partial list, so it travels with the cause.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct DependencyError {
    pub dependencies: DependencySet,
    #[source]
    pub source: CoreError,
}

impl DependencyError {
    pub fn new(dependencies: DependencySet, source: CoreError) -> Self {
        Self {
            dependencies,
            source,
        }
    }

    /// Split into the partial dependency set and the underlying error
    pub fn into_parts(self) -> (DependencySet, CoreError) {
        (self.dependencies, self.source)
    }
}
