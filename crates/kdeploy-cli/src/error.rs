//! CLI error types with exit code handling
//!
//! Library errors are flattened into messages here and mapped to the exit
//! codes in [`crate::exit_codes`].

use miette::Diagnostic;
use thiserror::Error;

use kdeploy_core::CoreError;
use kdeploy_kube::{DeployError, Stage};

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The overlay could not be rendered
    #[error("Render error: {message}")]
    #[diagnostic(code(kdeploy::cli::render))]
    Render {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid configuration or command line values
    #[error("Configuration error: {message}")]
    #[diagnostic(code(kdeploy::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Applying or deleting manifests failed
    #[error("Deploy failed: {message}")]
    #[diagnostic(code(kdeploy::cli::deploy))]
    Deploy { message: String },

    /// Dependency resolution stopped early
    #[error("Dependency resolution failed: {message}")]
    #[diagnostic(code(kdeploy::cli::dependencies))]
    Dependencies { message: String },

    /// Interrupted or out of time
    #[error("Cancelled: {message}")]
    #[diagnostic(
        code(kdeploy::cli::cancelled),
        help("the operation was interrupted or its --timeout elapsed")
    )]
    Cancelled { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kdeploy::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(kdeploy::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Render { .. } => exit_codes::RENDER_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Deploy { .. }
            | CliError::Dependencies { .. }
            | CliError::Cancelled { .. }
            | CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a passthrough error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Io { .. } => CliError::Io { message },
            CoreError::YamlParse { .. } => CliError::config_with_help(
                message,
                format!("check {} against the documented format", kdeploy_core::DEFAULT_CONFIG_FILE),
            ),
            CoreError::Config { .. } | CoreError::InvalidArtifact { .. } => CliError::Config {
                message,
                help: None,
            },
            _ => CliError::Other { message },
        }
    }
}

impl From<DeployError> for CliError {
    fn from(err: DeployError) -> Self {
        let message = err.to_string();

        if err.is_cancelled() {
            return CliError::Cancelled { message };
        }

        match err.stage() {
            Some(Stage::ReadingManifests) => CliError::Render {
                message,
                help: Some("run the renderer by hand on the overlay to see its full output".to_string()),
            },
            Some(_) => CliError::Deploy { message },
            None => match err {
                DeployError::Core(core) => core.into(),
                _ => CliError::Other { message },
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
