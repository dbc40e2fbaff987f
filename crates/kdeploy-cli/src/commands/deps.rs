//! Deps command - list the files an overlay depends on

use std::path::Path;

use kdeploy_core::resolve_dependencies;

use super::load_config;
use crate::error::{CliError, Result};

/// Run the deps command
///
/// Prints one path per line. When resolution fails part way, the paths found
/// so far are still printed before the error is returned.
pub fn run(dir: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config, dir)?;

    match resolve_dependencies(&config.kustomize.path) {
        Ok(deps) => {
            for path in &deps {
                println!("{}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            let (deps, source) = e.into_parts();
            for path in &deps {
                println!("{}", path.display());
            }
            Err(CliError::Dependencies {
                message: source.to_string(),
            })
        }
    }
}
