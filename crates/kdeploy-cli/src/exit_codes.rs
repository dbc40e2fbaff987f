//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure, including failed kubectl runs
pub const ERROR: i32 = 1;

/// Render error - the overlay could not be rendered
pub const RENDER_ERROR: i32 = 3;

/// Config error - invalid kdeploy.yaml, renderer command or build artifact
pub const CONFIG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
