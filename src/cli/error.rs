//! CLI error types

use std::path::PathBuf;

use obs2ebird::error::{ConfigError, PipelineError};
use thiserror::Error;

/// Errors surfaced by the `obs2ebird` binary
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Not a directory: {0}")]
    FolderNotFound(PathBuf),
}

impl CliError {
    /// Get a user-friendly error message for terminal output
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(err) => {
                format!("{err}\n\nHint: Pass another configuration file with --config.")
            }
            CliError::Pipeline(err) => err.user_message(),
            CliError::FolderNotFound(path) => {
                format!(
                    "Import folder {} does not exist.\n\nHint: Use --folder to point at the CSV exports.",
                    path.display()
                )
            }
        }
    }
}
