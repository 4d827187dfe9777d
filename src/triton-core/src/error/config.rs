use crate::error::foundation::FoundationError;
use crate::error::structured_file::StructuredFileError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a [`Config`](crate::config::Config) from a config directory.
#[derive(Error, Debug)]
pub enum LoadConfigError {
    #[error("Failed to determine the default config directory")]
    DetermineConfigDirectoryFailed(#[source] FoundationError),

    #[error("Config path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to load config file")]
    LoadConfigFileFailed(#[source] StructuredFileError),

    #[error("Config file {0} must contain a JSON object")]
    ConfigNotAnObject(PathBuf),
}
