use crate::error::fs::{FsError, ReadDirError, RemoveFileError};
use crate::error::structured_file::StructuredFileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadProfileError {
    #[error("Profile '{name}' not found in {}", .dir.display())]
    ProfileNotFound { name: String, dir: PathBuf },

    #[error("Failed to load profile '{0}'")]
    LoadProfileFileFailed(Box<String>, #[source] StructuredFileError),

    #[error("No config directory to look up profile '{0}' in")]
    NoConfigDirectory(String),

    #[error("Failed to list profiles")]
    ListProfilesFailed(#[source] ReadDirError),
}

/// A profile lacks one or more of the fields needed to authenticate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Profile '{profile}' is missing required field(s): {}", .missing.join(", "))]
pub struct ProfileValidationError {
    pub profile: String,
    pub missing: Vec<&'static str>,
}

#[derive(Error, Debug)]
pub enum SaveProfileError {
    #[error("Profile name '{0}' is reserved.")]
    ReservedProfileName(String),

    #[error("'{0}' is not a valid profile name.")]
    InvalidProfileName(String),

    #[error("Cannot save a profile without a name.")]
    MissingProfileName(),

    #[error(transparent)]
    ValidateProfileFailed(#[from] ProfileValidationError),

    #[error("Failed to create profiles directory")]
    EnsureProfilesDirFailed(#[source] FsError),

    #[error("Failed to save profile '{0}'")]
    SaveProfileFileFailed(Box<String>, #[source] StructuredFileError),
}

#[derive(Error, Debug)]
pub enum RemoveProfileError {
    #[error("Profile name '{0}' is reserved.")]
    ReservedProfileName(String),

    #[error("Profile '{name}' not found in {}", .dir.display())]
    ProfileNotFound { name: String, dir: PathBuf },

    #[error("Failed to remove profile")]
    RemoveProfileFileFailed(#[source] RemoveFileError),
}
