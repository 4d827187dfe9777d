use crate::error::config::LoadConfigError;
use crate::error::input::InputShapeError;
use crate::error::profile::{LoadProfileError, ProfileValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreateClientError {
    #[error(transparent)]
    InputShape(#[from] InputShapeError),

    #[error(transparent)]
    LoadConfig(#[from] LoadConfigError),

    #[error(transparent)]
    LoadProfile(#[from] LoadProfileError),

    #[error(transparent)]
    ValidateProfile(#[from] ProfileValidationError),

    #[error(transparent)]
    BuildClient(#[from] BuildClientError),
}

#[derive(Error, Debug)]
pub enum BuildClientError {
    #[error("Failed to parse CloudAPI url '{0}'")]
    ParseUrlFailed(String, #[source] url::ParseError),
}
