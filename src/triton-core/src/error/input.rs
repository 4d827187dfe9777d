use thiserror::Error;

/// Violations of the rules governing which client options may be combined.
/// Detected before any I/O takes place.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputShapeError {
    #[error("cannot specify both a profile and a profile name")]
    BothProfileAndProfileName(),

    #[error("must specify one of a profile or a profile name")]
    NeitherProfileNorProfileName(),

    #[error("cannot specify both a config and a config directory")]
    BothConfigAndConfigDir(),

    #[error("must provide a config directory to look up profile '{0}' (only 'env' needs none)")]
    NoConfigDirForProfileName(String),
}
