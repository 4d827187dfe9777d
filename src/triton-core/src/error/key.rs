use crate::error::encryption::EncryptionError;
use crate::error::fs::{FsError, ReadDirError, ReadFileError};
use crate::error::structured_file::StructuredFileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadKeyError {
    #[error("Failed to read key directory")]
    ReadKeyDirFailed(#[source] ReadDirError),

    #[error("Failed to read pem file")]
    ReadPemFileFailed(#[source] ReadFileError),

    #[error("Failed to decrypt PEM file at {0}")]
    DecryptPemFileFailed(PathBuf, #[source] EncryptionError),

    #[error("Failed to parse PEM file at {0}")]
    ParsePemFailed(PathBuf, #[source] pem::PemError),

    #[error("Key at {0} is neither an Ed25519 nor an ECDSA P-256 PKCS#8 key")]
    UnsupportedKeyType(PathBuf),
}

#[derive(Error, Debug)]
pub enum ImportKeyError {
    #[error("No key directory is configured.")]
    NoKeyDirectory(),

    #[error("'{0}' is not a valid key name.")]
    InvalidKeyName(String),

    #[error("A key named '{0}' already exists.")]
    KeyAlreadyExists(String),

    #[error("Failed to parse PEM content")]
    ParsePemFailed(#[source] pem::PemError),

    #[error("PEM content is neither an Ed25519 nor an ECDSA P-256 PKCS#8 key")]
    UnsupportedKeyType(),

    #[error("Failed to generate encryption configuration")]
    GenerateEncryptionConfigurationFailed(#[source] EncryptionError),

    #[error("Failed to encrypt PEM content")]
    EncryptPemFailed(#[source] EncryptionError),

    #[error("Failed to write PEM file")]
    WritePemFileFailed(#[source] FsError),

    #[error("Failed to save key configuration")]
    SaveKeyConfigFailed(#[source] StructuredFileError),
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Signing key {0} is locked; unlock it with its passphrase first.")]
    KeyLocked(String),

    #[error("Failed to load signing key")]
    LoadSignerFailed(#[source] crate::error::unlock::KeyUnlockError),

    #[error("Failed to sign: {0}")]
    SignFailed(String),
}
