use super::EncryptionConfiguration;
use crate::error::encryption::EncryptionError;
use crate::error::encryption::EncryptionError::{
    DecryptContentFailed, EmptyPasswordHash, EncryptContentFailed, HashPasswordFailed,
    InvalidKeyDerivationParams, InvalidNonceLength,
};
use crate::error::fs::FsError;
use crate::error::key::LoadKeyError;
use crate::error::key::LoadKeyError::{DecryptPemFileFailed, ReadPemFileFailed};
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::{Aes256Gcm, Key};
use argon2::{password_hash::PasswordHasher, Argon2};
use std::path::Path;

const NONCE_LENGTH: usize = 12;

/// Loads a pem file, decrypting it with the passphrase if it is encrypted.
pub(crate) fn load_pem_from_file(
    path: &Path,
    encryption: Option<(&EncryptionConfiguration, &str)>,
) -> Result<Vec<u8>, LoadKeyError> {
    let content = crate::fs::read(path).map_err(ReadPemFileFailed)?;

    match encryption {
        Some((config, passphrase)) => decrypt(&content, config, passphrase)
            .map_err(|err| DecryptPemFileFailed(path.to_path_buf(), err)),
        None => Ok(content),
    }
}

/// Writes the pem file, encrypting it first if an encryption configuration and
/// passphrase are given. Creates required directories.
pub(crate) fn write_pem_to_file(
    path: &Path,
    encryption: Option<(&EncryptionConfiguration, &str)>,
    pem_content: &[u8],
) -> Result<(), PemWriteError> {
    let pem_content = match encryption {
        Some((config, passphrase)) => {
            encrypt(pem_content, config, passphrase).map_err(PemWriteError::Encrypt)?
        }
        None => Vec::from(pem_content),
    };

    write_pem_content(path, &pem_content).map_err(PemWriteError::Write)
}

pub(crate) enum PemWriteError {
    Encrypt(EncryptionError),
    Write(FsError),
}

fn write_pem_content(path: &Path, pem_content: &[u8]) -> Result<(), FsError> {
    let containing_folder = crate::fs::parent(path)?;
    crate::fs::create_dir_all(&containing_folder)?;
    crate::fs::write(path, pem_content)?;

    let mut permissions = crate::fs::read_permissions(path)?;

    permissions.set_readonly(true);
    // On *nix, set the read permission to owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(0o400);
    }

    Ok(crate::fs::set_permissions(path, permissions)?)
}

fn get_argon_params() -> Result<argon2::Params, EncryptionError> {
    argon2::Params::new(64000 /* in kb */, 3, 1, Some(32 /* in bytes */))
        .map_err(InvalidKeyDerivationParams)
}

fn derive_key(
    config: &EncryptionConfiguration,
    password: &str,
) -> Result<Key<Aes256Gcm>, EncryptionError> {
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        get_argon_params()?,
    );
    let hash = argon2
        .hash_password(password.as_bytes(), &config.pw_salt)
        .map_err(HashPasswordFailed)?;
    let output = hash.hash.ok_or(EmptyPasswordHash())?;
    Ok(Key::<Aes256Gcm>::clone_from_slice(output.as_ref()))
}

fn nonce(config: &EncryptionConfiguration) -> Result<&Nonce<Aes256Gcm>, EncryptionError> {
    if config.file_nonce.len() != NONCE_LENGTH {
        return Err(InvalidNonceLength(config.file_nonce.len()));
    }
    Ok(Nonce::<Aes256Gcm>::from_slice(config.file_nonce.as_slice()))
}

pub(crate) fn encrypt(
    content: &[u8],
    config: &EncryptionConfiguration,
    password: &str,
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new(&derive_key(config, password)?);

    cipher
        .encrypt(nonce(config)?, content)
        .map_err(EncryptContentFailed)
}

pub(crate) fn decrypt(
    encrypted_content: &[u8],
    config: &EncryptionConfiguration,
    password: &str,
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new(&derive_key(config, password)?);

    cipher
        .decrypt(nonce(config)?, encrypted_content)
        .map_err(DecryptContentFailed)
}
