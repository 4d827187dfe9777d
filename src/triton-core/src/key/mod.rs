//! Signing keys and where to find them.
//!
//! Keys live in the config's key directory, one subdirectory per key:
//!
//! ```text
//! <key_dir>/<name>/key.json
//! <key_dir>/<name>/key.pem             (plain text)
//! <key_dir>/<name>/key.pem.encrypted   (passphrase-protected)
//! ```
//!
//! A signing agent, when present, is consulted before the key directory.
use crate::error::encryption::EncryptionError;
use crate::error::encryption::EncryptionError::{NonceGenerationFailed, SaltGenerationFailed};
use crate::error::key::ImportKeyError::{
    EncryptPemFailed, GenerateEncryptionConfigurationFailed, InvalidKeyName, KeyAlreadyExists,
    NoKeyDirectory, ParsePemFailed, SaveKeyConfigFailed, UnsupportedKeyType, WritePemFileFailed,
};
use crate::error::key::LoadKeyError::ReadKeyDirFailed;
use crate::error::key::{ImportKeyError, LoadKeyError};
use crate::error::unlock::KeyUnlockError;
use crate::error::unlock::KeyUnlockError::{KeyNotFound, LoadKeyFailed, PassphraseRejected};
use crate::json::{load_json_file, save_json_file};
use crate::key::key_file_locations::KeyFileLocations;
use crate::key::pem_safekeeping::PemWriteError;
use crate::key::signer::{AgentSigner, PemSigner, Signer, SigningAgent};
use ring::{rand, rand::SecureRandom};
use serde::{Deserialize, Serialize};
use slog::{debug, trace, warn, Logger};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod key_file_locations;
pub(crate) mod pem_safekeeping;
pub mod signer;

pub use key_file_locations::{KEY_JSON, KEY_PEM, KEY_PEM_ENCRYPTED};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfiguration {
    pub key_id: String,

    /// If the key's .pem file is encrypted this contains everything (except the password) to decrypt the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionConfiguration>,
}

/// The information necessary to de- and encrypt (except the password) the key's .pem file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    /// Salt used for deriving the key from the password
    pub pw_salt: String,

    /// 96 bit Nonce used to decrypt the file
    pub file_nonce: Vec<u8>,
}

impl EncryptionConfiguration {
    /// Generates a random salt and nonce. Use this for every new key.
    pub fn new() -> Result<Self, EncryptionError> {
        let mut nonce: [u8; 12] = [0; 12];
        let mut salt: [u8; 32] = [0; 32];
        let sr = rand::SystemRandom::new();
        sr.fill(&mut nonce).map_err(NonceGenerationFailed)?;
        sr.fill(&mut salt).map_err(SaltGenerationFailed)?;

        Ok(Self {
            pw_salt: hex::encode(salt),
            file_nonce: nonce.into(),
        })
    }
}

/// Where the key for a key id was found.
#[derive(Clone, Debug)]
pub enum LocatedKey {
    Agent {
        key_id: String,
    },
    File {
        name: String,
        config: KeyConfiguration,
        pem_path: PathBuf,
    },
}

impl LocatedKey {
    pub fn key_id(&self) -> &str {
        match self {
            LocatedKey::Agent { key_id } => key_id,
            LocatedKey::File { config, .. } => &config.key_id,
        }
    }

    /// True for keys stored encrypted. Agent keys and plain-text keys are usable
    /// as they are.
    pub fn needs_passphrase(&self) -> bool {
        match self {
            LocatedKey::Agent { .. } => false,
            LocatedKey::File { config, .. } => config.encryption.is_some(),
        }
    }

    /// How to refer to this key when asking the user for its passphrase.
    pub fn description(&self) -> String {
        match self {
            LocatedKey::Agent { key_id } => format!("agent key {key_id}"),
            LocatedKey::File { name, config, .. } => format!("key '{name}' ({})", config.key_id),
        }
    }
}

#[derive(Clone, Default)]
pub struct KeyRing {
    locations: Option<KeyFileLocations>,
    agent: Option<Arc<dyn SigningAgent>>,
}

impl KeyRing {
    pub fn new(key_dir: Option<PathBuf>) -> Self {
        Self {
            locations: key_dir.map(KeyFileLocations::new),
            agent: None,
        }
    }

    pub fn with_agent(self, agent: Arc<dyn SigningAgent>) -> Self {
        Self {
            agent: Some(agent),
            ..self
        }
    }

    pub fn key_dir(&self) -> Option<&Path> {
        self.locations.as_ref().map(KeyFileLocations::root)
    }

    /// Finds the key with the given id, asking the agent first.
    pub fn find(&self, key_id: &str, log: &Logger) -> Result<LocatedKey, KeyUnlockError> {
        if let Some(agent) = &self.agent {
            match agent.key_ids() {
                Ok(ids) if ids.iter().any(|id| id == key_id) => {
                    debug!(log, "Key {} is held by the signing agent", key_id);
                    return Ok(LocatedKey::Agent {
                        key_id: key_id.to_string(),
                    });
                }
                Ok(_) => trace!(log, "Signing agent does not hold key {}", key_id),
                Err(err) => warn!(log, "Failed to list signing agent keys: {}", err),
            }
        }

        let locations = match &self.locations {
            Some(locations) if locations.root().is_dir() => locations,
            _ => return Err(KeyNotFound(key_id.to_string())),
        };
        for name in self.key_names(locations).map_err(LoadKeyFailed)? {
            let config_path = locations.get_key_config_path(&name);
            let config: KeyConfiguration = match load_json_file(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    warn!(log, "Skipping key '{}': {}", name, err);
                    continue;
                }
            };
            if config.key_id == key_id {
                debug!(log, "Found key {} in {}", key_id, config_path.display());
                let pem_path = locations.get_key_pem_path(&name, &config);
                return Ok(LocatedKey::File {
                    name,
                    config,
                    pem_path,
                });
            }
        }
        Err(KeyNotFound(key_id.to_string()))
    }

    /// Sorted names of the subdirectories that hold a key configuration.
    fn key_names(&self, locations: &KeyFileLocations) -> Result<Vec<String>, LoadKeyError> {
        let mut names = crate::fs::read_dir(locations.root())
            .map_err(ReadKeyDirFailed)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| locations.get_key_config_path(name).is_file())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    /// Loads a signer for a located key. `passphrase` is only used for encrypted keys.
    pub(crate) fn load_signer(
        &self,
        located: &LocatedKey,
        passphrase: Option<&str>,
    ) -> Result<Box<dyn Signer>, KeyUnlockError> {
        match located {
            LocatedKey::Agent { key_id } => match &self.agent {
                Some(agent) => Ok(Box::new(AgentSigner::new(key_id, agent.clone()))),
                None => Err(KeyNotFound(key_id.clone())),
            },
            LocatedKey::File {
                config, pem_path, ..
            } => {
                let encryption = match (&config.encryption, passphrase) {
                    (Some(encryption), Some(passphrase)) => Some((encryption, passphrase)),
                    (Some(_), None) => {
                        return Err(KeyUnlockError::NoPromptAvailable(located.description()))
                    }
                    (None, _) => None,
                };
                let pem_content = pem_safekeeping::load_pem_from_file(pem_path, encryption)
                    .map_err(|err| match err {
                        LoadKeyError::DecryptPemFileFailed(
                            _,
                            EncryptionError::DecryptContentFailed(_),
                        ) => PassphraseRejected(located.description()),
                        err => LoadKeyFailed(err),
                    })?;
                let pem = pem::parse(&pem_content)
                    .map_err(|err| LoadKeyFailed(LoadKeyError::ParsePemFailed(pem_path.clone(), err)))?;
                let signer = PemSigner::from_pkcs8(&config.key_id, &pem.contents).ok_or_else(|| {
                    LoadKeyFailed(LoadKeyError::UnsupportedKeyType(pem_path.clone()))
                })?;
                Ok(Box::new(signer))
            }
        }
    }

    /// Stores a PKCS#8 PEM key under `name`, encrypted with `passphrase` if one is given.
    pub fn import(
        &self,
        name: &str,
        key_id: &str,
        pem_content: &[u8],
        passphrase: Option<&str>,
        log: &Logger,
    ) -> Result<PathBuf, ImportKeyError> {
        let locations = self
            .locations
            .as_ref()
            .ok_or(NoKeyDirectory())?;
        if !crate::fs::is_plain_file_name(name) {
            return Err(InvalidKeyName(name.to_string()));
        }
        if locations.get_key_dir_path(name).exists() {
            return Err(KeyAlreadyExists(name.to_string()));
        }

        let pem = pem::parse(pem_content).map_err(ParsePemFailed)?;
        if PemSigner::from_pkcs8(key_id, &pem.contents).is_none() {
            return Err(UnsupportedKeyType());
        }

        let encryption = passphrase
            .map(|_| EncryptionConfiguration::new())
            .transpose()
            .map_err(GenerateEncryptionConfigurationFailed)?;
        let config = KeyConfiguration {
            key_id: key_id.to_string(),
            encryption,
        };

        let pem_path = locations.get_key_pem_path(name, &config);
        debug!(log, "Writing key '{}' to {}", name, pem_path.display());
        let encryption = config.encryption.as_ref().zip(passphrase);
        pem_safekeeping::write_pem_to_file(&pem_path, encryption, pem_content).map_err(
            |err| match err {
                PemWriteError::Encrypt(err) => EncryptPemFailed(err),
                PemWriteError::Write(err) => WritePemFileFailed(err),
            },
        )?;
        save_json_file(&locations.get_key_config_path(name), &config)
            .map_err(SaveKeyConfigFailed)?;
        Ok(locations.get_key_dir_path(name))
    }
}
