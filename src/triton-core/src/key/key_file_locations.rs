use crate::key::KeyConfiguration;
use std::path::{Path, PathBuf};

pub const KEY_JSON: &str = "key.json";
pub const KEY_PEM: &str = "key.pem";
pub const KEY_PEM_ENCRYPTED: &str = "key.pem.encrypted";

#[derive(Clone, Debug)]
pub(crate) struct KeyFileLocations {
    root_dir: PathBuf,
}

impl KeyFileLocations {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    pub fn get_key_dir_path(&self, key_name: &str) -> PathBuf {
        self.root_dir.join(key_name)
    }

    pub fn get_key_config_path(&self, key_name: &str) -> PathBuf {
        self.get_key_dir_path(key_name).join(KEY_JSON)
    }

    /// Determines the path of the (potentially encrypted) PEM file.
    pub fn get_key_pem_path(&self, key_name: &str, key_config: &KeyConfiguration) -> PathBuf {
        if key_config.encryption.is_some() {
            self.get_key_dir_path(key_name).join(KEY_PEM_ENCRYPTED)
        } else {
            self.get_key_dir_path(key_name).join(KEY_PEM)
        }
    }
}
