//! Durable storage of configuration and profiles.
//!
//! The client factory only talks to storage through [`Storage`], so the on-disk
//! layout below is one implementation among possible others:
//!
//! ```text
//! <config_dir>/config.json
//! <config_dir>/profiles.d/<name>.json
//! ```
use crate::config::Config;
use crate::error::config::LoadConfigError;
use crate::error::profile::LoadProfileError::{
    ListProfilesFailed, LoadProfileFileFailed, ProfileNotFound,
};
use crate::error::profile::RemoveProfileError::RemoveProfileFileFailed;
use crate::error::profile::SaveProfileError::{EnsureProfilesDirFailed, SaveProfileFileFailed};
use crate::error::profile::{LoadProfileError, RemoveProfileError, SaveProfileError};
use crate::json::{load_json_file, save_json_file};
use crate::profile::Profile;
use std::path::{Path, PathBuf};

pub const PROFILES_DIR: &str = "profiles.d";
const PROFILE_EXTENSION: &str = "json";

pub trait Storage: Send + Sync {
    fn load_config(&self, config_dir: &Path) -> Result<Config, LoadConfigError>;

    fn load_profile(&self, name: &str, config_dir: &Path) -> Result<Profile, LoadProfileError>;

    /// Sorted names of all stored profiles.
    fn load_all_profile_names(&self, config_dir: &Path) -> Result<Vec<String>, LoadProfileError>;

    fn save_profile(
        &self,
        name: &str,
        profile: &Profile,
        config_dir: &Path,
    ) -> Result<(), SaveProfileError>;

    fn remove_profile(&self, name: &str, config_dir: &Path) -> Result<(), RemoveProfileError>;
}

/// Profile names double as file names.
pub fn is_valid_profile_name(name: &str) -> bool {
    crate::fs::is_plain_file_name(name)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFileStorage;

impl JsonFileStorage {
    pub fn profiles_dir(config_dir: &Path) -> PathBuf {
        config_dir.join(PROFILES_DIR)
    }

    pub fn profile_path(name: &str, config_dir: &Path) -> PathBuf {
        Self::profiles_dir(config_dir).join(format!("{name}.{PROFILE_EXTENSION}"))
    }
}

impl Storage for JsonFileStorage {
    fn load_config(&self, config_dir: &Path) -> Result<Config, LoadConfigError> {
        Config::load(config_dir)
    }

    fn load_profile(&self, name: &str, config_dir: &Path) -> Result<Profile, LoadProfileError> {
        let path = Self::profile_path(name, config_dir);
        if !is_valid_profile_name(name) || !path.is_file() {
            return Err(ProfileNotFound {
                name: name.to_string(),
                dir: Self::profiles_dir(config_dir),
            });
        }
        load_json_file(&path).map_err(|err| LoadProfileFileFailed(Box::new(name.to_string()), err))
    }

    fn load_all_profile_names(&self, config_dir: &Path) -> Result<Vec<String>, LoadProfileError> {
        let profiles_dir = Self::profiles_dir(config_dir);
        if !profiles_dir.exists() {
            return Ok(vec![]);
        }

        let mut names = crate::fs::read_dir(&profiles_dir)
            .map_err(ListProfilesFailed)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(PROFILE_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .filter(|name| is_valid_profile_name(name))
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn save_profile(
        &self,
        name: &str,
        profile: &Profile,
        config_dir: &Path,
    ) -> Result<(), SaveProfileError> {
        let profiles_dir = Self::profiles_dir(config_dir);
        crate::fs::create_dir_all(&profiles_dir)
            .map_err(|err| EnsureProfilesDirFailed(err.into()))?;
        save_json_file(&Self::profile_path(name, config_dir), profile)
            .map_err(|err| SaveProfileFileFailed(Box::new(name.to_string()), err))
    }

    fn remove_profile(&self, name: &str, config_dir: &Path) -> Result<(), RemoveProfileError> {
        let path = Self::profile_path(name, config_dir);
        if !is_valid_profile_name(name) || !path.is_file() {
            return Err(RemoveProfileError::ProfileNotFound {
                name: name.to_string(),
                dir: Self::profiles_dir(config_dir),
            });
        }
        crate::fs::remove_file(&path).map_err(RemoveProfileFileFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn profile_names() {
        assert!(is_valid_profile_name("east1"));
        assert!(is_valid_profile_name("us-sw-1.staging"));
        assert!(!is_valid_profile_name(""));
        assert!(!is_valid_profile_name(".."));
        assert!(!is_valid_profile_name("../east1"));
        assert!(!is_valid_profile_name("a\\b"));
    }

    #[test]
    fn lists_only_json_profiles() {
        let td = TempDir::new().unwrap();
        let profiles_dir = JsonFileStorage::profiles_dir(td.path());
        std::fs::create_dir_all(profiles_dir.join("subdir.json")).unwrap();
        std::fs::write(profiles_dir.join("west.json"), "{}").unwrap();
        std::fs::write(profiles_dir.join("east.json"), "{}").unwrap();
        std::fs::write(profiles_dir.join("notes.txt"), "").unwrap();

        let names = JsonFileStorage.load_all_profile_names(td.path()).unwrap();

        assert_eq!(names, vec!["east".to_string(), "west".to_string()]);
    }

    #[test]
    fn no_profiles_dir_means_no_profiles() {
        let td = TempDir::new().unwrap();
        assert!(JsonFileStorage
            .load_all_profile_names(td.path())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_or_invalid_name_is_not_found() {
        let td = TempDir::new().unwrap();
        std::fs::write(td.path().join("escape.json"), "{}").unwrap();

        for name in ["missing", "../escape"] {
            assert!(matches!(
                JsonFileStorage.load_profile(name, td.path()),
                Err(ProfileNotFound { name: n, .. }) if n == name
            ));
        }
    }

    #[test]
    fn malformed_profile_is_a_load_error() {
        let td = TempDir::new().unwrap();
        let profiles_dir = JsonFileStorage::profiles_dir(td.path());
        std::fs::create_dir_all(&profiles_dir).unwrap();
        std::fs::write(profiles_dir.join("broken.json"), r#"{"url": 5}"#).unwrap();

        assert!(matches!(
            JsonFileStorage.load_profile("broken", td.path()),
            Err(LoadProfileFileFailed(name, _)) if *name == "broken"
        ));
    }

    #[test]
    fn save_then_remove() {
        let td = TempDir::new().unwrap();
        let profile = Profile::new("https://us-east-1.api.example.com", "bob", "SHA256:abc");

        JsonFileStorage
            .save_profile("east1", &profile, td.path())
            .unwrap();
        assert_eq!(
            JsonFileStorage.load_profile("east1", td.path()).unwrap(),
            profile
        );

        JsonFileStorage.remove_profile("east1", td.path()).unwrap();
        assert!(matches!(
            JsonFileStorage.remove_profile("east1", td.path()),
            Err(RemoveProfileError::ProfileNotFound { .. })
        ));
    }
}
