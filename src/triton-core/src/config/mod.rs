//! Configuration settings and the directory they were loaded from.
use crate::config::directories::get_default_config_dir;
use crate::error::config::LoadConfigError;
use crate::error::config::LoadConfigError::{
    ConfigNotAnObject, DetermineConfigDirectoryFailed, LoadConfigFileFailed, NotADirectory,
};
use crate::foundation::get_user_home;
use crate::json::load_json_file;
use crate::storage::Storage;
use serde_json::{Map, Value};
use slog::{debug, Logger};
use std::path::{Path, PathBuf};

pub mod directories;

pub const CONFIG_JSON: &str = "config.json";
pub const KEYS_DIR: &str = "keys";

const PROFILE_SETTING: &str = "profile";
const CACHE_DIR_SETTING: &str = "cacheDir";
const KEY_DIR_SETTING: &str = "keyDir";

/// Name of the profile built from environment variables.
pub const ENV_PROFILE_NAME: &str = "env";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    settings: Map<String, Value>,

    /// Where these settings were loaded from.
    /// None for configs built in memory.
    config_dir: Option<PathBuf>,
}

impl Config {
    /// An in-memory config. It has no directory, so profiles cannot be looked up by
    /// name through it.
    pub fn new(settings: Map<String, Value>) -> Self {
        Self {
            settings,
            config_dir: None,
        }
    }

    pub fn defaults() -> Self {
        Self::new(default_settings())
    }

    pub fn with_config_dir(self, config_dir: &Path) -> Self {
        Self {
            config_dir: Some(config_dir.to_path_buf()),
            ..self
        }
    }

    /// Loads `config.json` from `config_dir` over the defaults.
    /// A missing directory or file is not an error: the defaults are used.
    pub fn load(config_dir: &Path) -> Result<Self, LoadConfigError> {
        if config_dir.exists() && !config_dir.is_dir() {
            return Err(NotADirectory(config_dir.to_path_buf()));
        }

        let mut settings = default_settings();
        let path = config_dir.join(CONFIG_JSON);
        if path.exists() {
            match load_json_file(&path).map_err(LoadConfigFileFailed)? {
                Value::Object(user_settings) => settings.extend(user_settings),
                _ => return Err(ConfigNotAnObject(path)),
            }
        }

        Ok(Self {
            settings,
            config_dir: Some(config_dir.to_path_buf()),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// The profile to use when none is named explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.get(PROFILE_SETTING)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(ENV_PROFILE_NAME)
    }

    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.resolve_dir_setting(CACHE_DIR_SETTING, None)
    }

    /// Directory holding signing keys, one subdirectory per key.
    pub fn key_dir(&self) -> Option<PathBuf> {
        self.resolve_dir_setting(KEY_DIR_SETTING, Some(KEYS_DIR))
    }

    /// Absolute settings are taken as is, `~/` is expanded, anything else is
    /// relative to the config directory.
    fn resolve_dir_setting(&self, key: &str, fallback: Option<&str>) -> Option<PathBuf> {
        match self.get(key).and_then(Value::as_str) {
            Some(dir) if Path::new(dir).is_absolute() => Some(PathBuf::from(dir)),
            Some(dir) if dir.starts_with("~/") => get_user_home()
                .ok()
                .map(|home| PathBuf::from(home).join(&dir[2..])),
            Some(dir) => self.config_dir().map(|base| base.join(dir)),
            None => fallback.and_then(|f| self.config_dir().map(|base| base.join(f))),
        }
    }
}

fn default_settings() -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert(PROFILE_SETTING.to_string(), Value::from(ENV_PROFILE_NAME));
    settings.insert(CACHE_DIR_SETTING.to_string(), Value::from("cache"));
    settings
}

/// Decides which [`Config`] a client is built with.
pub struct ConfigStore<'a> {
    storage: &'a dyn Storage,
    log: &'a Logger,
}

impl<'a> ConfigStore<'a> {
    pub fn new(storage: &'a dyn Storage, log: &'a Logger) -> Self {
        Self { storage, log }
    }

    /// A config supplied by the caller is used as is. Otherwise the config is loaded
    /// from `config_dir`, or from the default directory if none was given.
    pub fn resolve(
        &self,
        config: Option<Config>,
        config_dir: Option<&Path>,
    ) -> Result<Config, LoadConfigError> {
        if let Some(config) = config {
            debug!(self.log, "Using caller-supplied config");
            return Ok(config);
        }

        let config_dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => get_default_config_dir().map_err(DetermineConfigDirectoryFailed)?,
        };
        debug!(self.log, "Loading config from {}", config_dir.display());
        self.storage.load_config(&config_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonFileStorage;
    use tempfile::TempDir;

    fn discard() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn missing_config_dir_yields_defaults() {
        let td = TempDir::new().unwrap();
        let dir = td.path().join("nonexistent");

        let config = Config::load(&dir).unwrap();

        assert_eq!(config.config_dir(), Some(dir.as_path()));
        assert_eq!(config.default_profile_name(), "env");
        assert_eq!(config.cache_dir(), Some(dir.join("cache")));
        assert_eq!(config.key_dir(), Some(dir.join("keys")));
    }

    #[test]
    fn config_json_overrides_defaults() {
        let td = TempDir::new().unwrap();
        std::fs::write(
            td.path().join(CONFIG_JSON),
            r#"{"profile": "east1", "keyDir": "/opt/keys", "color": false}"#,
        )
        .unwrap();

        let config = Config::load(td.path()).unwrap();

        assert_eq!(config.default_profile_name(), "east1");
        assert_eq!(config.key_dir(), Some(PathBuf::from("/opt/keys")));
        assert_eq!(config.get("color"), Some(&Value::Bool(false)));
        assert_eq!(config.cache_dir(), Some(td.path().join("cache")));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let td = TempDir::new().unwrap();
        std::fs::write(td.path().join(CONFIG_JSON), "{ not json").unwrap();

        assert!(matches!(
            Config::load(td.path()),
            Err(LoadConfigFileFailed(_))
        ));
    }

    #[test]
    fn config_must_be_an_object() {
        let td = TempDir::new().unwrap();
        std::fs::write(td.path().join(CONFIG_JSON), "[1, 2]").unwrap();

        assert!(matches!(
            Config::load(td.path()),
            Err(ConfigNotAnObject(path)) if path == td.path().join(CONFIG_JSON)
        ));
    }

    #[test]
    fn file_is_not_a_config_dir() {
        let td = TempDir::new().unwrap();
        let file = td.path().join("file");
        std::fs::write(&file, "").unwrap();

        assert!(matches!(Config::load(&file), Err(NotADirectory(_))));
    }

    #[test]
    fn in_memory_config_has_no_directories() {
        let config = Config::defaults();

        assert_eq!(config.config_dir(), None);
        assert_eq!(config.key_dir(), None);

        let config = config.with_config_dir(Path::new("/etc/triton"));
        assert_eq!(config.key_dir(), Some(PathBuf::from("/etc/triton/keys")));
    }

    #[test]
    fn resolve_prefers_supplied_config() {
        let td = TempDir::new().unwrap();
        std::fs::write(td.path().join(CONFIG_JSON), "garbage").unwrap();
        let log = discard();
        let storage = JsonFileStorage;
        let store = ConfigStore::new(&storage, &log);

        let supplied = Config::defaults();
        let resolved = store.resolve(Some(supplied.clone()), None).unwrap();
        assert_eq!(resolved, supplied);

        assert!(store.resolve(None, Some(td.path())).is_err());
    }
}
