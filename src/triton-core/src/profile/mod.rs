//! Profiles bind one account on one CloudAPI endpoint to a signing key.
use crate::config::ENV_PROFILE_NAME;
use crate::error::profile::LoadProfileError::NoConfigDirectory;
use crate::error::profile::{
    LoadProfileError, ProfileValidationError, RemoveProfileError, SaveProfileError,
};
use crate::storage::{is_valid_profile_name, Storage};
use serde::{Deserialize, Serialize};
use slog::{debug, trace, Logger};
use std::path::Path;

/// Name given to a profile supplied inline without one.
///
/// Several nameless inline profiles in one process all share this name.
pub const SENTINEL_PROFILE_NAME: &str = "_";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// CloudAPI endpoint, e.g. `https://us-east-1.api.example.com`.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub account: String,

    /// Fingerprint of the signing key.
    #[serde(default)]
    pub key_id: String,

    /// RBAC sub-user of `account` to authenticate as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_as_account: Option<String>,
}

impl Profile {
    pub fn new(url: &str, account: &str, key_id: &str) -> Self {
        Self {
            url: url.to_string(),
            account: account.to_string(),
            key_id: key_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_name(self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..self
        }
    }

    /// The `env` pseudo-profile, read from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_vars(|key| std::env::var(key).ok())
    }

    /// Builds the `env` pseudo-profile from `TRITON_*` variables, falling back to
    /// the legacy `SDC_*` names. Empty values count as unset.
    pub fn from_env_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            [format!("TRITON_{suffix}"), format!("SDC_{suffix}")]
                .iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.is_empty())
        };

        Self {
            name: Some(ENV_PROFILE_NAME.to_string()),
            url: var("URL").unwrap_or_default(),
            account: var("ACCOUNT").unwrap_or_default(),
            key_id: var("KEY_ID").unwrap_or_default(),
            user: var("USER"),
            roles: vec![],
            insecure: var("TLS_INSECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            act_as_account: None,
        }
    }

    /// Checks that every field needed to authenticate is present, reporting all
    /// of the missing ones at once.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        let missing = [
            ("url", &self.url),
            ("account", &self.account),
            ("keyId", &self.key_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProfileValidationError {
                profile: self
                    .name
                    .clone()
                    .unwrap_or_else(|| SENTINEL_PROFILE_NAME.to_string()),
                missing,
            })
        }
    }
}

/// Looks up, validates and manages profiles.
pub struct ProfileStore<'a> {
    storage: &'a dyn Storage,
    log: &'a Logger,
}

impl<'a> ProfileStore<'a> {
    pub fn new(storage: &'a dyn Storage, log: &'a Logger) -> Self {
        Self { storage, log }
    }

    /// `env` is read from the environment and needs no config directory. Any other
    /// name is loaded from `config_dir` and takes the name it was looked up by.
    pub fn resolve_by_name(
        &self,
        name: &str,
        config_dir: Option<&Path>,
    ) -> Result<Profile, LoadProfileError> {
        if name == ENV_PROFILE_NAME {
            debug!(self.log, "Reading profile 'env' from environment variables");
            return Ok(Profile::from_env());
        }

        let config_dir = config_dir.ok_or_else(|| NoConfigDirectory(name.to_string()))?;
        debug!(
            self.log,
            "Loading profile '{}' from {}",
            name,
            config_dir.display()
        );
        let profile = self.storage.load_profile(name, config_dir)?;
        Ok(Profile {
            name: Some(name.to_string()),
            ..profile
        })
    }

    pub fn validate(&self, profile: &Profile) -> Result<(), ProfileValidationError> {
        trace!(self.log, "Validating profile {:?}", profile);
        profile.validate()
    }

    /// All profile names, `env` first.
    pub fn list_names(&self, config_dir: &Path) -> Result<Vec<String>, LoadProfileError> {
        let mut names = vec![ENV_PROFILE_NAME.to_string()];
        names.extend(
            self.storage
                .load_all_profile_names(config_dir)?
                .into_iter()
                .filter(|name| name != ENV_PROFILE_NAME),
        );
        Ok(names)
    }

    pub fn save(&self, profile: &Profile, config_dir: &Path) -> Result<(), SaveProfileError> {
        let name = profile
            .name
            .as_deref()
            .ok_or(SaveProfileError::MissingProfileName())?;
        if name == ENV_PROFILE_NAME || name == SENTINEL_PROFILE_NAME {
            return Err(SaveProfileError::ReservedProfileName(name.to_string()));
        }
        if !is_valid_profile_name(name) {
            return Err(SaveProfileError::InvalidProfileName(name.to_string()));
        }
        profile.validate()?;

        debug!(self.log, "Saving profile '{}' to {}", name, config_dir.display());
        self.storage.save_profile(name, profile, config_dir)
    }

    pub fn remove(&self, name: &str, config_dir: &Path) -> Result<(), RemoveProfileError> {
        if name == ENV_PROFILE_NAME {
            return Err(RemoveProfileError::ReservedProfileName(name.to_string()));
        }
        debug!(self.log, "Removing profile '{}' from {}", name, config_dir.display());
        self.storage.remove_profile(name, config_dir)
    }
}
