use crate::client::{discard_logger, CloudApi};
use crate::config::{Config, ConfigStore, ENV_PROFILE_NAME};
use crate::error::builder::CreateClientError;
use crate::error::input::InputShapeError;
use crate::error::input::InputShapeError::{
    BothConfigAndConfigDir, BothProfileAndProfileName, NeitherProfileNorProfileName,
    NoConfigDirForProfileName,
};
use crate::key::signer::SigningAgent;
use crate::key::KeyRing;
use crate::profile::{Profile, ProfileStore, SENTINEL_PROFILE_NAME};
use crate::storage::{JsonFileStorage, Storage};
use slog::{debug, trace, Logger};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What to build a client from.
///
/// Exactly one of `profile` and `profile_name` must be set, and at most one of
/// `config` and `config_dir`.
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// A profile given inline. It is used without any lookup.
    pub profile: Option<Profile>,

    /// A profile to look up: `env`, or a profile stored in the config directory.
    pub profile_name: Option<String>,

    pub config: Option<Config>,

    pub config_dir: Option<PathBuf>,

    /// Where to log. Nothing is logged if absent.
    pub log: Option<Logger>,
}

impl ClientOptions {
    /// Checks which options were combined, without touching storage.
    pub fn check_input_shape(&self) -> Result<(), InputShapeError> {
        match (&self.profile, &self.profile_name) {
            (Some(_), Some(_)) => return Err(BothProfileAndProfileName()),
            (None, None) => return Err(NeitherProfileNorProfileName()),
            _ => {}
        }
        if self.config.is_some() && self.config_dir.is_some() {
            return Err(BothConfigAndConfigDir());
        }
        if let Some(name) = &self.profile_name {
            // The default config directory does not count: looking up a stored
            // profile requires saying where it is stored.
            let has_config_dir = self.config_dir.is_some()
                || self.config.as_ref().and_then(Config::config_dir).is_some();
            if name != ENV_PROFILE_NAME && !has_config_dir {
                return Err(NoConfigDirForProfileName(name.clone()));
            }
        }
        Ok(())
    }
}

pub struct ClientBuilder {
    options: ClientOptions,
    storage: Arc<dyn Storage>,
    agent: Option<Arc<dyn SigningAgent>>,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self::from(ClientOptions::default())
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        Self {
            options: ClientOptions {
                profile: Some(profile),
                ..self.options
            },
            ..self
        }
    }

    pub fn with_profile_name(self, name: &str) -> Self {
        Self {
            options: ClientOptions {
                profile_name: Some(name.to_string()),
                ..self.options
            },
            ..self
        }
    }

    pub fn with_config(self, config: Config) -> Self {
        Self {
            options: ClientOptions {
                config: Some(config),
                ..self.options
            },
            ..self
        }
    }

    pub fn with_config_dir(self, config_dir: &Path) -> Self {
        Self {
            options: ClientOptions {
                config_dir: Some(config_dir.to_path_buf()),
                ..self.options
            },
            ..self
        }
    }

    pub fn with_logger(self, log: Logger) -> Self {
        Self {
            options: ClientOptions {
                log: Some(log),
                ..self.options
            },
            ..self
        }
    }

    pub fn with_storage(self, storage: Arc<dyn Storage>) -> Self {
        Self { storage, ..self }
    }

    /// Lets the client sign with keys held by `agent` instead of key files.
    pub fn with_agent(self, agent: Arc<dyn SigningAgent>) -> Self {
        Self {
            agent: Some(agent),
            ..self
        }
    }

    pub fn build(self) -> Result<CloudApi, CreateClientError> {
        self.options.check_input_shape()?;

        let ClientOptions {
            profile,
            profile_name,
            config,
            config_dir,
            log,
        } = self.options;
        let log = log.unwrap_or_else(discard_logger);
        let storage = self.storage.as_ref();

        let config = ConfigStore::new(storage, &log).resolve(config, config_dir.as_deref())?;
        trace!(log, "Resolved config {:?}", config.settings());

        let profile_store = ProfileStore::new(storage, &log);
        let mut profile = match (profile, profile_name) {
            (Some(profile), _) => profile,
            (None, Some(name)) => profile_store.resolve_by_name(&name, config.config_dir())?,
            (None, None) => return Err(NeitherProfileNorProfileName().into()),
        };
        if profile.name.is_none() {
            profile.name = Some(SENTINEL_PROFILE_NAME.to_string());
        }
        profile_store.validate(&profile)?;

        let mut key_ring = KeyRing::new(config.key_dir());
        if let Some(agent) = self.agent {
            key_ring = key_ring.with_agent(agent);
        }
        debug!(
            log,
            "Creating client for profile '{}'",
            profile.name.as_deref().unwrap_or(SENTINEL_PROFILE_NAME)
        );
        Ok(CloudApi::with_key_ring(config, profile, key_ring, log)?)
    }
}

impl From<ClientOptions> for ClientBuilder {
    fn from(options: ClientOptions) -> Self {
        Self {
            options,
            storage: Arc::new(JsonFileStorage),
            agent: None,
        }
    }
}

/// Resolves the config and profile described by `options`, validates the profile
/// and binds a new client to them.
pub fn create_client(options: ClientOptions) -> Result<CloudApi, CreateClientError> {
    ClientBuilder::from(options).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::config::LoadConfigError;
    use crate::error::profile::{
        LoadProfileError, ProfileValidationError, RemoveProfileError, SaveProfileError,
    };
    use crate::key::tests::FakeAgent;
    use crate::unlock::KeyUnlocker;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts every call and otherwise behaves like the JSON file storage.
    #[derive(Default)]
    struct CountingStorage {
        calls: AtomicUsize,
    }

    impl CountingStorage {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn count(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Storage for CountingStorage {
        fn load_config(&self, config_dir: &Path) -> Result<Config, LoadConfigError> {
            self.count();
            JsonFileStorage.load_config(config_dir)
        }

        fn load_profile(&self, name: &str, config_dir: &Path) -> Result<Profile, LoadProfileError> {
            self.count();
            JsonFileStorage.load_profile(name, config_dir)
        }

        fn load_all_profile_names(&self, config_dir: &Path) -> Result<Vec<String>, LoadProfileError> {
            self.count();
            JsonFileStorage.load_all_profile_names(config_dir)
        }

        fn save_profile(
            &self,
            name: &str,
            profile: &Profile,
            config_dir: &Path,
        ) -> Result<(), SaveProfileError> {
            self.count();
            JsonFileStorage.save_profile(name, profile, config_dir)
        }

        fn remove_profile(&self, name: &str, config_dir: &Path) -> Result<(), RemoveProfileError> {
            self.count();
            JsonFileStorage.remove_profile(name, config_dir)
        }
    }

    fn valid_profile() -> Profile {
        Profile::new("https://us-east-1.api.example.com", "bob", "SHA256:abc")
    }

    fn counting() -> (Arc<CountingStorage>, ClientBuilder) {
        let storage = Arc::new(CountingStorage::default());
        let builder = CloudApi::builder().with_storage(storage.clone());
        (storage, builder)
    }

    #[test]
    fn profile_and_profile_name_are_exclusive() {
        let (storage, builder) = counting();
        let result = builder
            .with_profile(valid_profile())
            .with_profile_name("east1")
            .with_config_dir(Path::new("/nonexistent"))
            .build();

        assert!(matches!(
            result,
            Err(CreateClientError::InputShape(BothProfileAndProfileName()))
        ));
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn profile_or_profile_name_is_required() {
        let (storage, builder) = counting();

        assert!(matches!(
            builder.with_config(Config::defaults()).build(),
            Err(CreateClientError::InputShape(NeitherProfileNorProfileName()))
        ));
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn config_and_config_dir_are_exclusive() {
        let (storage, builder) = counting();
        let result = builder
            .with_profile(valid_profile())
            .with_config(Config::defaults())
            .with_config_dir(Path::new("/nonexistent"))
            .build();

        assert!(matches!(
            result,
            Err(CreateClientError::InputShape(BothConfigAndConfigDir()))
        ));
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn stored_profile_needs_a_config_dir() {
        let (storage, builder) = counting();

        assert!(matches!(
            builder.with_profile_name("east1").build(),
            Err(CreateClientError::InputShape(NoConfigDirForProfileName(name))) if name == "east1"
        ));
        assert!(matches!(
            create_client(ClientOptions {
                profile_name: Some("east1".to_string()),
                config: Some(Config::defaults()),
                ..Default::default()
            }),
            Err(CreateClientError::InputShape(NoConfigDirForProfileName(_)))
        ));
        assert_eq!(storage.calls(), 0);
    }

    proptest! {
        #[test]
        fn input_shape_rules(
            has_profile: bool,
            has_profile_name: bool,
            name_is_env: bool,
            has_config: bool,
            config_has_dir: bool,
            has_config_dir: bool,
        ) {
            let config = Config::defaults();
            let options = ClientOptions {
                profile: has_profile.then(valid_profile),
                profile_name: has_profile_name
                    .then(|| if name_is_env { "env" } else { "east1" }.to_string()),
                config: has_config.then(|| if config_has_dir {
                    config.clone().with_config_dir(Path::new("/etc/triton"))
                } else {
                    config.clone()
                }),
                config_dir: has_config_dir.then(|| PathBuf::from("/etc/triton")),
                log: None,
            };

            let expected = if has_profile == has_profile_name {
                if has_profile {
                    Err(BothProfileAndProfileName())
                } else {
                    Err(NeitherProfileNorProfileName())
                }
            } else if has_config && has_config_dir {
                Err(BothConfigAndConfigDir())
            } else if has_profile_name
                && !name_is_env
                && !has_config_dir
                && !(has_config && config_has_dir)
            {
                Err(NoConfigDirForProfileName("east1".to_string()))
            } else {
                Ok(())
            };

            prop_assert_eq!(options.check_input_shape(), expected);
        }
    }

    #[test]
    fn stored_profile_is_named_after_lookup() {
        let td = TempDir::new().unwrap();
        let stored = valid_profile();
        JsonFileStorage
            .save_profile("east1", &stored, td.path())
            .unwrap();

        let client = create_client(ClientOptions {
            profile_name: Some("east1".to_string()),
            config_dir: Some(td.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.profile(), &stored.with_name("east1"));
        assert_eq!(client.config().config_dir(), Some(td.path()));
        assert_eq!(client.url().as_str(), "https://us-east-1.api.example.com/");
    }

    #[test]
    fn profile_is_looked_up_through_supplied_config() {
        let td = TempDir::new().unwrap();
        JsonFileStorage
            .save_profile("east1", &valid_profile(), td.path())
            .unwrap();
        let config = Config::defaults().with_config_dir(td.path());

        let client = CloudApi::builder()
            .with_profile_name("east1")
            .with_config(config.clone())
            .build()
            .unwrap();

        assert_eq!(client.config(), &config);
        assert_eq!(client.profile().name.as_deref(), Some("east1"));
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let td = TempDir::new().unwrap();

        assert!(matches!(
            CloudApi::builder()
                .with_profile_name("east1")
                .with_config_dir(td.path())
                .build(),
            Err(CreateClientError::LoadProfile(LoadProfileError::ProfileNotFound { name, .. }))
                if name == "east1"
        ));
    }

    #[test]
    fn malformed_config_stops_the_build() {
        let td = TempDir::new().unwrap();
        std::fs::write(td.path().join(crate::config::CONFIG_JSON), "{").unwrap();

        assert!(matches!(
            CloudApi::builder()
                .with_profile(valid_profile())
                .with_config_dir(td.path())
                .build(),
            Err(CreateClientError::LoadConfig(_))
        ));
    }

    #[test]
    fn inline_profile_gets_the_sentinel_name() {
        let client = CloudApi::builder()
            .with_profile(valid_profile())
            .with_config(Config::defaults())
            .build()
            .unwrap();

        assert_eq!(client.profile().name.as_deref(), Some("_"));
    }

    #[test]
    fn inline_profile_keeps_its_name() {
        let client = CloudApi::builder()
            .with_profile(valid_profile().with_name("mine"))
            .with_config(Config::defaults())
            .build()
            .unwrap();

        assert_eq!(client.profile().name.as_deref(), Some("mine"));
    }

    #[test]
    fn missing_account_fails_validation() {
        let profile = Profile {
            account: String::new(),
            ..valid_profile()
        };

        let result = CloudApi::builder()
            .with_profile(profile)
            .with_config(Config::defaults())
            .build();

        match result {
            Err(CreateClientError::ValidateProfile(err)) => assert_eq!(
                err,
                ProfileValidationError {
                    profile: "_".to_string(),
                    missing: vec!["account"],
                }
            ),
            _ => panic!("expected a validation error"),
        }
    }

    #[test]
    fn bad_url_fails_the_build() {
        let profile = Profile {
            url: "://nope".to_string(),
            ..valid_profile()
        };

        assert!(matches!(
            CloudApi::builder()
                .with_profile(profile)
                .with_config(Config::defaults())
                .build(),
            Err(CreateClientError::BuildClient(_))
        ));
    }

    // The only test that touches the process environment.
    #[test]
    fn env_profile_reads_only_the_environment() {
        std::env::set_var("TRITON_URL", "https://env.api.example.com");
        std::env::set_var("TRITON_ACCOUNT", "envuser");
        std::env::set_var("TRITON_KEY_ID", "SHA256:env");
        let (storage, builder) = counting();

        let client = builder
            .with_profile_name("env")
            .with_config(Config::defaults())
            .build()
            .unwrap();

        assert_eq!(storage.calls(), 0);
        assert_eq!(client.profile().name.as_deref(), Some("env"));
        assert_eq!(client.account(), "envuser");
        assert_eq!(client.raw().key_id(), "SHA256:env");
    }

    #[tokio::test]
    async fn agent_is_handed_to_the_client() {
        let agent = Arc::new(FakeAgent {
            key_ids: vec!["SHA256:abc".to_string()],
            ..Default::default()
        });
        let client = CloudApi::builder()
            .with_profile(valid_profile())
            .with_config(Config::defaults())
            .with_agent(agent)
            .build()
            .unwrap();

        assert!(!KeyUnlocker::new().needs_unlock(&client).unwrap());
        KeyUnlocker::new().unlock(&client).await.unwrap();
        assert!(client.is_unlocked());
    }

    #[tokio::test]
    async fn unlocking_twice_without_a_passphrase_is_a_noop() {
        let td = TempDir::new().unwrap();
        let key_ring = KeyRing::new(Some(td.path().join("keys")));
        key_ring
            .import(
                "plain",
                "SHA256:abc",
                &crate::key::tests::ed25519_pem(),
                None,
                &discard_logger(),
            )
            .unwrap();
        let client = CloudApi::builder()
            .with_profile(valid_profile())
            .with_config_dir(td.path())
            .build()
            .unwrap();

        KeyUnlocker::new().unlock(&client).await.unwrap();
        KeyUnlocker::new().unlock(&client).await.unwrap();
        assert!(client.is_unlocked());
    }

    #[tokio::test]
    async fn passphrase_key_without_prompt_stays_locked() {
        let td = TempDir::new().unwrap();
        let key_ring = KeyRing::new(Some(td.path().join("keys")));
        key_ring
            .import(
                "locked",
                "SHA256:abc",
                &crate::key::tests::ed25519_pem(),
                Some("pw"),
                &discard_logger(),
            )
            .unwrap();
        let client = CloudApi::builder()
            .with_profile(valid_profile())
            .with_config_dir(td.path())
            .build()
            .unwrap();

        assert!(KeyUnlocker::new().unlock(&client).await.is_err());
        assert!(!client.is_unlocked());
    }
}
