//! CloudAPI clients.
//!
//! [`RawCloudApi`] knows an endpoint, an account and a signing key. [`CloudApi`]
//! additionally remembers the config and profile it was built from.
use crate::config::{Config, ConfigStore};
use crate::error::builder::BuildClientError;
use crate::error::config::LoadConfigError;
use crate::error::key::SignError;
use crate::error::profile::LoadProfileError;
use crate::error::unlock::KeyUnlockError;
use crate::key::signer::Signer;
use crate::key::KeyRing;
use crate::profile::{Profile, ProfileStore, SENTINEL_PROFILE_NAME};
use crate::storage::JsonFileStorage;
use crate::unlock::KeyUnlocker;
use slog::{debug, Logger};
use std::path::Path;
use tokio::sync::OnceCell;
use url::Url;

pub mod builder;

pub use builder::{create_client, ClientBuilder, ClientOptions};

pub(crate) fn discard_logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

#[derive(Clone, Default)]
pub struct RawClientOptions {
    pub url: String,
    pub account: String,
    pub user: Option<String>,
    pub roles: Vec<String>,
    pub act_as_account: Option<String>,
    pub key_id: String,
    pub insecure: bool,
    pub key_ring: KeyRing,
    pub log: Option<Logger>,
}

/// Builds a raw client without consulting any config or profile.
pub fn build_raw(options: RawClientOptions) -> Result<RawCloudApi, BuildClientError> {
    RawCloudApi::new(options)
}

pub struct RawClientBuilder {
    options: RawClientOptions,
}

impl RawClientBuilder {
    pub fn with_user(self, user: &str) -> Self {
        Self {
            options: RawClientOptions {
                user: Some(user.to_string()),
                ..self.options
            },
        }
    }

    pub fn with_roles(self, roles: Vec<String>) -> Self {
        Self {
            options: RawClientOptions {
                roles,
                ..self.options
            },
        }
    }

    pub fn acting_as(self, account: &str) -> Self {
        Self {
            options: RawClientOptions {
                act_as_account: Some(account.to_string()),
                ..self.options
            },
        }
    }

    pub fn insecure(self, insecure: bool) -> Self {
        Self {
            options: RawClientOptions {
                insecure,
                ..self.options
            },
        }
    }

    pub fn with_key_ring(self, key_ring: KeyRing) -> Self {
        Self {
            options: RawClientOptions {
                key_ring,
                ..self.options
            },
        }
    }

    pub fn with_logger(self, log: Logger) -> Self {
        Self {
            options: RawClientOptions {
                log: Some(log),
                ..self.options
            },
        }
    }

    pub fn build(self) -> Result<RawCloudApi, BuildClientError> {
        build_raw(self.options)
    }
}

pub struct RawCloudApi {
    url: Url,
    account: String,
    user: Option<String>,
    roles: Vec<String>,
    act_as_account: Option<String>,
    key_id: String,
    insecure: bool,
    key_ring: KeyRing,

    /// Set once the signing key has been loaded, and never reset.
    signer: OnceCell<Box<dyn Signer>>,

    log: Logger,
}

impl RawCloudApi {
    pub fn builder(url: &str, account: &str, key_id: &str) -> RawClientBuilder {
        RawClientBuilder {
            options: RawClientOptions {
                url: url.to_string(),
                account: account.to_string(),
                key_id: key_id.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn new(options: RawClientOptions) -> Result<Self, BuildClientError> {
        let url = Url::parse(&options.url)
            .map_err(|err| BuildClientError::ParseUrlFailed(options.url.clone(), err))?;
        let log = options.log.unwrap_or_else(discard_logger);
        debug!(log, "Building CloudAPI client for {} at {}", options.account, url);

        Ok(Self {
            url,
            account: options.account,
            user: options.user,
            roles: options.roles,
            act_as_account: options.act_as_account,
            key_id: options.key_id,
            insecure: options.insecure,
            key_ring: options.key_ring,
            signer: OnceCell::new(),
            log,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The account that authenticates.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The account whose resources requests operate on.
    pub fn request_account(&self) -> &str {
        self.act_as_account.as_deref().unwrap_or(&self.account)
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The key id as it appears in request signatures.
    pub fn key_path(&self) -> String {
        match &self.user {
            Some(user) => format!("/{}/users/{}/keys/{}", self.account, user, self.key_id),
            None => format!("/{}/keys/{}", self.account, self.key_id),
        }
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.key_ring
    }

    pub fn logger(&self) -> &Logger {
        &self.log
    }

    pub fn is_unlocked(&self) -> bool {
        self.signer.initialized()
    }

    /// Concurrent callers wait for the first one to finish loading the key.
    pub(crate) async fn signer(&self, unlocker: &KeyUnlocker) -> Result<&dyn Signer, KeyUnlockError> {
        self.signer
            .get_or_try_init(|| unlocker.load_signer(&self.key_ring, &self.key_id, &self.log))
            .await
            .map(|signer| &**signer)
    }

    /// Signs with the client's key. A key that needs a passphrase must have been
    /// unlocked first.
    pub async fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError> {
        let signer = self
            .signer(&KeyUnlocker::new())
            .await
            .map_err(|err| match err {
                KeyUnlockError::NoPromptAvailable(_) => SignError::KeyLocked(self.key_id.clone()),
                err => SignError::LoadSignerFailed(err),
            })?;
        signer.sign(content).map_err(SignError::SignFailed)
    }
}

impl AsRef<RawCloudApi> for RawCloudApi {
    fn as_ref(&self) -> &RawCloudApi {
        self
    }
}

pub struct CloudApi {
    config: Config,
    profile: Profile,
    raw: RawCloudApi,
    log: Logger,
}

impl CloudApi {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Binds a client to an already resolved config and profile. The profile is
    /// used as given; see [`create_client`] for resolution and validation.
    pub fn new(config: Config, profile: Profile, log: Logger) -> Result<Self, BuildClientError> {
        let key_ring = KeyRing::new(config.key_dir());
        Self::with_key_ring(config, profile, key_ring, log)
    }

    pub(crate) fn with_key_ring(
        config: Config,
        profile: Profile,
        key_ring: KeyRing,
        log: Logger,
    ) -> Result<Self, BuildClientError> {
        let profile_name = profile
            .name
            .clone()
            .unwrap_or_else(|| SENTINEL_PROFILE_NAME.to_string());
        let log = log.new(slog::o!("profile" => profile_name));
        let raw = build_raw(RawClientOptions {
            url: profile.url.clone(),
            account: profile.account.clone(),
            user: profile.user.clone(),
            roles: profile.roles.clone(),
            act_as_account: profile.act_as_account.clone(),
            key_id: profile.key_id.clone(),
            insecure: profile.insecure,
            key_ring,
            log: Some(log.clone()),
        })?;

        Ok(Self {
            config,
            profile,
            raw,
            log,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn raw(&self) -> &RawCloudApi {
        &self.raw
    }

    pub fn logger(&self) -> &Logger {
        &self.log
    }

    pub fn url(&self) -> &Url {
        self.raw.url()
    }

    pub fn account(&self) -> &str {
        self.raw.account()
    }

    pub fn is_unlocked(&self) -> bool {
        self.raw.is_unlocked()
    }

    pub async fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError> {
        self.raw.sign(content).await
    }
}

impl AsRef<RawCloudApi> for CloudApi {
    fn as_ref(&self) -> &RawCloudApi {
        &self.raw
    }
}

/// Loads the config in `config_dir`, or in the default config directory.
pub fn load_config(config_dir: Option<&Path>) -> Result<Config, LoadConfigError> {
    ConfigStore::new(&JsonFileStorage, &discard_logger()).resolve(None, config_dir)
}

/// Looks up a profile by name, without validating it.
pub fn load_profile(name: &str, config_dir: Option<&Path>) -> Result<Profile, LoadProfileError> {
    ProfileStore::new(&JsonFileStorage, &discard_logger()).resolve_by_name(name, config_dir)
}

/// Every profile, starting with `env`.
pub fn load_all_profiles(config_dir: &Path) -> Result<Vec<Profile>, LoadProfileError> {
    let log = discard_logger();
    let store = ProfileStore::new(&JsonFileStorage, &log);
    store
        .list_names(config_dir)?
        .iter()
        .map(|name| store.resolve_by_name(name, Some(config_dir)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::tests::{ed25519_pem, FakeAgent};
    use crate::storage::Storage;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn raw_builder_sets_everything() {
        let client = RawCloudApi::builder("https://cloudapi.example.com", "bob", "aa:bb")
            .with_user("alice")
            .acting_as("corp")
            .insecure(true)
            .build()
            .unwrap();

        assert_eq!(client.url().as_str(), "https://cloudapi.example.com/");
        assert_eq!(client.account(), "bob");
        assert_eq!(client.request_account(), "corp");
        assert_eq!(client.key_path(), "/bob/users/alice/keys/aa:bb");
        assert!(client.insecure());
        assert!(!client.is_unlocked());
    }

    #[test]
    fn unparsable_url_is_a_build_error() {
        assert!(matches!(
            RawCloudApi::builder("not a url", "bob", "aa:bb").build(),
            Err(BuildClientError::ParseUrlFailed(url, _)) if url == "not a url"
        ));
    }

    #[test]
    fn new_uses_profile_and_config_key_dir() {
        let config = Config::defaults().with_config_dir(Path::new("/etc/triton"));
        let profile = Profile::new("https://cloudapi.example.com", "bob", "aa:bb").with_name("west");

        let client = CloudApi::new(config.clone(), profile.clone(), discard_logger()).unwrap();

        assert_eq!(client.config(), &config);
        assert_eq!(client.profile(), &profile);
        assert_eq!(client.raw().key_path(), "/bob/keys/aa:bb");
        assert_eq!(
            client.raw().key_ring().key_dir(),
            Some(Path::new("/etc/triton/keys"))
        );
    }

    #[tokio::test]
    async fn sign_loads_plain_keys_on_demand() {
        let td = TempDir::new().unwrap();
        let key_ring = KeyRing::new(Some(td.path().to_path_buf()));
        key_ring
            .import("plain", "aa:bb", &ed25519_pem(), None, &discard_logger())
            .unwrap();
        let client = RawCloudApi::builder("https://cloudapi.example.com", "bob", "aa:bb")
            .with_key_ring(key_ring)
            .build()
            .unwrap();

        assert_eq!(client.sign(b"date: today").await.unwrap().len(), 64);
        assert!(client.is_unlocked());
    }

    #[tokio::test]
    async fn sign_refuses_locked_keys() {
        let td = TempDir::new().unwrap();
        let key_ring = KeyRing::new(Some(td.path().to_path_buf()));
        key_ring
            .import("locked", "aa:bb", &ed25519_pem(), Some("pw"), &discard_logger())
            .unwrap();
        let client = RawCloudApi::builder("https://cloudapi.example.com", "bob", "aa:bb")
            .with_key_ring(key_ring)
            .build()
            .unwrap();

        assert!(matches!(
            client.sign(b"content").await,
            Err(SignError::KeyLocked(id)) if id == "aa:bb"
        ));
        assert!(!client.is_unlocked());
    }

    #[tokio::test]
    async fn sign_goes_through_the_agent() {
        let agent = Arc::new(FakeAgent {
            key_ids: vec!["aa:bb".to_string()],
            ..Default::default()
        });
        let client = RawCloudApi::builder("https://cloudapi.example.com", "bob", "aa:bb")
            .with_key_ring(KeyRing::new(None).with_agent(agent.clone()))
            .build()
            .unwrap();

        assert_eq!(client.sign(b"content").await.unwrap(), b"agent-signature");
        assert_eq!(agent.signed.lock().unwrap().as_slice(), [b"content".to_vec()]);
    }

    #[test]
    fn load_all_profiles_starts_with_env() {
        let td = TempDir::new().unwrap();
        let profile = Profile::new("https://cloudapi.example.com", "bob", "aa:bb");
        JsonFileStorage
            .save_profile("west", &profile, td.path())
            .unwrap();

        let profiles = load_all_profiles(td.path()).unwrap();

        let names: Vec<_> = profiles.iter().map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec![Some("env"), Some("west")]);
        assert_eq!(
            load_profile("west", Some(td.path())).unwrap(),
            profile.with_name("west")
        );
        assert_eq!(
            load_config(Some(td.path())).unwrap().config_dir(),
            Some(td.path())
        );
    }
}
