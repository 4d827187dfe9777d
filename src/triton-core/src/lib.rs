pub mod client;
pub mod config;
pub mod error;
pub mod foundation;
pub mod fs;
pub mod json;
pub mod key;
pub mod profile;
pub mod storage;
pub mod unlock;

pub use client::{
    build_raw, create_client, load_all_profiles, load_config, load_profile, ClientBuilder,
    ClientOptions, CloudApi, RawClientOptions, RawCloudApi,
};
pub use config::Config;
pub use profile::Profile;
pub use unlock::{prompt_passphrase_unlock_key, KeyUnlocker};
