use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::Parser;
use triton_core::profile::ProfileStore;
use triton_core::storage::JsonFileStorage;

/// Prints a profile as JSON.
#[derive(Parser)]
pub struct GetOpts {
    /// The profile to print. Defaults to the current profile.
    name: Option<String>,
}

pub fn exec(env: &dyn Environment, opts: GetOpts) -> TritonResult {
    let store = ProfileStore::new(&JsonFileStorage, env.get_logger());
    let name = opts.name.as_deref().unwrap_or(env.get_profile_name());
    let profile = store.resolve_by_name(name, Some(env.get_config_dir()))?;
    store.validate(&profile)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}
