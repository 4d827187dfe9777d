use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::Parser;
use std::io::Write;
use triton_core::profile::ProfileStore;
use triton_core::storage::JsonFileStorage;

/// Lists profiles. The current one is marked with '*'.
#[derive(Parser)]
pub struct ListOpts {}

pub fn exec(env: &dyn Environment, _opts: ListOpts) -> TritonResult {
    let store = ProfileStore::new(&JsonFileStorage, env.get_logger());
    let current_profile = env.get_profile_name();
    for name in store.list_names(env.get_config_dir())? {
        if name == current_profile {
            // same profile, suffix with '*'.
            print!("{}", name);
            std::io::stdout().flush()?;
            eprint!(" *");
            std::io::stderr().flush()?;
            println!();
        } else {
            println!("{}", name);
        }
    }
    Ok(())
}
