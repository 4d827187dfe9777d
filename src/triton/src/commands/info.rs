use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::Parser;
use slog::warn;
use triton_core::KeyUnlocker;

/// Shows which endpoint, account and key the current profile uses.
#[derive(Parser)]
pub struct InfoOpts {}

pub fn exec(env: &dyn Environment, _opts: InfoOpts) -> TritonResult {
    let client = env.new_client_builder().build()?;
    let raw = client.raw();

    let needs_unlock = match KeyUnlocker::new().needs_unlock(&client) {
        Ok(true) => "yes",
        Ok(false) => "no",
        Err(err) => {
            warn!(env.get_logger(), "Cannot tell whether the key is locked: {}", err);
            "unknown"
        }
    };

    println!(
        "profile: {}",
        client.profile().name.as_deref().unwrap_or_default()
    );
    println!("url: {}", raw.url());
    println!("account: {}", raw.request_account());
    if let Some(user) = raw.user() {
        println!("user: {}", user);
    }
    println!("keyId: {}", raw.key_path());
    println!("needs unlock: {}", needs_unlock);
    Ok(())
}
