use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::Parser;
use slog::info;
use triton_core::prompt_passphrase_unlock_key;

/// Unlocks the current profile's key, asking for its passphrase if it has one.
#[derive(Parser)]
pub struct UnlockOpts {}

pub fn exec(env: &dyn Environment, _opts: UnlockOpts) -> TritonResult {
    let client = env.new_client_builder().build()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(prompt_passphrase_unlock_key(&client))?;
    info!(env.get_logger(), "Key {} is unlocked.", client.raw().key_id());
    Ok(())
}
