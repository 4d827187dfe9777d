use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::{Parser, Subcommand};

mod import;
mod unlock;

/// Manages the keys requests to CloudAPI are signed with.
#[derive(Parser)]
pub struct KeyOpts {
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    Import(import::ImportOpts),
    Unlock(unlock::UnlockOpts),
}

pub fn exec(env: &dyn Environment, opts: KeyOpts) -> TritonResult {
    match opts.subcmd {
        SubCommand::Import(v) => import::exec(env, v),
        SubCommand::Unlock(v) => unlock::exec(env, v),
    }
}
