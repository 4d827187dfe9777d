use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::{Parser, Subcommand};

mod get;
mod list;

/// Inspects the profiles used to connect to CloudAPI.
#[derive(Parser)]
pub struct ProfileOpts {
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    Get(get::GetOpts),
    List(list::ListOpts),
}

pub fn exec(env: &dyn Environment, opts: ProfileOpts) -> TritonResult {
    match opts.subcmd {
        SubCommand::Get(v) => get::exec(env, v),
        SubCommand::List(v) => list::exec(env, v),
    }
}
