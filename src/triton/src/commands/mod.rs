use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use clap::Subcommand;

mod info;
mod key;
mod profile;

#[derive(Subcommand)]
pub enum TritonCommand {
    Info(info::InfoOpts),
    Key(key::KeyOpts),
    Profile(profile::ProfileOpts),
}

pub fn exec(env: &dyn Environment, cmd: TritonCommand) -> TritonResult {
    match cmd {
        TritonCommand::Info(v) => info::exec(env, v),
        TritonCommand::Key(v) => key::exec(env, v),
        TritonCommand::Profile(v) => profile::exec(env, v),
    }
}
