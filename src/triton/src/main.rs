#![allow(special_module_name)]
use crate::lib::environment::{Environment, EnvironmentImpl};
use crate::lib::error::TritonResult;
use crate::lib::logger::{create_root_logger, LoggingMode};
use anyhow::{Context, Error};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

mod commands;
mod lib;

/// Manages profiles and signing keys for Triton CloudAPI.
#[derive(Parser)]
#[command(name = "triton", version, arg_required_else_help = true)]
pub struct CliOpts {
    /// Displays detailed information about operations. -vv also traces them.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppresses informational messages. -qq limits to errors only; -qqqq disables them all.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// The logging mode to use. You can log to stderr, a file, or both.
    #[arg(long = "log", default_value = "stderr", value_parser = ["stderr", "tee", "file"], global = true)]
    logmode: String,

    /// The file to log to, if logging to a file (see --log).
    #[arg(long, global = true)]
    logfile: Option<String>,

    /// The profile to use instead of the one selected in the config.
    #[arg(long, short, env = "TRITON_PROFILE", global = true)]
    profile: Option<String>,

    /// The directory holding config.json, profiles and keys. Defaults to ~/.triton.
    #[arg(long, env = "TRITON_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::TritonCommand,
}

/// Sets up a logger according to the arguments.
fn setup_logging(opts: &CliOpts) -> TritonResult<slog::Logger> {
    let verbose_level = opts.verbose as i64 - opts.quiet as i64;

    let mode = match opts.logmode.as_str() {
        "tee" => LoggingMode::Tee(PathBuf::from(opts.logfile.as_deref().unwrap_or("log.txt"))),
        "file" => LoggingMode::File(PathBuf::from(opts.logfile.as_deref().unwrap_or("log.txt"))),
        _ => LoggingMode::Stderr,
    };

    create_root_logger(verbose_level, mode).context("Failed to set up logging")
}

fn print_error(err: Error) {
    for (level, cause) in err.chain().enumerate() {
        let prefix = if level == 0 { "Error" } else { "Caused by" };
        eprintln!("{prefix}: {cause}");
    }
}

fn inner_main() -> TritonResult {
    let cli_opts = CliOpts::parse();
    let log = setup_logging(&cli_opts)?;

    let env = EnvironmentImpl::new(cli_opts.config_dir)?
        .with_logger(log)
        .with_profile_override(cli_opts.profile);

    slog::trace!(
        env.get_logger(),
        "Trace mode enabled. Lots of logs coming up."
    );
    commands::exec(&env, cli_opts.command)
}

fn main() {
    if let Err(err) = inner_main() {
        print_error(err);
        std::process::exit(255);
    }
}

#[cfg(test)]
mod tests {
    use crate::CliOpts;
    use clap::{CommandFactory, Parser};

    #[test]
    fn valid_command() {
        CliOpts::command().debug_assert();
    }

    #[test]
    fn global_options_after_subcommand() {
        let opts = CliOpts::try_parse_from([
            "triton",
            "profile",
            "get",
            "east1",
            "--profile",
            "west1",
            "-vv",
        ])
        .unwrap();

        assert_eq!(opts.profile.as_deref(), Some("west1"));
        assert_eq!(opts.verbose, 2);
    }
}
