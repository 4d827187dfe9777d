use crate::lib::error::TritonResult;
use anyhow::Context;
use slog::Logger;
use std::path::{Path, PathBuf};
use triton_core::config::directories::get_default_config_dir;
use triton_core::{load_config, ClientBuilder, CloudApi, Config};

pub trait Environment {
    fn get_logger(&self) -> &Logger;

    fn get_config_dir(&self) -> &Path;

    fn get_config(&self) -> &Config;

    /// The profile named on the command line, else the one the config selects.
    fn get_profile_name(&self) -> &str;

    /// A client builder for the current profile and config directory.
    fn new_client_builder(&self) -> ClientBuilder {
        CloudApi::builder()
            .with_profile_name(self.get_profile_name())
            .with_config_dir(self.get_config_dir())
            .with_logger(self.get_logger().clone())
    }
}

pub struct EnvironmentImpl {
    config_dir: PathBuf,
    config: Config,
    profile_override: Option<String>,
    logger: Logger,
}

impl EnvironmentImpl {
    pub fn new(config_dir: Option<PathBuf>) -> TritonResult<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => get_default_config_dir().context("Failed to determine config directory")?,
        };
        let config = load_config(Some(config_dir.as_path()))?;
        Ok(Self {
            config_dir,
            config,
            profile_override: None,
            logger: Logger::root(slog::Discard, slog::o!()),
        })
    }

    pub fn with_logger(self, logger: Logger) -> Self {
        Self { logger, ..self }
    }

    pub fn with_profile_override(self, profile_override: Option<String>) -> Self {
        Self {
            profile_override,
            ..self
        }
    }
}

impl Environment for EnvironmentImpl {
    fn get_logger(&self) -> &Logger {
        &self.logger
    }

    fn get_config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn get_config(&self) -> &Config {
        &self.config
    }

    fn get_profile_name(&self) -> &str {
        self.profile_override
            .as_deref()
            .unwrap_or_else(|| self.config.default_profile_name())
    }
}
