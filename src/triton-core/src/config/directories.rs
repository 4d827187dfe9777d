use crate::error::foundation::FoundationError;
use crate::foundation::get_user_home;
use std::path::PathBuf;

/// Overrides the default config directory when set and non-empty.
pub const CONFIG_DIR_ENV_VAR: &str = "TRITON_CONFIG_DIR";

/// The config directory used when the caller names none:
/// `$TRITON_CONFIG_DIR`, else `~/.triton`.
pub fn get_default_config_dir() -> Result<PathBuf, FoundationError> {
    match std::env::var_os(CONFIG_DIR_ENV_VAR) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Ok(PathBuf::from(get_user_home()?).join(".triton")),
    }
}
