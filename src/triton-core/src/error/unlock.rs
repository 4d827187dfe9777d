use crate::error::key::LoadKeyError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read user input")]
    ReadUserPasswordFailed(#[source] dialoguer::Error),
}

#[derive(Error, Debug)]
pub enum KeyUnlockError {
    #[error("No signing key with id '{0}' was found in the agent or the key directory.")]
    KeyNotFound(String),

    #[error("Failed to load signing key")]
    LoadKeyFailed(#[source] LoadKeyError),

    #[error("A passphrase is required for {0}, but no prompt is available.")]
    NoPromptAvailable(String),

    #[error("Failed to prompt for passphrase")]
    PromptFailed(#[source] PromptError),

    #[error("Passphrase prompt was cancelled.")]
    Cancelled(),

    #[error("Passphrase prompt timed out after {0:?}.")]
    TimedOut(Duration),

    #[error("Passphrase for {0} was rejected.")]
    PassphraseRejected(String),

    #[error("Unlock task failed")]
    TaskFailed(#[source] tokio::task::JoinError),
}
