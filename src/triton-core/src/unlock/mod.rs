//! Unlocking passphrase-protected signing keys.
//!
//! A client's key is usable without a passphrase when a signing agent holds it or
//! when it is stored in plain text. Otherwise the passphrase is collected through a
//! [`PassphrasePrompt`] and the decrypted key is installed in the client, once.
use crate::client::RawCloudApi;
use crate::error::unlock::KeyUnlockError::{
    Cancelled, NoPromptAvailable, PromptFailed, TaskFailed, TimedOut,
};
use crate::error::unlock::{KeyUnlockError, PromptError};
use crate::key::signer::Signer;
use crate::key::KeyRing;
use slog::{debug, info, Logger};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub trait PassphrasePrompt: Send + Sync {
    /// Asks for the passphrase of the described key.
    /// `Ok(None)` means the user declined to enter one.
    fn prompt_passphrase(&self, key_description: &str) -> Result<Option<String>, PromptError>;
}

/// Reads the passphrase from the terminal without echoing it.
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// None when stdin is not a terminal, as nobody could answer the prompt.
    pub fn available() -> Option<Arc<dyn PassphrasePrompt>> {
        if std::io::stdin().is_terminal() {
            Some(Arc::new(TerminalPrompt))
        } else {
            None
        }
    }
}

impl PassphrasePrompt for TerminalPrompt {
    fn prompt_passphrase(&self, key_description: &str) -> Result<Option<String>, PromptError> {
        let result = dialoguer::Password::new()
            .with_prompt(format!("Enter passphrase for {key_description}"))
            .allow_empty_password(true)
            .interact();
        match result {
            Ok(passphrase) => Ok(Some(passphrase)),
            Err(dialoguer::Error::IO(err)) if err.kind() == std::io::ErrorKind::Interrupted => {
                Ok(None)
            }
            Err(err) => Err(PromptError::ReadUserPasswordFailed(err)),
        }
    }
}

#[derive(Clone, Default)]
pub struct KeyUnlocker {
    prompt: Option<Arc<dyn PassphrasePrompt>>,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl KeyUnlocker {
    /// An unlocker without a prompt: it can only "unlock" keys that need no passphrase.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(self, prompt: Arc<dyn PassphrasePrompt>) -> Self {
        Self {
            prompt: Some(prompt),
            ..self
        }
    }

    /// Uses [`TerminalPrompt`] if stdin is a terminal.
    pub fn with_terminal_prompt(self) -> Self {
        Self {
            prompt: TerminalPrompt::available(),
            ..self
        }
    }

    /// Gives up on the prompt after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn with_cancellation(self, cancellation: CancellationToken) -> Self {
        Self {
            cancellation: Some(cancellation),
            ..self
        }
    }

    /// Makes the client's signing key usable, prompting for its passphrase if needed.
    ///
    /// Succeeds immediately if the key is already unlocked or needs no passphrase.
    /// On failure the client stays locked and the call may be repeated.
    pub async fn unlock<C: AsRef<RawCloudApi>>(&self, client: &C) -> Result<(), KeyUnlockError> {
        client.as_ref().signer(self).await.map(|_| ())
    }

    /// Whether signing with this client still requires a passphrase.
    pub fn needs_unlock<C: AsRef<RawCloudApi>>(&self, client: &C) -> Result<bool, KeyUnlockError> {
        let client = client.as_ref();
        if client.is_unlocked() {
            return Ok(false);
        }
        client
            .key_ring()
            .find(client.key_id(), client.logger())
            .map(|located| located.needs_passphrase())
    }

    pub(crate) async fn load_signer(
        &self,
        key_ring: &KeyRing,
        key_id: &str,
        log: &Logger,
    ) -> Result<Box<dyn Signer>, KeyUnlockError> {
        let located = key_ring.find(key_id, log)?;
        if !located.needs_passphrase() {
            debug!(log, "{} needs no passphrase", located.description());
            return key_ring.load_signer(&located, None);
        }

        let description = located.description();
        let prompt = self
            .prompt
            .clone()
            .ok_or_else(|| NoPromptAvailable(description.clone()))?;
        let passphrase = self.wait_for_passphrase(prompt, description).await?;

        let key_ring = key_ring.clone();
        let signer = tokio::task::spawn_blocking(move || {
            key_ring.load_signer(&located, Some(&passphrase))
        })
        .await
        .map_err(TaskFailed)??;
        info!(log, "Unlocked signing key {}", key_id);
        Ok(signer)
    }

    /// The prompt blocks, so it runs on the blocking pool. On timeout or
    /// cancellation it is abandoned rather than interrupted.
    async fn wait_for_passphrase(
        &self,
        prompt: Arc<dyn PassphrasePrompt>,
        description: String,
    ) -> Result<String, KeyUnlockError> {
        let task = tokio::task::spawn_blocking(move || prompt.prompt_passphrase(&description));

        let prompted = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, task)
                    .await
                    .map_err(|_| TimedOut(timeout)),
                None => Ok(task.await),
            }
        };
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let answer = tokio::select! {
            _ = cancelled => return Err(Cancelled()),
            answer = prompted => answer?,
        };
        answer
            .map_err(TaskFailed)?
            .map_err(PromptFailed)?
            .ok_or(Cancelled())
    }
}

/// Unlocks the client's signing key, asking for the passphrase on the terminal.
pub async fn prompt_passphrase_unlock_key<C: AsRef<RawCloudApi>>(
    client: &C,
) -> Result<(), KeyUnlockError> {
    KeyUnlocker::new().with_terminal_prompt().unlock(client).await
}
