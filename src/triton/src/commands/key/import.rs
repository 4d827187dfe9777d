use crate::lib::environment::Environment;
use crate::lib::error::TritonResult;
use anyhow::Context;
use clap::Parser;
use dialoguer::Password;
use slog::info;
use std::path::PathBuf;
use triton_core::key::KeyRing;

/// Stores a PKCS#8 PEM key in the key directory.
#[derive(Parser)]
pub struct ImportOpts {
    /// The name to store the key under.
    #[arg(long)]
    name: String,

    /// The key's fingerprint, as CloudAPI knows it.
    #[arg(long)]
    key_id: String,

    /// The PEM file to import.
    #[arg(long)]
    pem_file: PathBuf,

    /// Encrypt the stored key with a passphrase.
    #[arg(long)]
    encrypt: bool,
}

pub fn exec(env: &dyn Environment, opts: ImportOpts) -> TritonResult {
    let log = env.get_logger();
    let pem_content = std::fs::read(&opts.pem_file)
        .with_context(|| format!("Failed to read {}", opts.pem_file.display()))?;
    let passphrase = if opts.encrypt {
        Some(
            Password::new()
                .with_prompt("Enter a passphrase for the key")
                .with_confirmation("Repeat passphrase", "Passphrases do not match")
                .interact()
                .context("Failed to read passphrase")?,
        )
    } else {
        None
    };

    let key_ring = KeyRing::new(env.get_config().key_dir());
    let key_dir = key_ring.import(
        &opts.name,
        &opts.key_id,
        &pem_content,
        passphrase.as_deref(),
        log,
    )?;
    info!(log, r#"Imported key "{}" into {}."#, opts.name, key_dir.display());
    Ok(())
}
