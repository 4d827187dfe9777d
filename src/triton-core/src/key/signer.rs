//! Request signers backed by a PEM key or by a signing agent.
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, Ed25519KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use std::sync::Arc;

pub trait Signer: Send + Sync {
    /// Fingerprint of the key this signer signs with.
    fn key_id(&self) -> &str;

    fn algorithm(&self) -> &'static str;

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, String>;
}

/// A process holding private keys that signs on our behalf, such as ssh-agent.
/// Keys held by an agent never need to be unlocked.
pub trait SigningAgent: Send + Sync {
    fn key_ids(&self) -> Result<Vec<String>, String>;

    fn sign(&self, key_id: &str, content: &[u8]) -> Result<Vec<u8>, String>;
}

enum KeyPair {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
}

pub(crate) struct PemSigner {
    key_id: String,
    key_pair: KeyPair,
    rng: SystemRandom,
}

impl PemSigner {
    /// Accepts Ed25519 or ECDSA P-256 keys in PKCS#8 form.
    pub fn from_pkcs8(key_id: &str, pkcs8: &[u8]) -> Option<Self> {
        let rng = SystemRandom::new();
        let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(pkcs8)
            .map(KeyPair::Ed25519)
            .or_else(|_| {
                EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
                    .map(KeyPair::Ecdsa)
            })
            .ok()?;
        Some(Self {
            key_id: key_id.to_string(),
            key_pair,
            rng,
        })
    }
}

impl Signer for PemSigner {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn algorithm(&self) -> &'static str {
        match self.key_pair {
            KeyPair::Ed25519(_) => "ed25519",
            KeyPair::Ecdsa(_) => "ecdsa-sha256",
        }
    }

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, String> {
        match &self.key_pair {
            KeyPair::Ed25519(key_pair) => Ok(key_pair.sign(content).as_ref().to_vec()),
            KeyPair::Ecdsa(key_pair) => key_pair
                .sign(&self.rng, content)
                .map(|signature| signature.as_ref().to_vec())
                .map_err(|_| format!("ECDSA signing with key {} failed", self.key_id)),
        }
    }
}

pub(crate) struct AgentSigner {
    key_id: String,
    agent: Arc<dyn SigningAgent>,
}

impl AgentSigner {
    pub fn new(key_id: &str, agent: Arc<dyn SigningAgent>) -> Self {
        Self {
            key_id: key_id.to_string(),
            agent,
        }
    }
}

impl Signer for AgentSigner {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn algorithm(&self) -> &'static str {
        "agent"
    }

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, String> {
        self.agent.sign(&self.key_id, content)
    }
}
