use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::adapters::protocol::wire::WireWrite;
use crate::core::errors::{AgentError, Result};
use crate::core::models::key_material::PrivateKeyMaterial;
use crate::core::models::signature::{Signature, SignatureAlgorithm};
use crate::core::traits::signer::KeySigner;

pub const KEY_TYPE: &str = "ssh-ed25519";

/// Ed25519 key. Signs only with `ssh-ed25519`; there is no algorithm choice.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Fresh random key.
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    /// Rebuild from wire material: `secret` is `seed || public`.
    pub fn from_material(public: &[u8], secret: &[u8]) -> Result<Self> {
        if secret.len() != 64 {
            return Err(AgentError::construction(format!(
                "ed25519 secret must be 64 bytes, got {}",
                secret.len()
            )));
        }
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&secret[..32]);
        let key = SigningKey::from_bytes(&seed);

        let derived = key.verifying_key();
        if derived.as_bytes() != public || &secret[32..] != public {
            return Err(AgentError::construction(
                "ed25519 public key does not match private key",
            ));
        }
        Ok(Self::new(key))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Export as wire material, the inverse of `from_material`.
    pub fn material(&self) -> PrivateKeyMaterial {
        let public = self.key.verifying_key().to_bytes().to_vec();
        let mut secret = Zeroizing::new(Vec::with_capacity(64));
        secret.extend_from_slice(self.key.as_bytes());
        secret.extend_from_slice(&public);
        PrivateKeyMaterial::Ed25519 { public, secret }
    }
}

impl KeySigner for Ed25519Signer {
    fn key_type(&self) -> &'static str {
        KEY_TYPE
    }

    fn public_key_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(51);
        blob.put_string(KEY_TYPE.as_bytes());
        blob.put_string(self.key.verifying_key().as_bytes());
        blob
    }

    fn sign(&self, data: &[u8]) -> Result<Signature> {
        Ok(Signature {
            algorithm: SignatureAlgorithm::Ed25519,
            blob: self.key.sign(data).to_bytes().to_vec(),
        })
    }
}
