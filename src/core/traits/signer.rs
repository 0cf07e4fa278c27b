use crate::core::errors::Result;
use crate::core::models::signature::{Signature, SignatureAlgorithm};

/// Port for a custodied private key.
///
/// Implementations live in `adapters::keys` (Ed25519, RSA). The vault only
/// ever holds keys through this trait.
pub trait KeySigner: Send + Sync {
    /// SSH key type name (e.g. `ssh-ed25519`).
    fn key_type(&self) -> &'static str;

    /// Canonical SSH wire encoding of the public key.
    fn public_key_blob(&self) -> Vec<u8>;

    /// Sign `data` with the key's default algorithm.
    fn sign(&self, data: &[u8]) -> Result<Signature>;

    /// Algorithm-qualified signing, for keys that offer a choice.
    fn algorithm_signer(&self) -> Option<&dyn AlgorithmSigner> {
        None
    }
}

/// Narrower capability: signing under an explicitly named algorithm.
pub trait AlgorithmSigner: Send + Sync {
    fn sign_with_algorithm(&self, data: &[u8], algorithm: SignatureAlgorithm)
    -> Result<Signature>;
}
