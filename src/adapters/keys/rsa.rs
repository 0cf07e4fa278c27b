use rand::rngs::OsRng;
use rsa::pkcs1v15::SigningKey as Pkcs1v15SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha512};

use crate::adapters::protocol::wire::WireWrite;
use crate::core::errors::{AgentError, Result};
use crate::core::models::signature::{Signature, SignatureAlgorithm};
use crate::core::traits::signer::{AlgorithmSigner, KeySigner};

pub const KEY_TYPE: &str = "ssh-rsa";

/// RSA key, PKCS#1 v1.5 signatures over SHA-2.
///
/// The default algorithm is `rsa-sha2-512`; SHA-1 `ssh-rsa` signatures are
/// never produced. The private-key operation is always blinded with `OsRng`.
pub struct RsaSigner {
    key: RsaPrivateKey,
}

impl RsaSigner {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    pub fn generate(bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, bits).map_err(AgentError::construction)?;
        Ok(Self::new(key))
    }

    /// Rebuild from big-endian components as carried on the wire.
    ///
    /// The CRT coefficient is derived from `p` and `q`, so the wire `iqmp`
    /// is not needed.
    pub fn from_components(n: &[u8], e: &[u8], d: &[u8], p: &[u8], q: &[u8]) -> Result<Self> {
        let key = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
            BigUint::from_bytes_be(d),
            vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
        )
        .map_err(AgentError::construction)?;
        key.validate().map_err(AgentError::construction)?;
        Ok(Self::new(key))
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }
}

impl KeySigner for RsaSigner {
    fn key_type(&self) -> &'static str {
        KEY_TYPE
    }

    fn public_key_blob(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.put_string(KEY_TYPE.as_bytes());
        blob.put_mpint(&self.key.e().to_bytes_be());
        blob.put_mpint(&self.key.n().to_bytes_be());
        blob
    }

    fn sign(&self, data: &[u8]) -> Result<Signature> {
        self.sign_with_algorithm(data, SignatureAlgorithm::RsaSha2_512)
    }

    fn algorithm_signer(&self) -> Option<&dyn AlgorithmSigner> {
        Some(self)
    }
}

impl AlgorithmSigner for RsaSigner {
    fn sign_with_algorithm(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Signature> {
        let signed = match algorithm {
            SignatureAlgorithm::RsaSha2_256 => {
                Pkcs1v15SigningKey::<Sha256>::new(self.key.clone())
                    .try_sign_with_rng(&mut OsRng, data)
            }
            SignatureAlgorithm::RsaSha2_512 => {
                Pkcs1v15SigningKey::<Sha512>::new(self.key.clone())
                    .try_sign_with_rng(&mut OsRng, data)
            }
            SignatureAlgorithm::Ed25519 => {
                return Err(AgentError::UnsupportedSigner {
                    key_type: KEY_TYPE.to_string(),
                });
            }
        };
        let signature = signed.map_err(|e| AgentError::ConstructionFailed {
            reason: format!("rsa signing failed: {e}"),
        })?;

        Ok(Signature {
            algorithm,
            blob: signature.to_bytes().into_vec(),
        })
    }
}
