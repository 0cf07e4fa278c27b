//! Fixtures shared by the core unit tests.

use std::sync::Arc;

use crate::core::errors::Result;
use crate::core::models::signature::{Signature, SignatureAlgorithm};
use crate::core::traits::signer::{AlgorithmSigner, KeySigner};

/// Deterministic signer: the "signature" is the algorithm name plus payload.
pub struct FakeSigner {
    blob: Vec<u8>,
    qualified: bool,
}

impl FakeSigner {
    pub fn plain(name: &str) -> Arc<dyn KeySigner> {
        Arc::new(Self {
            blob: format!("fake-plain-{name}").into_bytes(),
            qualified: false,
        })
    }

    pub fn qualified(name: &str) -> Arc<dyn KeySigner> {
        Arc::new(Self {
            blob: format!("fake-rsa-{name}").into_bytes(),
            qualified: true,
        })
    }

    fn produce(algorithm: SignatureAlgorithm, data: &[u8]) -> Signature {
        let mut blob = algorithm.as_str().as_bytes().to_vec();
        blob.extend_from_slice(data);
        Signature { algorithm, blob }
    }
}

impl KeySigner for FakeSigner {
    fn key_type(&self) -> &'static str {
        if self.qualified { "ssh-rsa" } else { "ssh-ed25519" }
    }

    fn public_key_blob(&self) -> Vec<u8> {
        self.blob.clone()
    }

    fn sign(&self, data: &[u8]) -> Result<Signature> {
        let algorithm = if self.qualified {
            SignatureAlgorithm::RsaSha2_512
        } else {
            SignatureAlgorithm::Ed25519
        };
        Ok(Self::produce(algorithm, data))
    }

    fn algorithm_signer(&self) -> Option<&dyn AlgorithmSigner> {
        if self.qualified { Some(self) } else { None }
    }
}

impl AlgorithmSigner for FakeSigner {
    fn sign_with_algorithm(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Signature> {
        Ok(Self::produce(algorithm, data))
    }
}
