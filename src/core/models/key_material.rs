use zeroize::Zeroizing;

/// Raw private key material as received from a client.
///
/// Secret components are wiped from memory when the value is dropped.
pub enum PrivateKeyMaterial {
    /// `public` is the 32-byte point; `secret` is `seed || public` (64 bytes).
    Ed25519 {
        public: Vec<u8>,
        secret: Zeroizing<Vec<u8>>,
    },
    /// Big-endian RSA components.
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
        d: Zeroizing<Vec<u8>>,
        iqmp: Zeroizing<Vec<u8>>,
        p: Zeroizing<Vec<u8>>,
        q: Zeroizing<Vec<u8>>,
    },
}

impl PrivateKeyMaterial {
    /// SSH key type name of this material.
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::Ed25519 { .. } => "ssh-ed25519",
            Self::Rsa { .. } => "ssh-rsa",
        }
    }
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("key_type", &self.key_type())
            .finish_non_exhaustive()
    }
}
