use crate::core::errors::{AgentError, Result};

/// Signature algorithms the agent can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Ed25519,
    RsaSha2_256,
    RsaSha2_512,
}

impl SignatureAlgorithm {
    /// The SSH algorithm name carried inside a signature blob.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ssh-ed25519",
            Self::RsaSha2_256 => "rsa-sha2-256",
            Self::RsaSha2_512 => "rsa-sha2-512",
        }
    }

    /// Inverse of `as_str`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ssh-ed25519" => Some(Self::Ed25519),
            "rsa-sha2-256" => Some(Self::RsaSha2_256),
            "rsa-sha2-512" => Some(Self::RsaSha2_512),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm hint attached to a sign request.
///
/// Zero means "use the key's default algorithm". Any other value must name
/// one of the recognized RSA SHA-2 variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureFlags(u32);

impl SignatureFlags {
    pub const RSA_SHA2_256: u32 = 0x02;
    pub const RSA_SHA2_512: u32 = 0x04;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// True when no specific algorithm was requested.
    pub fn is_default(&self) -> bool {
        self.0 == 0
    }

    /// Resolve the explicitly requested algorithm.
    pub fn algorithm(&self) -> Result<SignatureAlgorithm> {
        match self.0 {
            Self::RSA_SHA2_256 => Ok(SignatureAlgorithm::RsaSha2_256),
            Self::RSA_SHA2_512 => Ok(SignatureAlgorithm::RsaSha2_512),
            flags => Err(AgentError::UnsupportedFlags { flags }),
        }
    }
}

/// A produced signature together with the algorithm actually used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub algorithm: SignatureAlgorithm,
    pub blob: Vec<u8>,
}
