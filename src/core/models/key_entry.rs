use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::core::traits::signer::KeySigner;

/// Lease applied when a client asks for a non-positive lifetime.
pub const DEFAULT_LIFETIME_SECS: i64 = 300;

/// Display format for expiry times, e.g. `Mon Jan  2 15:04:05 UTC 2006`.
pub const EXPIRY_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// OpenSSH-style fingerprint: `SHA256:` + unpadded base64 of the digest.
pub fn fingerprint(public_key_blob: &[u8]) -> String {
    let digest = Sha256::digest(public_key_blob);
    format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
}

/// Replace a non-positive lifetime with the default lease.
pub fn effective_lifetime(lifetime_secs: i64) -> i64 {
    if lifetime_secs <= 0 {
        DEFAULT_LIFETIME_SECS
    } else {
        lifetime_secs
    }
}

/// One custodied key and its lease.
pub struct KeyEntry {
    signer: Arc<dyn KeySigner>,
    public_key_blob: Vec<u8>,
    fingerprint: String,
    comment: String,
    expire_at: DateTime<Utc>,
    usage: Arc<AtomicU64>,
}

impl KeyEntry {
    /// Take custody of `signer`. The fingerprint and expiry are fixed here.
    pub fn new(
        signer: Arc<dyn KeySigner>,
        comment: String,
        lifetime_secs: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let public_key_blob = signer.public_key_blob();
        let lifetime_secs = effective_lifetime(lifetime_secs);
        Self {
            fingerprint: fingerprint(&public_key_blob),
            public_key_blob,
            signer,
            comment,
            expire_at: now + Duration::seconds(lifetime_secs),
            usage: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn public_key_blob(&self) -> &[u8] {
        &self.public_key_blob
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn key_type(&self) -> &'static str {
        self.signer.key_type()
    }

    pub fn expire_at(&self) -> DateTime<Utc> {
        self.expire_at
    }

    pub fn signer(&self) -> Arc<dyn KeySigner> {
        Arc::clone(&self.signer)
    }

    /// Signatures produced under an explicitly named algorithm.
    pub fn usage_count(&self) -> u64 {
        self.usage.load(Ordering::Relaxed)
    }

    /// Shared handle to the usage counter, so it can be bumped without
    /// holding the vault lock.
    pub(crate) fn usage_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.usage)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_at
    }

    /// Comment shown to agent clients: `"<comment> [<expiry>]"`.
    pub fn display_comment(&self) -> String {
        format!(
            "{} [{}]",
            self.comment,
            self.expire_at.format(EXPIRY_FORMAT)
        )
    }

    pub fn listing(&self) -> KeyListing {
        KeyListing {
            key_type: self.key_type().to_string(),
            public_key_blob: self.public_key_blob.clone(),
            comment: self.display_comment(),
        }
    }

    pub fn summary(&self) -> KeySummary {
        KeySummary {
            key_type: self.key_type().to_string(),
            fingerprint: self.fingerprint.clone(),
            comment: self.comment.clone(),
            expire_at: self.expire_at,
            usage_count: self.usage_count(),
        }
    }
}

/// What `List` returns for each key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyListing {
    pub key_type: String,
    pub public_key_blob: Vec<u8>,
    pub comment: String,
}

/// Read-only view of an entry for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySummary {
    pub key_type: String,
    pub fingerprint: String,
    pub comment: String,
    pub expire_at: DateTime<Utc>,
    pub usage_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_has_openssh_shape() {
        let fp = fingerprint(b"some public key blob");
        assert!(fp.starts_with("SHA256:"));
        // 32-byte digest is 43 base64 chars without padding
        assert_eq!(fp.len(), "SHA256:".len() + 43);
        assert!(!fp.ends_with('='));
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }

    #[test]
    fn non_positive_lifetime_uses_default() {
        assert_eq!(effective_lifetime(0), DEFAULT_LIFETIME_SECS);
        assert_eq!(effective_lifetime(-10), DEFAULT_LIFETIME_SECS);
        assert_eq!(effective_lifetime(1), 1);
        assert_eq!(effective_lifetime(3600), 3600);
    }
}
