//! Signing-capability constructors for the supported key types.

pub mod ed25519;
pub mod rsa;

use std::sync::Arc;

use crate::core::errors::Result;
use crate::core::models::key_material::PrivateKeyMaterial;
use crate::core::traits::signer::KeySigner;

pub use self::ed25519::Ed25519Signer;
pub use self::rsa::RsaSigner;

/// Build a signer from raw private key material.
///
/// Unusable material is reported as `ConstructionFailed`; nothing is stored.
pub fn signer_from_material(material: &PrivateKeyMaterial) -> Result<Arc<dyn KeySigner>> {
    match material {
        PrivateKeyMaterial::Ed25519 { public, secret } => {
            Ok(Arc::new(Ed25519Signer::from_material(public, secret)?))
        }
        PrivateKeyMaterial::Rsa { n, e, d, p, q, .. } => {
            Ok(Arc::new(RsaSigner::from_components(n, e, d, p, q)?))
        }
    }
}
