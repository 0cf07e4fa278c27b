use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::debug;

use crate::core::errors::{AgentError, Result};
use crate::core::models::signature::{Signature, SignatureFlags};
use crate::core::services::approval_gateway::ApprovalGateway;
use crate::core::services::key_vault::KeyVault;

/// Sign requests: sweep, lock check, approval, then the key itself.
///
/// No vault lock is held while waiting for approval. Approval does not
/// reserve the key: if it expires or is removed in the meantime the call
/// ends with `KeyNotFound`.
pub struct SigningPipeline {
    vault: Arc<KeyVault>,
    gateway: Arc<ApprovalGateway>,
}

impl SigningPipeline {
    pub fn new(vault: Arc<KeyVault>, gateway: Arc<ApprovalGateway>) -> Self {
        Self { vault, gateway }
    }

    pub fn vault(&self) -> &Arc<KeyVault> {
        &self.vault
    }

    pub async fn sign(
        &self,
        public_key_blob: &[u8],
        payload: &[u8],
        flags: SignatureFlags,
    ) -> Result<Signature> {
        if self.vault.is_locked() {
            return Err(AgentError::AgentLocked);
        }
        self.vault.sweep_expired();

        self.gateway.request_approval(public_key_blob).await?;

        let handle = self.vault.signing_handle(public_key_blob)?;

        if flags.is_default() {
            let signature = handle.signer.sign(payload)?;
            debug!(fingerprint = %handle.fingerprint, algorithm = %signature.algorithm, "signed");
            return Ok(signature);
        }

        let Some(qualified) = handle.signer.algorithm_signer() else {
            return Err(AgentError::UnsupportedSigner {
                key_type: handle.signer.key_type().to_string(),
            });
        };
        let algorithm = flags.algorithm()?;
        let signature = qualified.sign_with_algorithm(payload, algorithm)?;
        handle.usage.fetch_add(1, Ordering::Relaxed);

        debug!(fingerprint = %handle.fingerprint, %algorithm, "signed with requested algorithm");
        Ok(signature)
    }
}
