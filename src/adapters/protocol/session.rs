use std::sync::Arc;

use tracing::debug;

use crate::adapters::keys::signer_from_material;
use crate::adapters::protocol::messages::{AgentRequest, AgentResponse};
use crate::core::errors::Result;
use crate::core::services::custodian::Custodian;
use crate::core::services::key_vault::KeyVault;
use crate::core::services::signing_pipeline::SigningPipeline;

/// Maps decoded requests onto custodian operations.
///
/// One session value is shared by every connection; it holds no
/// per-connection state.
#[derive(Clone)]
pub struct AgentSession {
    vault: Arc<KeyVault>,
    pipeline: Arc<SigningPipeline>,
}

impl AgentSession {
    pub fn new(custodian: &Custodian) -> Self {
        Self {
            vault: custodian.vault().clone(),
            pipeline: custodian.pipeline().clone(),
        }
    }

    /// Run one request. Every failure becomes `Failure` on the wire.
    pub async fn handle(&self, request: AgentRequest) -> AgentResponse {
        let name = request.name();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(request = name, error = %e, "request failed");
                AgentResponse::Failure
            }
        }
    }

    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse> {
        match request {
            AgentRequest::RequestIdentities => Ok(AgentResponse::Identities(self.vault.list())),
            AgentRequest::Sign {
                key_blob,
                data,
                flags,
            } => {
                let signature = self.pipeline.sign(&key_blob, &data, flags).await?;
                Ok(AgentResponse::Signature(signature))
            }
            AgentRequest::AddIdentity {
                key,
                comment,
                lifetime_secs,
                confirm,
            } => {
                let signer = signer_from_material(&key)?;
                if confirm {
                    debug!("confirm constraint is implied for every key");
                }
                let lifetime = lifetime_secs.map_or(0, i64::from);
                self.vault.add(signer, &comment, lifetime);
                Ok(AgentResponse::Success)
            }
            AgentRequest::RemoveIdentity { key_blob } => {
                self.vault.remove(&key_blob)?;
                Ok(AgentResponse::Success)
            }
            AgentRequest::RemoveAllIdentities => {
                self.vault.remove_all()?;
                Ok(AgentResponse::Success)
            }
            AgentRequest::Lock { passphrase } => {
                self.vault.lock(&passphrase)?;
                Ok(AgentResponse::Success)
            }
            AgentRequest::Unlock { passphrase } => {
                self.vault.unlock(&passphrase)?;
                Ok(AgentResponse::Success)
            }
            AgentRequest::Unsupported { code } => {
                debug!(code, "unsupported request");
                Ok(AgentResponse::Failure)
            }
        }
    }
}
