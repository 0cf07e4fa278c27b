use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::core::errors::{AgentError, Result};
use crate::core::models::key_entry::fingerprint;

/// How long a signer waits for a decision by default.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// One pending "may this key sign now?" question.
///
/// Each request owns its own reply channel, so a decision can only ever
/// reach the signer that asked. Dropping the request without deciding
/// counts as a denial.
#[derive(Debug)]
pub struct ApprovalRequest {
    ticket: u64,
    public_key_blob: Vec<u8>,
    fingerprint: String,
    reply: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    /// Per-call correlation number, for logs and prompts.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn public_key_blob(&self) -> &[u8] {
        &self.public_key_blob
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// True once the signer stopped waiting (timeout or disconnect).
    pub fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    /// Resolves when the signer stops waiting.
    pub async fn abandoned(&mut self) {
        self.reply.closed().await
    }

    /// Deliver the decision. Returns `false` if nobody is waiting any more.
    pub fn decide(self, approved: bool) -> bool {
        self.reply.send(approved).is_ok()
    }

    pub fn approve(self) -> bool {
        self.decide(true)
    }

    pub fn deny(self) -> bool {
        self.decide(false)
    }
}

/// Decision-maker side: the queue of pending requests.
pub struct ApprovalQueue {
    rx: mpsc::UnboundedReceiver<ApprovalRequest>,
}

impl ApprovalQueue {
    pub async fn recv(&mut self) -> Option<ApprovalRequest> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ApprovalRequest> {
        self.rx.try_recv().ok()
    }
}

/// Rendezvous between signing connections and the external authority.
pub struct ApprovalGateway {
    tx: mpsc::UnboundedSender<ApprovalRequest>,
    timeout: Duration,
    next_ticket: AtomicU64,
}

impl ApprovalGateway {
    pub fn new(timeout: Duration) -> (Self, ApprovalQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            tx,
            timeout,
            next_ticket: AtomicU64::new(1),
        };
        (gateway, ApprovalQueue { rx })
    }

    /// Ask whether the key identified by `public_key_blob` may sign, and
    /// wait (bounded) for the answer.
    pub async fn request_approval(&self, public_key_blob: &[u8]) -> Result<()> {
        let fingerprint = fingerprint(public_key_blob);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (reply, decision) = oneshot::channel();

        let request = ApprovalRequest {
            ticket,
            public_key_blob: public_key_blob.to_vec(),
            fingerprint: fingerprint.clone(),
            reply,
        };

        debug!(ticket, %fingerprint, "requesting approval");
        if self.tx.send(request).is_err() {
            warn!(ticket, %fingerprint, "no approval authority is listening");
            return Err(AgentError::NotApproved { fingerprint });
        }

        match tokio::time::timeout(self.timeout, decision).await {
            Ok(Ok(true)) => {
                info!(ticket, %fingerprint, "signature approved");
                Ok(())
            }
            Ok(Ok(false)) => {
                info!(ticket, %fingerprint, "signature denied");
                Err(AgentError::NotApproved { fingerprint })
            }
            Ok(Err(_)) => {
                info!(ticket, %fingerprint, "request dropped without a decision");
                Err(AgentError::NotApproved { fingerprint })
            }
            Err(_) => {
                warn!(ticket, %fingerprint, timeout = ?self.timeout, "approval timed out");
                Err(AgentError::ApprovalTimeout {
                    fingerprint,
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
