use std::sync::atomic::AtomicU64;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use subtle::ConstantTimeEq;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::errors::{AgentError, Result};
use crate::core::models::event::{NotificationEvent, RemovalReason};
use crate::core::models::key_entry::{KeyEntry, KeyListing, KeySummary, fingerprint};
use crate::core::services::notification_bus::NotificationBus;
use crate::core::traits::clock::Clock;
use crate::core::traits::signer::KeySigner;

/// The custodied keys plus the lock state.
///
/// One readers-writer lock guards everything. Guards are scoped to the
/// in-memory change only: events are emitted after the guard is released,
/// so a listener that calls back into the vault cannot deadlock.
///
/// Lock gates key *usage* (list, signers, sign, remove). Adding a key while
/// locked is allowed.
pub struct KeyVault {
    state: RwLock<VaultState>,
    bus: NotificationBus,
    clock: Arc<dyn Clock>,
}

struct VaultState {
    entries: Vec<KeyEntry>,
    locked: bool,
    /// Non-empty exactly while `locked` is set.
    passphrase: Zeroizing<Vec<u8>>,
}

impl VaultState {
    fn position(&self, public_key_blob: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.public_key_blob() == public_key_blob)
    }
}

/// What the signing path needs from an entry, detached from the lock.
pub struct SigningHandle {
    pub signer: Arc<dyn KeySigner>,
    pub fingerprint: String,
    pub(crate) usage: Arc<AtomicU64>,
}

/// Snapshot for presentation layers. Keys are hidden while locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatus {
    pub locked: bool,
    pub keys: Vec<KeySummary>,
}

impl KeyVault {
    pub fn new(bus: NotificationBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(VaultState {
                entries: Vec::new(),
                locked: false,
                passphrase: Zeroizing::new(Vec::new()),
            }),
            bus,
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VaultState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VaultState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take custody of a key.
    ///
    /// Adding a key that is already held is a silent no-op: the original
    /// entry, including its expiry, is left untouched.
    pub fn add(&self, signer: Arc<dyn KeySigner>, comment: &str, lifetime_secs: i64) {
        let entry = KeyEntry::new(signer, comment.to_string(), lifetime_secs, self.clock.now());
        let public_key_blob = entry.public_key_blob().to_vec();
        let fingerprint = entry.fingerprint().to_string();
        let expire_at = entry.expire_at();

        {
            let mut state = self.write();
            if state.position(&public_key_blob).is_some() {
                drop(state);
                debug!(%fingerprint, "key already held, ignoring add");
                return;
            }
            state.entries.push(entry);
        }

        info!(%fingerprint, %expire_at, "added key");
        self.bus.emit(NotificationEvent::KeyAdded {
            public_key_blob,
            fingerprint,
        });
    }

    /// Drop one key on request.
    pub fn remove(&self, public_key_blob: &[u8]) -> Result<()> {
        let removed = {
            let mut state = self.write();
            if state.locked {
                return Err(AgentError::AgentLocked);
            }
            let Some(index) = state.position(public_key_blob) else {
                return Err(AgentError::KeyNotFound {
                    fingerprint: fingerprint(public_key_blob),
                });
            };
            state.entries.remove(index)
        };

        info!(fingerprint = %removed.fingerprint(), "removed key");
        self.bus.emit(NotificationEvent::KeyRemoved {
            fingerprint: removed.fingerprint().to_string(),
            reason: RemovalReason::UserRequest,
        });
        Ok(())
    }

    /// Drop every key, expired or not. Returns how many were held.
    pub fn remove_all(&self) -> Result<usize> {
        let removed = {
            let mut state = self.write();
            if state.locked {
                return Err(AgentError::AgentLocked);
            }
            std::mem::take(&mut state.entries)
        };

        let count = removed.len();
        drop(removed);
        info!(count, "removed all keys");
        self.bus.emit(NotificationEvent::AllKeysRemoved { count });
        Ok(count)
    }

    /// Public keys with display comments.
    ///
    /// While locked this is empty rather than an error, so a locked agent
    /// does not reveal how many keys it holds.
    pub fn list(&self) -> Vec<KeyListing> {
        self.sweep_expired();
        let state = self.read();
        if state.locked {
            return Vec::new();
        }
        state.entries.iter().map(KeyEntry::listing).collect()
    }

    /// Signing capabilities of every live key.
    pub fn signers(&self) -> Result<Vec<Arc<dyn KeySigner>>> {
        self.sweep_expired();
        let state = self.read();
        if state.locked {
            return Err(AgentError::AgentLocked);
        }
        Ok(state.entries.iter().map(KeyEntry::signer).collect())
    }

    pub fn lock(&self, passphrase: &[u8]) -> Result<()> {
        {
            let mut state = self.write();
            if state.locked {
                return Err(AgentError::AlreadyLocked);
            }
            if passphrase.is_empty() {
                return Err(AgentError::EmptyPassphrase);
            }
            state.passphrase = Zeroizing::new(passphrase.to_vec());
            state.locked = true;
        }
        info!("agent locked");
        Ok(())
    }

    /// Try to unlock.
    ///
    /// Always succeeds from the caller's point of view: a wrong passphrase
    /// leaves the vault locked without saying so. Query `is_locked` (or list)
    /// to learn the outcome. Unlocking an unlocked vault is a no-op.
    pub fn unlock(&self, candidate: &[u8]) -> Result<()> {
        let unlocked = {
            let mut state = self.write();
            if !state.locked {
                return Ok(());
            }
            let matches: bool = state.passphrase.as_slice().ct_eq(candidate).into();
            if matches {
                state.passphrase = Zeroizing::new(Vec::new());
                state.locked = false;
            }
            matches
        };

        if unlocked {
            info!("agent unlocked");
        } else {
            debug!("unlock attempt did not match");
        }
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.read().locked
    }

    /// Number of entries held, including hidden ones while locked.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict every entry whose lease has ended. Returns the eviction count.
    ///
    /// Runs whether or not the vault is locked. Each eviction produces its
    /// own `KeyRemoved` event, emitted after the guard is released.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        if !self.read().entries.iter().any(|e| e.is_expired(now)) {
            return 0;
        }

        let expired: Vec<KeyEntry> = {
            let mut state = self.write();
            let (expired, live) = std::mem::take(&mut state.entries)
                .into_iter()
                .partition(|e| e.is_expired(now));
            state.entries = live;
            expired
        };

        for entry in &expired {
            info!(fingerprint = %entry.fingerprint(), "key lease expired");
            self.bus.emit(NotificationEvent::KeyRemoved {
                fingerprint: entry.fingerprint().to_string(),
                reason: RemovalReason::Expired,
            });
        }
        expired.len()
    }

    /// Detach what the signing path needs from the entry for `public_key_blob`.
    ///
    /// An entry whose lease ended but has not been swept yet is treated as
    /// absent.
    pub fn signing_handle(&self, public_key_blob: &[u8]) -> Result<SigningHandle> {
        let now = self.clock.now();
        let state = self.read();
        if state.locked {
            return Err(AgentError::AgentLocked);
        }
        let entry = state
            .position(public_key_blob)
            .map(|index| &state.entries[index])
            .filter(|entry| !entry.is_expired(now))
            .ok_or_else(|| AgentError::KeyNotFound {
                fingerprint: fingerprint(public_key_blob),
            })?;

        Ok(SigningHandle {
            signer: entry.signer(),
            fingerprint: entry.fingerprint().to_string(),
            usage: entry.usage_counter(),
        })
    }

    /// Read-only snapshot for the presentation layer.
    pub fn status(&self) -> VaultStatus {
        self.sweep_expired();
        let state = self.read();
        let keys = if state.locked {
            Vec::new()
        } else {
            state.entries.iter().map(KeyEntry::summary).collect()
        };
        VaultStatus {
            locked: state.locked,
            keys,
        }
    }
}
