use std::sync::Arc;
use std::time::Duration;

use crate::core::services::approval_gateway::{
    ApprovalGateway, ApprovalQueue, DEFAULT_APPROVAL_TIMEOUT,
};
use crate::core::services::expiry_reaper::{DEFAULT_REAP_INTERVAL, ExpiryReaper, ReaperHandle};
use crate::core::services::key_vault::KeyVault;
use crate::core::services::notification_bus::{
    DEFAULT_EVENT_CAPACITY, NotificationBus, NotificationStream,
};
use crate::core::services::signing_pipeline::SigningPipeline;
use crate::core::traits::clock::Clock;

/// Tunables for the key custodian.
#[derive(Debug, Clone)]
pub struct CustodianConfig {
    pub approval_timeout: Duration,
    pub reap_interval: Duration,
    pub event_capacity: usize,
}

impl Default for CustodianConfig {
    fn default() -> Self {
        Self {
            approval_timeout: DEFAULT_APPROVAL_TIMEOUT,
            reap_interval: DEFAULT_REAP_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Everything the single decision consumer drains.
pub struct CustodianFeeds {
    pub events: NotificationStream,
    pub approvals: ApprovalQueue,
}

/// The vault and signing pipeline, wired together.
///
/// Construct once, hand clones of the `Arc`s to the protocol adapter, the
/// reaper and the consumer. Shutdown order: stop accepting connections,
/// stop the reaper, then drop the custodian and the feeds.
pub struct Custodian {
    vault: Arc<KeyVault>,
    pipeline: Arc<SigningPipeline>,
    reap_interval: Duration,
}

impl Custodian {
    pub fn new(config: CustodianConfig, clock: Arc<dyn Clock>) -> (Self, CustodianFeeds) {
        let (bus, events) = NotificationBus::channel(config.event_capacity);
        let (gateway, approvals) = ApprovalGateway::new(config.approval_timeout);

        let vault = Arc::new(KeyVault::new(bus, clock));
        let pipeline = Arc::new(SigningPipeline::new(vault.clone(), Arc::new(gateway)));

        let custodian = Self {
            vault,
            pipeline,
            reap_interval: config.reap_interval,
        };
        (custodian, CustodianFeeds { events, approvals })
    }

    pub fn vault(&self) -> &Arc<KeyVault> {
        &self.vault
    }

    pub fn pipeline(&self) -> &Arc<SigningPipeline> {
        &self.pipeline
    }

    /// Start the background expiry sweep.
    pub fn spawn_reaper(&self) -> ReaperHandle {
        ExpiryReaper::new(self.vault.clone(), self.reap_interval).spawn()
    }
}
