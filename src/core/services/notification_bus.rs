use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::core::models::event::NotificationEvent;

/// Events buffered for the consumer before new ones are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Producer side of the outbound event queue.
///
/// `emit` never blocks and never fails: when the consumer lags behind or is
/// gone, the event is dropped and a log line records it.
#[derive(Clone)]
pub struct NotificationBus {
    tx: mpsc::Sender<NotificationEvent>,
}

/// Consumer side of the event queue. There is exactly one.
pub struct NotificationStream {
    rx: mpsc::Receiver<NotificationEvent>,
}

impl NotificationBus {
    /// Create a bus and its single consumer.
    pub fn channel(capacity: usize) -> (Self, NotificationStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, NotificationStream { rx })
    }

    pub fn emit(&self, event: NotificationEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "notification queue full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                debug!(?event, "no notification listener");
            }
        }
    }
}

impl NotificationStream {
    /// Wait for the next event. `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        self.rx.recv().await
    }

    /// Take an already queued event, if any.
    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<NotificationEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
