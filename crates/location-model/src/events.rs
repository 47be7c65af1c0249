//! Core event bus
//!
//! The core publishes location updates and region transitions here;
//! presentation layers subscribe and redraw from the events alone.

use crate::{Position, TransitionKind};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered events per subscriber
const DEFAULT_CAPACITY: usize = 64;

/// Events published by the core
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The device position changed
    LocationUpdated(Position),
    /// The device crossed a monitored region boundary
    TransitionOccurred {
        region_id: String,
        kind: TransitionKind,
    },
}

/// Broadcast bus for [`CoreEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, event: CoreEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                trace!("No subscribers for {:?}", event);
                0
            }
        }
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
