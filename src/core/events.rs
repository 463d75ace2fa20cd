//! Inventory change notifications.
//!
//! Views that cache stock or revenue figures subscribe here instead of being
//! reached through a global handle. Checkout publishes after every successful
//! commit; callers publish [`InventoryEvent::ProductRemoved`] after a
//! cascading delete.

use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

/// Something observers may want to refresh for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// Stock of these products changed through a checkout
    StockChanged {
        /// Affected products, in cart order
        product_ids: Vec<i64>,
    },
    /// A product and its sale history were deleted
    ProductRemoved {
        /// Deleted product
        product_id: i64,
    },
}

/// Cloneable publisher; every clone feeds the same subscribers.
#[derive(Debug, Clone)]
pub struct InventoryEvents {
    sender: broadcast::Sender<InventoryEvent>,
}

impl InventoryEvents {
    /// A channel that buffers up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new observer. It only sees events published afterwards.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.sender.subscribe()
    }

    /// Sends `event` to every current subscriber. Having none is fine.
    pub fn publish(&self, event: InventoryEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(?event, "No inventory subscribers");
        }
    }
}

impl Default for InventoryEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
