//! Change notifications for the shared stores.
//!
//! Storage adapters publish here after every successful write; each session's
//! reactor subscribes and feeds the events into its own use cases.

use duelcard_domain::{ContestId, RollRecord};
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging.
const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CardChanged(ContestId),
    RollPublished(RollRecord),
}

pub struct ChangeFeed {
    sender: broadcast::Sender<StoreEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn card_changed(&self, id: ContestId) {
        self.publish(StoreEvent::CardChanged(id));
    }

    pub fn roll_published(&self, record: RollRecord) {
        self.publish(StoreEvent::RollPublished(record));
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is normal during start-up.
        if self.sender.send(event).is_err() {
            tracing::trace!("Store event dropped: no subscribers");
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
