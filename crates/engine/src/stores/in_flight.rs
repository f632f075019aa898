//! Re-entrancy guard for automatic roll execution.
//!
//! A session may receive several change notifications for the same card while
//! it is still executing rolls for it. The guard keeps at most one execution
//! per card per process. Release happens when the permit drops, on every exit
//! path including errors and unwinding.

use std::sync::Arc;

use dashmap::DashSet;
use duelcard_domain::ContestId;

#[derive(Clone, Default)]
pub struct InFlightGuard {
    active: Arc<DashSet<ContestId>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `id`. `None` if someone in this process already holds it.
    pub fn try_acquire(&self, id: ContestId) -> Option<InFlightPermit> {
        if self.active.insert(id) {
            Some(InFlightPermit {
                id,
                active: self.active.clone(),
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, id: ContestId) -> bool {
        self.active.contains(&id)
    }
}

/// Held while a card is being executed.
#[must_use = "the card is released as soon as the permit drops"]
pub struct InFlightPermit {
    id: ContestId,
    active: Arc<DashSet<ContestId>>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.active.remove(&self.id);
    }
}
