//! Published roll messages.
//!
//! A roll record is produced by whichever session actually rolled the dice and
//! is visible to everyone. It is untrusted input: the banker validates it
//! against the card before anything is merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Lane;
use crate::{ActorId, ContestId, RollRecordId, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRecord {
    pub id: RollRecordId,
    pub contest_id: ContestId,
    pub lane: Lane,
    /// Actor the roller claims to have rolled for, if it says so.
    pub actor_id: Option<ActorId>,
    pub author: SessionId,
    pub roll_total: i32,
    /// Degree the roller computed locally. Kept for audit only.
    #[serde(default)]
    pub claimed_degree: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RollRecord {
    pub fn new(
        contest_id: ContestId,
        lane: Lane,
        author: SessionId,
        roll_total: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RollRecordId::new(),
            contest_id,
            lane,
            actor_id: None,
            author,
            roll_total,
            claimed_degree: None,
            created_at,
        }
    }

    pub fn with_actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_claimed_degree(mut self, degree: u32) -> Self {
        self.claimed_degree = Some(degree);
        self
    }
}
