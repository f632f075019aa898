//! Read-only actor and token snapshots.
//!
//! Actors are owned by an external data provider. The opposed test core only
//! ever reads these snapshots; derived penalties and item bonuses arrive
//! pre-computed.

use serde::{Deserialize, Serialize};

use crate::{ActorId, CapabilityId, TokenId};

/// Which critical band an actor rolls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClass {
    /// Player characters: per-character lucky / unlucky numbers.
    Character,
    /// Non-player actors: fixed thresholds (success <= 3, failure >= 98).
    Npc,
}

/// A rated capability (skill, combat style, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub id: CapabilityId,
    pub name: String,
    pub rating: i32,
    /// Sum of equipped-item bonuses that apply to this capability.
    #[serde(default)]
    pub item_bonus: i32,
    #[serde(default)]
    pub supports_specialization: bool,
}

impl Capability {
    pub fn new(name: impl Into<String>, rating: i32) -> Self {
        Self {
            id: CapabilityId::new(),
            name: name.into(),
            rating,
            item_bonus: 0,
            supports_specialization: false,
        }
    }

    pub fn with_item_bonus(mut self, bonus: i32) -> Self {
        self.item_bonus = bonus;
        self
    }

    pub fn with_specialization(mut self) -> Self {
        self.supports_specialization = true;
        self
    }
}

/// Actor-derived penalties, already signed (penalties are negative).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActorPenalties {
    pub fatigue: i32,
    pub encumbrance: i32,
    pub armor_mobility: i32,
    pub wound: i32,
    pub environment: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub name: String,
    pub class: ActorClass,
    #[serde(default)]
    pub lucky_numbers: Vec<u8>,
    #[serde(default)]
    pub unlucky_numbers: Vec<u8>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub penalties: ActorPenalties,
}

impl ActorSnapshot {
    pub fn new(name: impl Into<String>, class: ActorClass) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            class,
            lucky_numbers: Vec::new(),
            unlucky_numbers: Vec::new(),
            capabilities: Vec::new(),
            penalties: ActorPenalties::default(),
        }
    }

    pub fn with_id(mut self, id: ActorId) -> Self {
        self.id = id;
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_luck(mut self, lucky: Vec<u8>, unlucky: Vec<u8>) -> Self {
        self.lucky_numbers = lucky;
        self.unlucky_numbers = unlucky;
        self
    }

    pub fn with_penalties(mut self, penalties: ActorPenalties) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn capability(&self, id: CapabilityId) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.id == id)
    }
}

/// A placed token. Tokens may be re-linked to another actor by the board owner,
/// which is why the card re-checks `actor_id` before trusting a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub actor_id: ActorId,
    pub name: String,
}
