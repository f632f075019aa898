//! Duelcard domain.
//!
//! Pure types and rules for banked-choice opposed tests: the shared card, the
//! target number / degree / outcome resolvers, and the invariants every card
//! mutation must uphold. No I/O lives here; the engine crate supplies storage,
//! randomness, time and permissions through ports.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    ActorClass, ActorPenalties, ActorSnapshot, BankEffect, Capability, CardContext, Lane,
    LaneCommit, LaneState, OpposedTestState, Phase, RollRecord, Status, TestParticipant,
    TokenSnapshot, CARD_SCHEMA_VERSION,
};

pub use error::DomainError;

pub use ids::{ActorId, CapabilityId, ContestId, RollRecordId, SessionId, TokenId};

pub use value_objects::{
    resolve_degree, resolve_outcome, resolve_target_number, CriticalProfile, CriticalRules,
    DecidedBy, Declaration, Difficulty, ModifierLine, ModifierSource, Outcome, ResolvedTarget,
    RollResult, SituationalKind, SituationalModifier, TargetNumberBreakdown, TestSource, Winner,
    SPECIALIZATION_BONUS,
};
