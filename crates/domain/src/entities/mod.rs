//! Domain entities.

mod actor;
mod roll_record;

pub use actor::{ActorClass, ActorPenalties, ActorSnapshot, Capability, TokenSnapshot};
pub use opposed_test::{
    BankEffect, CardContext, Lane, LaneCommit, LaneState, OpposedTestState, Phase, Status,
    TestParticipant, CARD_SCHEMA_VERSION,
};
pub use roll_record::RollRecord;
