//! Value objects: pure rules with no identity.

mod degree;
mod difficulty;
mod outcome;
mod target_number;

pub use degree::{
    resolve_degree, CriticalProfile, CriticalRules, RollResult, NPC_CRITICAL_FAILURE_MIN,
    NPC_CRITICAL_SUCCESS_MAX,
};
pub use difficulty::Difficulty;
pub use outcome::{resolve_outcome, DecidedBy, Outcome, Winner};
pub use target_number::{
    resolve_target_number, Declaration, ModifierLine, ModifierSource, ResolvedTarget,
    SituationalKind, SituationalModifier, TargetNumberBreakdown, TestSource,
    SPECIALIZATION_BONUS,
};
