//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Card and roll-record storage (could swap in-memory -> SQLite -> a hosted document store)
//! - Actor data and permissions (owned by the surrounding table software)
//! - Per-session preferences
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CardRepo, PreferencesRepo, RollRecordRepo};

// =============================================================================
// Types
// =============================================================================
pub use types::{SessionInfo, SessionRole, UserPreferences};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{can_roll_for, ActorDataPort, PermissionPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCardRepo, MockPreferencesRepo, MockRollRecordRepo};

#[cfg(test)]
pub use external::{MockActorDataPort, MockPermissionPort};

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
