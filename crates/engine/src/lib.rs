//! Duelcard Engine library.
//!
//! Runs banked-choice opposed tests between independently controlled sessions
//! that share nothing but a card store.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping domain operations
//! - `use_cases/` - User story orchestration across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `stores/` - Per-process runtime state (sessions, in-flight guard)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

/// Shared table setup for use case tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
