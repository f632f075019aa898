//! In-memory state storage modules.
//!
//! Stores manage per-process runtime state that doesn't belong in the shared card store:
//! - `SessionStore` - connected session tracking
//! - `InFlightGuard` - re-entrancy lock for automatic execution

pub mod in_flight;
pub mod session;

// Re-export store types
pub use in_flight::{InFlightGuard, InFlightPermit};
pub use session::SessionStore;
