//! Entity modules - Domain capability encapsulation.
//!
//! Each module wraps operations for a domain entity type.
//! They depend on repository ports and provide the building blocks for use cases.

pub mod actors;
pub mod cards;
pub mod preferences;
pub mod roll_log;

pub use actors::Actors;
pub use cards::{CardError, CardUpdate, Cards, Mutation};
pub use preferences::Preferences;
pub use roll_log::RollLog;
