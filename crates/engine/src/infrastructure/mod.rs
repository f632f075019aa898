//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod card_store;
pub mod clock;
pub mod config;
pub mod feed;
pub mod memory;
pub mod permissions;
pub mod ports;
pub mod settings;
