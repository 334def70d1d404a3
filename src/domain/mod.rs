//! Domain module
//!
//! Core domain types.

pub mod events;

pub use events::SessionEvent;

/// Identifier of the single profile kept by every store
pub const PROFILE_ID: &str = "learner";
