//!
//! Utility module for the frame bridge.
//!
/// Participant identity derivation
pub mod origin;

pub use origin::participant_uri;
