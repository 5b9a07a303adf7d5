//! Core types and collaborator traits for the Colloquy conversation layer.
//!
//! This crate has no HTTP code. It defines the canonical
//! activity and conversation records, the static verb table, and the narrow
//! interfaces through which the client reaches transport, encryption,
//! identity, and normalisation collaborators.

pub mod activity;
pub mod conversation;
pub mod encryption;
pub mod error;
pub mod identity;
pub mod listing;
pub mod normalize;
pub mod transport;
pub mod verb;

pub use error::{BoxError, Error, Result};

/// `objectType` discriminants used on the wire.
pub mod object_type {
  pub const ACTIVITY: &str = "activity";
  pub const COMMENT: &str = "comment";
  pub const CONTENT: &str = "content";
  pub const CONVERSATION: &str = "conversation";
  pub const FILE: &str = "file";
  pub const PERSON: &str = "person";
}
