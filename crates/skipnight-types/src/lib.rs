//! Shared type definitions for the SkipNight vote engine.
//!
//! This crate holds the vocabulary shared between the vote engine and any
//! host bridge: strongly-typed identifiers, vote enumerations, and the
//! message keys the engine emits for presentation.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for players, worlds, and sessions
//! - [`enums`] -- Vote types, ballots, session states, failure reasons
//! - [`notice`] -- Message keys and progress-bar output consumed by the
//!   messaging collaborator

pub mod enums;
pub mod ids;
pub mod notice;

// Re-export all public types at crate root for convenience.
pub use enums::{Ballot, FailureReason, VoteState, VoteType};
pub use ids::{PlayerId, SessionId, WorldId};
pub use notice::{Notice, ProgressBar};
