//! Vote engine for skipping the night, the day, or a thunderstorm.
//!
//! Players in a world vote to fast-forward time or clear the weather. A vote
//! may only be started while its condition holds (night, day, storm), runs
//! for a fixed number of server ticks, and passes as soon as enough of the
//! players present say yes. Getting into a bed counts as a yes; so does
//! everyone in a world being asleep at once.
//!
//! # Modules
//!
//! - [`clock`] -- Time-of-day windows and the [`ConditionOracle`].
//! - [`config`] -- Configuration loading from `skipnight-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- The [`VoteEngine`] state machine and fast-forward.
//! - [`error`] -- Rejection reasons surfaced to players.
//! - [`event`] -- Tagged host events and their outcomes.
//! - [`host`] -- [`WorldHost`] trait and the in-memory [`SimWorlds`].
//! - [`messaging`] -- [`Messenger`] trait, templated [`MessageCatalog`],
//!   and [`RecordingMessenger`].
//! - [`registry`] -- Who is in which world and how long since they slept.
//! - [`runner`] -- [`TickLoop`] and the cross-task [`TickHandle`].
//! - [`scheduler`] -- Tick-keyed deferred tasks.
//! - [`session`] -- One vote's ballots, threshold, and deadline.
//! - [`sleep`] -- Bed occupancy and what a bed-enter means.
//!
//! [`ConditionOracle`]: clock::ConditionOracle
//! [`VoteEngine`]: engine::VoteEngine
//! [`WorldHost`]: host::WorldHost
//! [`SimWorlds`]: host::SimWorlds
//! [`Messenger`]: messaging::Messenger
//! [`MessageCatalog`]: messaging::MessageCatalog
//! [`RecordingMessenger`]: messaging::RecordingMessenger
//! [`TickLoop`]: runner::TickLoop
//! [`TickHandle`]: runner::TickHandle

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod host;
pub mod messaging;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod sleep;

pub use config::SkipConfig;
pub use engine::{Resolution, TickSummary, VoteEngine};
pub use error::VoteError;
pub use event::{Outcome, VoteEvent};
pub use host::{SimWorlds, WorldHost};
pub use messaging::{MessageCatalog, Messenger, RecordingMessenger};
pub use runner::{Completion, TickHandle, TickLoop};
