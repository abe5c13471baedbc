//! Enumeration types for the SkipNight vote engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VoteType
// ---------------------------------------------------------------------------

/// The category of world state a vote tries to skip.
///
/// Each variant has its own trigger condition, fast-forward target, and
/// threshold settings; those live in the engine configuration so they can
/// be tuned per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// Skip the night (also available while a storm is raging).
    Night,
    /// Skip the remainder of the day.
    Day,
    /// Clear an active thunderstorm without touching the time.
    Thunder,
}

impl VoteType {
    /// Every vote type, in the order they are checked for bed-enter ballots.
    pub const ALL: [Self; 3] = [Self::Night, Self::Thunder, Self::Day];

    /// Lowercase display name used in messages (`night`, `day`, `thunder`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Day => "day",
            Self::Thunder => "thunder",
        }
    }

    /// Command label that starts or joins a vote of this type.
    pub const fn command(self) -> &'static str {
        match self {
            Self::Night => "skipnight",
            Self::Day => "skipday",
            Self::Thunder => "skipthunder",
        }
    }

    /// Find the vote type started by a command label, case-insensitively.
    pub fn from_command(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.command().eq_ignore_ascii_case(label))
    }

    /// Whether a player entering a bed may count as a YES ballot for this
    /// type. Skipping the day is never done by sleeping.
    pub const fn accepts_bed_ballot(self) -> bool {
        matches!(self, Self::Night | Self::Thunder)
    }
}

impl core::fmt::Display for VoteType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Ballot
// ---------------------------------------------------------------------------

/// A single player's choice on an active vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ballot {
    /// In favour of skipping.
    Yes,
    /// Against skipping.
    No,
}

impl Ballot {
    /// Parse a command argument (`yes`, `y`, `no`, `n`), case-insensitively.
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.to_ascii_lowercase().as_str() {
            "yes" | "y" => Some(Self::Yes),
            "no" | "n" => Some(Self::No),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// VoteState
// ---------------------------------------------------------------------------

/// Lifecycle state of the vote slot for one `(world, vote type)` pair.
///
/// Transitions only move forward: `None -> InProgress -> {Passed, Failed}`,
/// after which the slot is emptied and reads as `None` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// No vote exists.
    None,
    /// A vote is accepting ballots.
    InProgress,
    /// The vote reached its threshold.
    Passed,
    /// The vote timed out or its trigger condition went away.
    Failed,
}

impl VoteState {
    /// Whether moving from `self` to `next` respects the monotonic lifecycle.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::None, Self::InProgress)
                | (Self::InProgress, Self::Passed | Self::Failed)
                | (Self::Passed | Self::Failed, Self::None)
        )
    }
}

// ---------------------------------------------------------------------------
// FailureReason
// ---------------------------------------------------------------------------

/// Why a session ended in [`VoteState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The deadline passed without reaching the threshold.
    Timeout,
    /// The trigger condition stopped holding (time or weather changed).
    ConditionLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_labels_map_to_types() {
        for t in VoteType::ALL {
            assert_eq!(VoteType::from_command(t.command()), Some(t));
        }
        assert_eq!(VoteType::from_command("SkipNight"), Some(VoteType::Night));
        assert_eq!(VoteType::from_command("night"), None);
        assert_eq!(VoteType::from_command("skipnoon"), None);
    }

    #[test]
    fn ballot_parses_short_forms() {
        assert_eq!(Ballot::parse("Y"), Some(Ballot::Yes));
        assert_eq!(Ballot::parse("no"), Some(Ballot::No));
        assert_eq!(Ballot::parse("maybe"), None);
    }

    #[test]
    fn state_transitions_are_monotonic() {
        assert!(VoteState::None.can_transition_to(VoteState::InProgress));
        assert!(VoteState::InProgress.can_transition_to(VoteState::Passed));
        assert!(VoteState::InProgress.can_transition_to(VoteState::Failed));
        assert!(VoteState::Failed.can_transition_to(VoteState::None));

        assert!(!VoteState::None.can_transition_to(VoteState::Passed));
        assert!(!VoteState::Passed.can_transition_to(VoteState::InProgress));
        assert!(!VoteState::Passed.can_transition_to(VoteState::Failed));
        assert!(!VoteState::InProgress.can_transition_to(VoteState::InProgress));
    }

    #[test]
    fn day_votes_ignore_beds() {
        assert!(VoteType::Night.accepts_bed_ballot());
        assert!(!VoteType::Day.accepts_bed_ballot());
    }
}
