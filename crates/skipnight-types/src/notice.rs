//! Message keys emitted by the vote engine.
//!
//! The engine never produces user-facing text itself. It emits [`Notice`]
//! values addressed to players and [`ProgressBar`] updates addressed to a
//! world; a messaging collaborator turns those into chat lines and boss-bar
//! style indicators.

use serde::{Deserialize, Serialize};

use crate::enums::{Ballot, VoteType};

/// A message key plus the values needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum Notice {
    /// A vote was started by `initiator`.
    VoteStarted {
        /// Display name of the player who started the vote.
        initiator: String,
        /// The type of vote started.
        vote_type: VoteType,
    },
    /// Instructions for joining a running vote.
    VotePrompt {
        /// The type of the running vote.
        vote_type: VoteType,
    },
    /// The recipient's YES ballot was recorded.
    YouVotedYes,
    /// The recipient's NO ballot was recorded.
    YouVotedNo,
    /// The recipient repeated a ballot they had already cast.
    AlreadyVoted {
        /// The choice already on record.
        ballot: Ballot,
    },
    /// The vote passed; time or weather is about to change.
    VotePassed {
        /// The type of vote that passed.
        vote_type: VoteType,
    },
    /// The vote ran out of time.
    VoteFailed {
        /// The type of vote that failed.
        vote_type: VoteType,
    },
    /// The vote was abandoned because its trigger condition went away.
    ConditionLost {
        /// The type of vote that was abandoned.
        vote_type: VoteType,
    },
    /// The recipient must sleep before voting on a running vote.
    MustSleep,
    /// The recipient must sleep before starting a vote.
    MustSleepNewVote,
    /// The vote's trigger condition is not active right now.
    WrongCondition {
        /// The type of vote that was attempted.
        vote_type: VoteType,
    },
    /// The recipient is not present in the vote's world.
    NotEligible,
    /// A vote of this type is already running (or a skip is under way).
    VoteInProgress {
        /// The type of vote that is running.
        vote_type: VoteType,
    },
    /// No vote of this type is running.
    NoVoteInProgress {
        /// The type that was addressed.
        vote_type: VoteType,
    },
    /// The recipient is in bed but nobody has started a vote.
    InBedNoVoteInProgress {
        /// How many more players must sleep for the night to pass on its own.
        needed: u32,
    },
    /// The recipient's bed counted as a YES ballot.
    InBedVotedYes,
    /// The command label did not name a vote type.
    UnknownCommand {
        /// The label as typed.
        label: String,
    },
    /// A command argument was not `yes` or `no`.
    InvalidArgument {
        /// The argument as typed.
        argument: String,
    },
    /// Boss-bar title while a vote is counting down.
    VoteCountdown {
        /// The type of the running vote.
        vote_type: VoteType,
        /// YES ballots from present players.
        yes: u32,
        /// YES ballots required to pass.
        needed: u32,
        /// Whole seconds until the deadline.
        seconds_left: u64,
    },
    /// Boss-bar title while time is being fast-forwarded.
    FastForwarding {
        /// The type of vote that passed.
        vote_type: VoteType,
    },
}

impl Notice {
    /// Stable snake-case key identifying the message template.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::VoteStarted { .. } => "vote_started",
            Self::VotePrompt { .. } => "vote_prompt",
            Self::YouVotedYes => "you_voted_yes",
            Self::YouVotedNo => "you_voted_no",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::VotePassed { .. } => "vote_passed",
            Self::VoteFailed { .. } => "vote_failed",
            Self::ConditionLost { .. } => "condition_lost",
            Self::MustSleep => "must_sleep",
            Self::MustSleepNewVote => "must_sleep_new_vote",
            Self::WrongCondition { .. } => "wrong_condition",
            Self::NotEligible => "not_eligible",
            Self::VoteInProgress { .. } => "vote_in_progress",
            Self::NoVoteInProgress { .. } => "no_vote_in_progress",
            Self::InBedNoVoteInProgress { .. } => "in_bed_no_vote_in_progress",
            Self::InBedVotedYes => "in_bed_voted_yes",
            Self::UnknownCommand { .. } => "unknown_command",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::VoteCountdown { .. } => "vote_countdown",
            Self::FastForwarding { .. } => "fast_forwarding",
        }
    }
}

/// A boss-bar style progress indicator shown to everyone in a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBar {
    /// What the bar is reporting.
    pub title: Notice,
    /// Fill level in percent, `0..=100`.
    pub percent: u8,
}

impl ProgressBar {
    /// Build a bar from a completed/total pair, clamping to `0..=100`.
    pub fn from_ratio(title: Notice, done: u64, total: u64) -> Self {
        let percent = if total == 0 {
            100
        } else {
            let scaled = done.min(total).saturating_mul(100).checked_div(total).unwrap_or(100);
            u8::try_from(scaled).unwrap_or(100)
        };
        Self { title, percent }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_with_key_tag() {
        let notice = Notice::WrongCondition {
            vote_type: VoteType::Night,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["key"], "wrong_condition");
        assert_eq!(json["vote_type"], "night");
        assert_eq!(notice.key(), "wrong_condition");
    }

    #[test]
    fn progress_bar_clamps() {
        let title = Notice::FastForwarding {
            vote_type: VoteType::Night,
        };
        assert_eq!(ProgressBar::from_ratio(title.clone(), 50, 200).percent, 25);
        assert_eq!(ProgressBar::from_ratio(title.clone(), 500, 200).percent, 100);
        assert_eq!(ProgressBar::from_ratio(title, 0, 0).percent, 100);
    }
}
