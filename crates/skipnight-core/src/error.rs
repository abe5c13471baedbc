//! Error types for the vote engine.
//!
//! Every [`VoteError`] is a rejected user action, never a fatal condition:
//! when one is returned the session it addressed is unchanged. Each
//! variant maps to the [`Notice`] that explains it to the player.
//!
//! Session failures (timeout, lost condition) are not errors; they are
//! reported as [`FailureReason`](skipnight_types::FailureReason) values.

use skipnight_types::{Notice, PlayerId, VoteState, VoteType};

/// A rejected vote action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// The vote's trigger condition (night window, storm) is not active.
    #[error("cannot vote to skip {vote_type}: condition not active")]
    WrongCondition {
        /// The vote type attempted.
        vote_type: VoteType,
    },

    /// The initiator has not slept recently enough to start a vote.
    #[error("player must sleep before starting a vote")]
    MustSleepNewVote,

    /// The voter has not slept recently enough to join a vote.
    #[error("player must sleep before voting")]
    MustSleep,

    /// The player is not present in the vote's world.
    #[error("player {player} is not eligible to vote here")]
    NotEligible {
        /// The rejected player.
        player: PlayerId,
    },

    /// A vote of this type is already running, or a skip is under way.
    #[error("a {vote_type} vote is already in progress")]
    VoteAlreadyInProgress {
        /// The vote type attempted.
        vote_type: VoteType,
    },

    /// A ballot was cast with no vote running.
    #[error("no {vote_type} vote is in progress")]
    NoVoteInProgress {
        /// The vote type addressed.
        vote_type: VoteType,
    },

    /// The command label does not name an enabled vote type.
    #[error("unknown command: {label}")]
    UnknownCommand {
        /// The label as typed.
        label: String,
    },

    /// The command argument is not a ballot.
    #[error("invalid argument: {argument}")]
    InvalidArgument {
        /// The argument as typed.
        argument: String,
    },
}

impl VoteError {
    /// The message shown to the player whose action was rejected.
    pub fn notice(&self) -> Notice {
        match self {
            Self::WrongCondition { vote_type } => Notice::WrongCondition {
                vote_type: *vote_type,
            },
            Self::MustSleepNewVote => Notice::MustSleepNewVote,
            Self::MustSleep => Notice::MustSleep,
            Self::NotEligible { .. } => Notice::NotEligible,
            Self::VoteAlreadyInProgress { vote_type } => Notice::VoteInProgress {
                vote_type: *vote_type,
            },
            Self::NoVoteInProgress { vote_type } => Notice::NoVoteInProgress {
                vote_type: *vote_type,
            },
            Self::UnknownCommand { label } => Notice::UnknownCommand {
                label: label.clone(),
            },
            Self::InvalidArgument { argument } => Notice::InvalidArgument {
                argument: argument.clone(),
            },
        }
    }
}

/// A session was asked to make a transition its lifecycle forbids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `from -> to` is not a forward transition.
    #[error("illegal vote state transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// State before the attempted transition.
        from: VoteState,
        /// Requested state.
        to: VoteState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_error_has_its_own_notice() {
        let player = PlayerId::new();
        assert_eq!(
            VoteError::WrongCondition {
                vote_type: VoteType::Night
            }
            .notice(),
            Notice::WrongCondition {
                vote_type: VoteType::Night
            }
        );
        assert_eq!(VoteError::MustSleep.notice(), Notice::MustSleep);
        assert_eq!(VoteError::MustSleepNewVote.notice(), Notice::MustSleepNewVote);
        assert_eq!(VoteError::NotEligible { player }.notice(), Notice::NotEligible);
    }
}
