//! Tagged events consumed by the vote engine, and what they produced.
//!
//! Every input the host can deliver is one [`VoteEvent`] variant, handled by
//! a single dispatch function in the engine. Events are serde-tagged so a
//! host bridge can feed them in as JSON.

use serde::{Deserialize, Serialize};
use skipnight_types::{Ballot, PlayerId, SessionId, VoteType, WorldId};

use crate::error::VoteError;

/// An input from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VoteEvent {
    /// A player ran a `skip<type>` command.
    Command {
        /// Player who ran the command.
        player: PlayerId,
        /// Command label, e.g. `skipnight`.
        label: String,
        /// Arguments after the label.
        #[serde(default)]
        args: Vec<String>,
    },
    /// A player got into a bed.
    BedEnter {
        /// The sleeper.
        player: PlayerId,
    },
    /// A player got out of a bed.
    BedLeave {
        /// The former sleeper.
        player: PlayerId,
    },
    /// A player connected or changed world.
    Join {
        /// The player.
        player: PlayerId,
        /// Display name.
        name: String,
        /// World they are now in.
        world: WorldId,
        /// Their current time-since-rest statistic.
        #[serde(default)]
        time_since_rest: u64,
    },
    /// A player disconnected.
    Quit {
        /// The player.
        player: PlayerId,
    },
    /// The storm state of a world changed.
    WeatherChange {
        /// The world.
        world: WorldId,
        /// Whether it is now storming.
        storming: bool,
    },
}

/// A parsed `skip<type> [yes|no]` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Vote type named by the label.
    pub vote_type: VoteType,
    /// Explicit ballot, if an argument was given.
    pub ballot: Option<Ballot>,
}

impl Command {
    /// Parse a command label and its arguments.
    ///
    /// The label is a vote type's command (`skipnight`, `skipday`,
    /// `skipthunder`), matched case-insensitively. Only the first argument
    /// is considered.
    pub fn parse(label: &str, args: &[String]) -> Result<Self, VoteError> {
        let vote_type =
            VoteType::from_command(label).ok_or_else(|| VoteError::UnknownCommand {
                label: label.to_owned(),
            })?;

        let ballot = match args.first() {
            None => None,
            Some(arg) => Some(Ballot::parse(arg).ok_or_else(|| VoteError::InvalidArgument {
                argument: arg.clone(),
            })?),
        };

        Ok(Self { vote_type, ballot })
    }
}

/// What an event did, when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A vote was started.
    Started {
        /// Type of the new vote.
        vote_type: VoteType,
        /// Id of the new session.
        session: SessionId,
        /// Whether it passed immediately.
        passed: bool,
    },
    /// A ballot was recorded (or repeated).
    Voted {
        /// Type of the vote.
        vote_type: VoteType,
        /// The ballot.
        ballot: Ballot,
        /// Whether this ballot made the vote pass.
        passed: bool,
    },
    /// A bed-enter with no effect on voting.
    InBed {
        /// Sleepers in the world, including this one.
        sleeping: u32,
        /// Players present in the world.
        total: u32,
    },
    /// Everyone was asleep: the night is being skipped without a vote.
    AllAsleep,
    /// Bookkeeping only (join, quit, bed-leave, weather).
    Applied,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn parses_label_and_ballot() {
        let cmd = Command::parse("skipnight", &args(&["no"])).unwrap();
        assert_eq!(cmd.vote_type, VoteType::Night);
        assert_eq!(cmd.ballot, Some(Ballot::No));

        let cmd = Command::parse("SkipThunder", &[]).unwrap();
        assert_eq!(cmd.vote_type, VoteType::Thunder);
        assert_eq!(cmd.ballot, None);
    }

    #[test]
    fn rejects_unknown_label() {
        assert_eq!(
            Command::parse("skipnoon", &[]),
            Err(VoteError::UnknownCommand {
                label: "skipnoon".to_owned()
            })
        );
        assert!(Command::parse("sk", &[]).is_err());
        assert!(Command::parse("night", &[]).is_err());
    }

    #[test]
    fn rejects_bad_argument() {
        assert_eq!(
            Command::parse("skipday", &args(&["perhaps"])),
            Err(VoteError::InvalidArgument {
                argument: "perhaps".to_owned()
            })
        );
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let json = r#"{"event":"weather_change","world":"00000000-0000-0000-0000-000000000001","storming":true}"#;
        let event: VoteEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, VoteEvent::WeatherChange { storming: true, .. }));
    }
}
