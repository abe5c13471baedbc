//! JSON-lines wire format of the bridge.
//!
//! Every stdin line is one [`BridgeInput`]: either a host command (tagged
//! with `"host"`) or a vote engine event (tagged with `"event"`). Every
//! stdout line is one [`OutputLine`], tagged with `"type"`.
//!
//! ```text
//! {"host":"add_world","world":"0190...","time":13000}
//! {"event":"join","player":"0190...","name":"steve","world":"0190..."}
//! {"event":"command","player":"0190...","label":"skipnight","args":["yes"]}
//! ```

use serde::{Deserialize, Serialize};
use skipnight_core::{Outcome, Resolution, VoteEvent};
use skipnight_types::{PlayerId, WorldId};

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BridgeInput {
    /// A change to the simulated worlds or the bridge itself.
    Host(HostCommand),
    /// An event for the vote engine.
    Vote(VoteEvent),
}

/// Commands that act on the host side rather than on votes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "host", rename_all = "snake_case")]
pub enum HostCommand {
    /// Create a world (or reset an existing one) at a time-of-day.
    AddWorld {
        /// The world.
        world: WorldId,
        /// Initial time-of-day.
        #[serde(default)]
        time: u64,
    },
    /// Set the time-of-day of a world, as an operator command would.
    SetTime {
        /// The world.
        world: WorldId,
        /// New time-of-day.
        time: u64,
    },
    /// Freeze or resume a world's daylight cycle.
    SetDaylightCycle {
        /// The world.
        world: WorldId,
        /// Whether time advances each tick.
        enabled: bool,
    },
    /// Re-read the configuration file.
    Reload,
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine {
    /// A rendered notice for one player.
    Message {
        /// Recipient.
        player: PlayerId,
        /// Notice key, for hosts that localise themselves.
        key: String,
        /// Rendered text.
        text: String,
    },
    /// A world's progress bar changed.
    Progress {
        /// The world.
        world: WorldId,
        /// Rendered bar title.
        title: String,
        /// Fill, 0 to 100.
        percent: u8,
    },
    /// A world's progress bar was removed.
    ProgressCleared {
        /// The world.
        world: WorldId,
    },
    /// The engine's answer to an input line.
    Reply {
        /// Input line number, starting at 1.
        seq: u64,
        /// What the event did, when accepted.
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<Outcome>,
        /// Why the event was refused.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A vote passed or failed.
    Resolution(Resolution),
    /// A world finished its skip.
    SkipCompleted {
        /// The world.
        world: WorldId,
    },
    /// An input line could not be used.
    InputError {
        /// Input line number, starting at 1.
        seq: u64,
        /// What was wrong with it.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use skipnight_types::{VoteState, VoteType};

    use super::*;

    #[test]
    fn host_commands_parse() {
        let world = WorldId::new();
        let line = format!(r#"{{"host":"add_world","world":"{world}","time":13000}}"#);
        assert_eq!(
            serde_json::from_str::<BridgeInput>(&line).unwrap(),
            BridgeInput::Host(HostCommand::AddWorld { world, time: 13_000 })
        );

        let reload: BridgeInput = serde_json::from_str(r#"{"host":"reload"}"#).unwrap();
        assert_eq!(reload, BridgeInput::Host(HostCommand::Reload));
    }

    #[test]
    fn vote_events_parse() {
        let player = PlayerId::new();
        let line = format!(r#"{{"event":"command","player":"{player}","label":"skipnight"}}"#);
        assert_eq!(
            serde_json::from_str::<BridgeInput>(&line).unwrap(),
            BridgeInput::Vote(VoteEvent::Command {
                player,
                label: String::from("skipnight"),
                args: Vec::new(),
            })
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<BridgeInput>(r#"{"event":"dance"}"#).is_err());
        assert!(serde_json::from_str::<BridgeInput>("not json").is_err());
    }

    #[test]
    fn output_is_tagged() {
        let world = WorldId::new();
        let json = serde_json::to_value(OutputLine::ProgressCleared { world }).unwrap();
        assert_eq!(json["type"], "progress_cleared");

        let resolution = Resolution {
            world,
            vote_type: VoteType::Night,
            state: VoteState::Passed,
            reason: None,
            all_asleep: false,
            tick: 40,
        };
        let json = serde_json::to_value(OutputLine::Resolution(resolution)).unwrap();
        assert_eq!(json["type"], "resolution");
        assert_eq!(json["vote_type"], "night");
        assert_eq!(json["tick"], 40);
    }

    #[test]
    fn reply_omits_empty_fields() {
        let json = serde_json::to_value(OutputLine::Reply {
            seq: 3,
            outcome: Some(Outcome::Applied),
            error: None,
        })
        .unwrap();
        assert_eq!(json["outcome"]["outcome"], "applied");
        assert!(json.get("error").is_none());
    }
}
