//! Messaging collaborator.
//!
//! The engine reports everything the players should see through the
//! [`Messenger`] trait as [`Notice`] keys and [`ProgressBar`] updates. Turning
//! those into text is the job of [`MessageCatalog`], which renders each key
//! through a `minijinja` template so server owners can reword messages in
//! config without recompiling.

use std::collections::{BTreeMap, VecDeque};

use minijinja::{Environment, Value};
use skipnight_types::{Notice, PlayerId, ProgressBar, WorldId};

/// Errors raised while preparing or rendering message templates.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// A template failed to compile or render.
    #[error("template error for {key}: {message}")]
    Template {
        /// Notice key whose template failed.
        key: String,
        /// Description of the failure.
        message: String,
    },
}

/// Output sink for engine notices.
pub trait Messenger {
    /// Deliver a chat-style notice to one player.
    fn send(&mut self, player: PlayerId, notice: Notice);

    /// Show or update the progress bar of a world.
    fn show_progress(&mut self, world: WorldId, bar: ProgressBar);

    /// Remove the progress bar of a world.
    fn clear_progress(&mut self, world: WorldId);
}

/// Default template for every notice key.
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("vote_started", "{{ initiator }} started a vote to skip the {{ vote_type }}."),
    (
        "vote_prompt",
        "Type /skip{{ vote_type }} yes or /skip{{ vote_type }} no to vote.",
    ),
    ("you_voted_yes", "You voted yes."),
    ("you_voted_no", "You voted no."),
    ("already_voted", "You already voted {{ ballot }}."),
    ("vote_passed", "Vote passed! Skipping the {{ vote_type }}..."),
    ("vote_failed", "Vote failed. The {{ vote_type }} will not be skipped."),
    ("condition_lost", "Vote cancelled: the {{ vote_type }} is already over."),
    ("must_sleep", "You haven't slept in a while. Get in a bed to vote."),
    (
        "must_sleep_new_vote",
        "You haven't slept in a while. Get in a bed to start a vote.",
    ),
    (
        "wrong_condition",
        "{% if vote_type == 'night' %}You can only vote at night.\
         {% elif vote_type == 'day' %}You can only vote during the day.\
         {% else %}You can only vote during a thunderstorm.{% endif %}",
    ),
    ("not_eligible", "You are not in a world where this vote can run."),
    (
        "vote_in_progress",
        "A vote to skip the {{ vote_type }} is already under way.",
    ),
    (
        "no_vote_in_progress",
        "There is no vote to skip the {{ vote_type }} right now.",
    ),
    (
        "in_bed_no_vote_in_progress",
        "You're in bed, but no vote is in progress. {{ needed }} more \
         {% if needed == 1 %}player needs{% else %}players need{% endif %} \
         to sleep, or type /skipnight.",
    ),
    ("in_bed_voted_yes", "You're in bed, so you voted yes."),
    ("unknown_command", "Unknown command: {{ label }}"),
    ("invalid_argument", "Expected yes or no, got \"{{ argument }}\"."),
    (
        "vote_countdown",
        "Skip the {{ vote_type }}? {{ yes }}/{{ needed }} yes, {{ seconds_left }}s left",
    ),
    ("fast_forwarding", "Skipping the {{ vote_type }}..."),
];

/// Renders notices to text.
pub struct MessageCatalog {
    env: Environment<'static>,
}

impl core::fmt::Debug for MessageCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageCatalog").finish_non_exhaustive()
    }
}

impl MessageCatalog {
    /// Build a catalog from the defaults plus `overrides` (keyed by notice key).
    ///
    /// Overrides for unknown keys are ignored with a warning.
    pub fn new(overrides: &BTreeMap<String, String>) -> Result<Self, MessageError> {
        let mut env = Environment::new();
        for (key, source) in DEFAULT_TEMPLATES {
            let source = overrides.get(*key).cloned().unwrap_or_else(|| (*source).to_owned());
            env.add_template_owned(*key, source)
                .map_err(|e| MessageError::Template {
                    key: (*key).to_owned(),
                    message: e.to_string(),
                })?;
        }
        for key in overrides.keys() {
            if !DEFAULT_TEMPLATES.iter().any(|(k, _)| k == key) {
                tracing::warn!(key = key.as_str(), "ignoring message override for unknown key");
            }
        }
        Ok(Self { env })
    }

    /// Catalog with the built-in wording.
    pub fn with_defaults() -> Result<Self, MessageError> {
        Self::new(&BTreeMap::new())
    }

    /// Render a notice to its display text.
    pub fn render(&self, notice: &Notice) -> Result<String, MessageError> {
        let key = notice.key();
        let template_error = |e: minijinja::Error| MessageError::Template {
            key: key.to_owned(),
            message: e.to_string(),
        };
        self.env
            .get_template(key)
            .map_err(template_error)?
            .render(Value::from_serialize(notice))
            .map_err(template_error)
    }
}

/// A [`Messenger`] that keeps everything in memory.
///
/// Each player has an inbox read in delivery order with
/// [`next_message`](Self::next_message); progress bars keep their latest
/// state plus a history of every update.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    inboxes: BTreeMap<PlayerId, VecDeque<Notice>>,
    bars: BTreeMap<WorldId, ProgressBar>,
    bar_history: Vec<(WorldId, Option<ProgressBar>)>,
}

impl RecordingMessenger {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            inboxes: BTreeMap::new(),
            bars: BTreeMap::new(),
            bar_history: Vec::new(),
        }
    }

    /// Pop the oldest undelivered notice for `player`.
    pub fn next_message(&mut self, player: PlayerId) -> Option<Notice> {
        self.inboxes.get_mut(&player).and_then(VecDeque::pop_front)
    }

    /// Current progress bar of `world`.
    pub fn progress(&self, world: WorldId) -> Option<&ProgressBar> {
        self.bars.get(&world)
    }

    /// Every bar update so far; `None` marks a clear.
    pub fn progress_history(&self) -> &[(WorldId, Option<ProgressBar>)] {
        &self.bar_history
    }
}

impl Messenger for RecordingMessenger {
    fn send(&mut self, player: PlayerId, notice: Notice) {
        self.inboxes.entry(player).or_default().push_back(notice);
    }

    fn show_progress(&mut self, world: WorldId, bar: ProgressBar) {
        self.bar_history.push((world, Some(bar.clone())));
        self.bars.insert(world, bar);
    }

    fn clear_progress(&mut self, world: WorldId) {
        self.bar_history.push((world, None));
        self.bars.remove(&world);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skipnight_types::{Ballot, VoteType};

    use super::*;

    #[test]
    fn wrong_condition_wording_per_type() {
        let catalog = MessageCatalog::with_defaults().unwrap();
        let night = Notice::WrongCondition {
            vote_type: VoteType::Night,
        };
        let thunder = Notice::WrongCondition {
            vote_type: VoteType::Thunder,
        };
        assert_eq!(catalog.render(&night).unwrap(), "You can only vote at night.");
        assert_eq!(
            catalog.render(&thunder).unwrap(),
            "You can only vote during a thunderstorm."
        );
    }

    #[test]
    fn every_notice_key_has_a_template() {
        let catalog = MessageCatalog::with_defaults().unwrap();
        let samples = [
            Notice::VoteStarted {
                initiator: "alice".to_owned(),
                vote_type: VoteType::Night,
            },
            Notice::VotePrompt {
                vote_type: VoteType::Day,
            },
            Notice::YouVotedYes,
            Notice::YouVotedNo,
            Notice::AlreadyVoted { ballot: Ballot::No },
            Notice::VotePassed {
                vote_type: VoteType::Night,
            },
            Notice::VoteFailed {
                vote_type: VoteType::Night,
            },
            Notice::ConditionLost {
                vote_type: VoteType::Night,
            },
            Notice::MustSleep,
            Notice::MustSleepNewVote,
            Notice::NotEligible,
            Notice::VoteInProgress {
                vote_type: VoteType::Night,
            },
            Notice::NoVoteInProgress {
                vote_type: VoteType::Night,
            },
            Notice::InBedNoVoteInProgress { needed: 2 },
            Notice::InBedVotedYes,
            Notice::UnknownCommand {
                label: "skipnoon".to_owned(),
            },
            Notice::InvalidArgument {
                argument: "maybe".to_owned(),
            },
            Notice::VoteCountdown {
                vote_type: VoteType::Night,
                yes: 1,
                needed: 2,
                seconds_left: 30,
            },
            Notice::FastForwarding {
                vote_type: VoteType::Night,
            },
        ];
        for notice in &samples {
            let text = catalog.render(notice).unwrap();
            assert!(!text.is_empty(), "{}", notice.key());
        }
    }

    #[test]
    fn fields_are_interpolated() {
        let catalog = MessageCatalog::with_defaults().unwrap();
        let text = catalog
            .render(&Notice::VoteStarted {
                initiator: "alice".to_owned(),
                vote_type: VoteType::Night,
            })
            .unwrap();
        assert_eq!(text, "alice started a vote to skip the night.");

        let text = catalog
            .render(&Notice::InBedNoVoteInProgress { needed: 1 })
            .unwrap();
        assert!(text.contains("1 more player needs to sleep"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut overrides = BTreeMap::new();
        overrides.insert("must_sleep".to_owned(), "Bed first, {{ 'friend' }}.".to_owned());
        let catalog = MessageCatalog::new(&overrides).unwrap();
        assert_eq!(catalog.render(&Notice::MustSleep).unwrap(), "Bed first, friend.");
    }

    #[test]
    fn broken_override_is_reported() {
        let mut overrides = BTreeMap::new();
        overrides.insert("must_sleep".to_owned(), "{% if %}".to_owned());
        assert!(MessageCatalog::new(&overrides).is_err());
    }

    #[test]
    fn recorder_delivers_in_order() {
        let mut m = RecordingMessenger::new();
        let p = PlayerId::new();
        m.send(p, Notice::YouVotedYes);
        m.send(p, Notice::MustSleep);
        assert_eq!(m.next_message(p), Some(Notice::YouVotedYes));
        assert_eq!(m.next_message(p), Some(Notice::MustSleep));
        assert_eq!(m.next_message(p), None);
    }
}
