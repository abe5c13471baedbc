//! Vote state machine.
//!
//! [`VoteEngine`] owns every live [`VoteSession`] (at most one per
//! `(world, vote type)`), the bed occupancy of every world, and any running
//! fast-forward. All inputs arrive through [`VoteEngine::dispatch`] or
//! [`VoteEngine::tick`], and both must be called from the tick thread; the
//! [`runner`](crate::runner) module is the hand-off point for callers on
//! other tasks.
//!
//! # Lifecycle
//!
//! ```text
//! None --start--> InProgress --tally met--------> Passed --> None (+ fast-forward)
//!                            --deadline / lost--> Failed --> None
//! ```
//!
//! A world fast-forwards at most once at a time: either because a vote
//! passed or because everyone in it went to bed.

use std::collections::BTreeMap;

use serde::Serialize;
use skipnight_types::{
    Ballot, FailureReason, Notice, PlayerId, ProgressBar, SessionId, VoteState, VoteType, WorldId,
};
use tracing::{debug, info, warn};

use crate::clock::{ConditionOracle, forward_distance, time_of_day};
use crate::config::SkipConfig;
use crate::error::VoteError;
use crate::event::{Command, Outcome, VoteEvent};
use crate::host::WorldHost;
use crate::messaging::Messenger;
use crate::registry::ParticipantRegistry;
use crate::scheduler::{Scheduler, Task};
use crate::session::{BallotChange, VoteSession};
use crate::sleep::{self, BedDecision, SleepState, SleepTracker};

/// Server ticks per real-time second.
pub const TICKS_PER_SECOND: u64 = 20;

/// A session reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// World of the vote.
    pub world: WorldId,
    /// Type of the vote.
    pub vote_type: VoteType,
    /// [`VoteState::Passed`] or [`VoteState::Failed`].
    pub state: VoteState,
    /// Set when the vote failed.
    pub reason: Option<FailureReason>,
    /// Whether the night was skipped because everyone slept, with no vote.
    pub all_asleep: bool,
    /// Server tick of the transition.
    pub tick: u64,
}

/// What happened during one tick, plus anything resolved by events since
/// the previous tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The server tick that just ran.
    pub tick: u64,
    /// Sessions that passed or failed.
    pub resolutions: Vec<Resolution>,
    /// Worlds whose skip finished (time reached target, weather cleared).
    pub skips_completed: Vec<WorldId>,
}

/// A fast-forward in progress.
#[derive(Debug, Clone, Copy)]
struct FastForward {
    vote_type: VoteType,
    target: u64,
    total: u64,
}

/// Where a ballot came from; decides the acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BallotSource {
    Command,
    Bed,
}

/// The vote engine.
#[derive(Debug)]
pub struct VoteEngine<H, M> {
    oracle: ConditionOracle,
    registry: ParticipantRegistry,
    sleep: SleepTracker,
    scheduler: Scheduler,
    sessions: BTreeMap<(WorldId, VoteType), VoteSession>,
    fast_forwards: BTreeMap<WorldId, FastForward>,
    resolutions: Vec<Resolution>,
    skips_completed: Vec<WorldId>,
    host: H,
    messenger: M,
}

impl<H: WorldHost, M: Messenger> VoteEngine<H, M> {
    /// Create an engine over a host and a messenger.
    pub fn new(config: SkipConfig, host: H, messenger: M) -> Self {
        let registry = ParticipantRegistry::new(config.sleep.max_time_since_rest);
        Self {
            oracle: ConditionOracle::new(config),
            registry,
            sleep: SleepTracker::new(),
            scheduler: Scheduler::new(),
            sessions: BTreeMap::new(),
            fast_forwards: BTreeMap::new(),
            resolutions: Vec::new(),
            skips_completed: Vec::new(),
            host,
            messenger,
        }
    }

    /// Swap in a new configuration.
    ///
    /// Running sessions keep the threshold and deadline they started with.
    pub fn reload(&mut self, config: SkipConfig) {
        self.registry
            .set_max_time_since_rest(config.sleep.max_time_since_rest);
        self.oracle = ConditionOracle::new(config);
        info!(live_sessions = self.sessions.len(), "configuration reloaded");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current server tick.
    pub const fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// The host worlds.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host worlds (tests and host bridges).
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The messenger.
    pub const fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Mutable access to the messenger.
    pub const fn messenger_mut(&mut self) -> &mut M {
        &mut self.messenger
    }

    /// The participant registry.
    pub const fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Mutable access to the participant registry.
    pub const fn registry_mut(&mut self) -> &mut ParticipantRegistry {
        &mut self.registry
    }

    /// Lifecycle state of the `(world, vote_type)` slot.
    pub fn vote_state(&self, world: WorldId, vote_type: VoteType) -> VoteState {
        self.sessions
            .get(&(world, vote_type))
            .map_or(VoteState::None, VoteSession::state)
    }

    /// The live session for `(world, vote_type)`.
    pub fn session(&self, world: WorldId, vote_type: VoteType) -> Option<&VoteSession> {
        self.sessions.get(&(world, vote_type))
    }

    /// Whether `world` is currently being fast-forwarded.
    pub fn is_fast_forwarding(&self, world: WorldId) -> bool {
        self.fast_forwards.contains_key(&world)
    }

    /// Bed occupancy of `world`.
    pub fn sleep_state(&self, world: WorldId) -> SleepState {
        self.sleep.state(world, self.registry.eligible_count(world))
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Apply one host event.
    pub fn dispatch(&mut self, event: VoteEvent) -> Result<Outcome, VoteError> {
        match event {
            VoteEvent::Command {
                player,
                label,
                args,
            } => self.handle_command(player, &label, &args),
            VoteEvent::BedEnter { player } => self.bed_enter(player),
            VoteEvent::BedLeave { player } => {
                self.bed_leave(player);
                Ok(Outcome::Applied)
            }
            VoteEvent::Join {
                player,
                name,
                world,
                time_since_rest,
            } => {
                self.join(player, name, world, time_since_rest);
                Ok(Outcome::Applied)
            }
            VoteEvent::Quit { player } => {
                self.quit(player);
                Ok(Outcome::Applied)
            }
            VoteEvent::WeatherChange { world, storming } => {
                self.weather_change(world, storming);
                Ok(Outcome::Applied)
            }
        }
    }

    /// Run a `skip<type> [yes|no]` command for `player`.
    ///
    /// Starts a vote when none is running in the player's world, otherwise
    /// casts the given ballot (YES when omitted). A rejection is also sent
    /// to the player as a notice.
    pub fn handle_command(
        &mut self,
        player: PlayerId,
        label: &str,
        args: &[String],
    ) -> Result<Outcome, VoteError> {
        let result = self.run_command(player, label, args);
        if let Err(err) = &result {
            debug!(%player, label, error = %err, "command rejected");
            self.messenger.send(player, err.notice());
        }
        result
    }

    fn run_command(
        &mut self,
        player: PlayerId,
        label: &str,
        args: &[String],
    ) -> Result<Outcome, VoteError> {
        let command = Command::parse(label, args)?;
        if !self.oracle.config().rule(command.vote_type).enabled {
            return Err(VoteError::UnknownCommand {
                label: label.to_owned(),
            });
        }
        let world = self
            .registry
            .world_of(player)
            .ok_or(VoteError::NotEligible { player })?;

        if self.sessions.contains_key(&(world, command.vote_type)) {
            let ballot = command.ballot.unwrap_or(Ballot::Yes);
            self.cast_ballot(world, command.vote_type, player, ballot)
        } else {
            self.start_vote(world, command.vote_type, player)
        }
    }

    // -----------------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------------

    /// Start a vote in `world` with `initiator` voting YES.
    ///
    /// Every precondition is checked before anything changes; on error the
    /// slot stays empty.
    pub fn start_vote(
        &mut self,
        world: WorldId,
        vote_type: VoteType,
        initiator: PlayerId,
    ) -> Result<Outcome, VoteError> {
        if self.sessions.contains_key(&(world, vote_type)) || self.is_fast_forwarding(world) {
            return Err(VoteError::VoteAlreadyInProgress { vote_type });
        }
        if !self.registry.is_present(initiator, world) {
            return Err(VoteError::NotEligible { player: initiator });
        }
        if !self.condition_active(world, vote_type) {
            return Err(VoteError::WrongCondition { vote_type });
        }
        let rule = self.oracle.config().rule(vote_type);
        self.registry
            .validate_voter(initiator, world, rule.requires_sleep, true)?;

        let now = self.scheduler.now();
        let session = VoteSession::start(world, vote_type, initiator, now, rule);
        let id = session.id();
        self.sessions.insert((world, vote_type), session);
        info!(%world, %vote_type, %initiator, tick = now, "vote started");

        let started = Notice::VoteStarted {
            initiator: self.registry.name(initiator),
            vote_type,
        };
        self.messenger.send(initiator, started.clone());
        self.messenger.send(initiator, Notice::YouVotedYes);
        for player in self.registry.eligible_players(world) {
            if player != initiator {
                self.messenger.send(player, started.clone());
                self.messenger.send(player, Notice::VotePrompt { vote_type });
            }
        }

        let interval = self.oracle.config().scheduler.check_interval_ticks;
        self.scheduler.schedule_in(
            interval,
            Task::VoteCheck {
                world,
                vote_type,
                session: id,
            },
        );

        let passed = self.retally(world, vote_type);
        if !passed {
            self.show_countdown(world, vote_type);
        }
        Ok(Outcome::Started {
            vote_type,
            session: id,
            passed,
        })
    }

    /// Cast `player`'s ballot on the running vote.
    ///
    /// Repeating a ballot leaves the tally untouched. A ballot that meets
    /// the threshold passes the vote immediately.
    pub fn cast_ballot(
        &mut self,
        world: WorldId,
        vote_type: VoteType,
        player: PlayerId,
        ballot: Ballot,
    ) -> Result<Outcome, VoteError> {
        self.record_ballot(world, vote_type, player, ballot, BallotSource::Command)
    }

    fn record_ballot(
        &mut self,
        world: WorldId,
        vote_type: VoteType,
        player: PlayerId,
        ballot: Ballot,
        source: BallotSource,
    ) -> Result<Outcome, VoteError> {
        let Some(session) = self.sessions.get_mut(&(world, vote_type)) else {
            return Err(VoteError::NoVoteInProgress { vote_type });
        };
        self.registry
            .validate_voter(player, world, session.requires_sleep(), false)?;

        let change = session.cast(player, ballot);
        debug!(%world, %vote_type, %player, ?ballot, ?change, ?source, "ballot cast");

        let ack = match (source, change, ballot) {
            (BallotSource::Bed, _, _) => Notice::InBedVotedYes,
            (BallotSource::Command, BallotChange::Unchanged, _) => Notice::AlreadyVoted { ballot },
            (BallotSource::Command, _, Ballot::Yes) => Notice::YouVotedYes,
            (BallotSource::Command, _, Ballot::No) => Notice::YouVotedNo,
        };
        self.messenger.send(player, ack);

        let passed = change != BallotChange::Unchanged && self.retally(world, vote_type);
        if !passed && change != BallotChange::Unchanged {
            self.show_countdown(world, vote_type);
        }
        Ok(Outcome::Voted {
            vote_type,
            ballot,
            passed,
        })
    }

    /// Count the session against the players present now; pass it if the
    /// threshold is met.
    fn retally(&mut self, world: WorldId, vote_type: VoteType) -> bool {
        let present = self.registry.eligible_players(world);
        let Some(tally) = self
            .sessions
            .get(&(world, vote_type))
            .map(|s| s.tally(&present))
        else {
            return false;
        };
        debug!(
            %world,
            %vote_type,
            yes = tally.yes,
            no = tally.no,
            eligible = tally.eligible,
            needed = tally.needed,
            "tally"
        );
        if !tally.passed {
            return false;
        }
        if self.is_fast_forwarding(world) && self.oracle.target_time(vote_type).is_some() {
            // Held until the running fast-forward ends; the world's time is
            // already moving.
            debug!(%world, %vote_type, "threshold met during fast-forward, holding");
            return false;
        }
        self.pass(world, vote_type);
        true
    }

    fn pass(&mut self, world: WorldId, vote_type: VoteType) {
        let Some(mut session) = self.sessions.remove(&(world, vote_type)) else {
            return;
        };
        if let Err(err) = session.transition(VoteState::Passed) {
            warn!(%world, %vote_type, error = %err, "could not pass vote");
            return;
        }
        let tick = self.scheduler.now();
        info!(
            world = %session.world(),
            vote_type = %session.vote_type(),
            initiator = %session.initiator(),
            session = %session.id(),
            tick,
            "vote passed"
        );
        self.resolutions.push(Resolution {
            world,
            vote_type,
            state: VoteState::Passed,
            reason: None,
            all_asleep: false,
            tick,
        });
        self.announce(world, &Notice::VotePassed { vote_type });
        self.begin_fast_forward(world, vote_type);
    }

    fn fail(&mut self, world: WorldId, vote_type: VoteType, reason: FailureReason) {
        let Some(mut session) = self.sessions.remove(&(world, vote_type)) else {
            return;
        };
        if let Err(err) = session.transition(VoteState::Failed) {
            warn!(%world, %vote_type, error = %err, "could not fail vote");
            return;
        }
        let tick = self.scheduler.now();
        info!(
            world = %session.world(),
            vote_type = %session.vote_type(),
            initiator = %session.initiator(),
            session = %session.id(),
            ?reason,
            tick,
            "vote failed"
        );
        self.resolutions.push(Resolution {
            world,
            vote_type,
            state: VoteState::Failed,
            reason: Some(reason),
            all_asleep: false,
            tick,
        });
        let notice = match reason {
            FailureReason::Timeout => Notice::VoteFailed { vote_type },
            FailureReason::ConditionLost => Notice::ConditionLost { vote_type },
        };
        self.announce(world, &notice);
        if !self.is_fast_forwarding(world) {
            self.messenger.clear_progress(world);
        }
    }

    /// Scheduled check of a running vote.
    ///
    /// Condition loss is checked before the deadline, so a vote whose night
    /// ended on the same tick it expired reports the lost condition.
    fn run_vote_check(&mut self, world: WorldId, vote_type: VoteType, id: SessionId) {
        let now = self.scheduler.now();
        let Some(session) = self.sessions.get(&(world, vote_type)) else {
            return;
        };
        if session.id() != id {
            return;
        }
        let expired = session.is_expired(now);
        let remaining = session.remaining_ticks(now);

        if !self.condition_active(world, vote_type) {
            self.fail(world, vote_type, FailureReason::ConditionLost);
            return;
        }
        if expired {
            self.fail(world, vote_type, FailureReason::Timeout);
            return;
        }

        self.show_countdown(world, vote_type);
        let interval = self.oracle.config().scheduler.check_interval_ticks;
        self.scheduler.schedule_in(
            remaining.min(interval),
            Task::VoteCheck {
                world,
                vote_type,
                session: id,
            },
        );
    }

    fn show_countdown(&mut self, world: WorldId, vote_type: VoteType) {
        let present = self.registry.eligible_players(world);
        let now = self.scheduler.now();
        let Some(session) = self.sessions.get(&(world, vote_type)) else {
            return;
        };
        let tally = session.tally(&present);
        let remaining = session.remaining_ticks(now);
        let duration = session
            .deadline_tick()
            .saturating_sub(session.created_at_tick());
        let title = Notice::VoteCountdown {
            vote_type,
            yes: tally.yes,
            needed: tally.needed,
            seconds_left: remaining.div_ceil(TICKS_PER_SECOND),
        };
        self.messenger
            .show_progress(world, ProgressBar::from_ratio(title, remaining, duration));
    }

    // -----------------------------------------------------------------------
    // Fast-forward
    // -----------------------------------------------------------------------

    fn begin_fast_forward(&mut self, world: WorldId, vote_type: VoteType) {
        let Some(target) = self.oracle.target_time(vote_type) else {
            self.finish_skip(world, vote_type);
            return;
        };
        if let Some(running) = self.fast_forwards.get(&world) {
            warn!(%world, %vote_type, running = %running.vote_type, "fast-forward already running");
            return;
        }
        let total = self
            .host
            .time(world)
            .map_or(0, |time| forward_distance(time, target));
        if total == 0 {
            self.finish_skip(world, vote_type);
            return;
        }

        self.fast_forwards.insert(
            world,
            FastForward {
                vote_type,
                target,
                total,
            },
        );
        info!(%world, %vote_type, target, distance = total, "fast-forward started");
        self.messenger.show_progress(
            world,
            ProgressBar::from_ratio(Notice::FastForwarding { vote_type }, 0, total),
        );
        self.scheduler
            .schedule_in(1, Task::FastForwardStep { world });
    }

    /// Move `world` one step closer to the target.
    ///
    /// The distance left is measured from the live world time on every step,
    /// so the host's own daylight cycle never carries time past the target.
    fn step_fast_forward(&mut self, world: WorldId) {
        let step = self.oracle.config().fast_forward.step_ticks;
        let Some(ff) = self.fast_forwards.get(&world).copied() else {
            return;
        };
        let Some(time) = self.host.time(world) else {
            warn!(%world, "world vanished during fast-forward");
            self.fast_forwards.remove(&world);
            self.messenger.clear_progress(world);
            return;
        };

        let remaining = forward_distance(time, ff.target);
        if remaining <= step {
            self.fast_forwards.remove(&world);
            self.host.set_time(world, ff.target);
            self.finish_skip(world, ff.vote_type);
            self.retally_world(world);
            return;
        }

        self.host.set_time(world, time_of_day(time.saturating_add(step)));
        let done = ff.total.saturating_sub(remaining.saturating_sub(step));
        self.messenger.show_progress(
            world,
            ProgressBar::from_ratio(
                Notice::FastForwarding {
                    vote_type: ff.vote_type,
                },
                done,
                ff.total,
            ),
        );
        self.scheduler
            .schedule_in(1, Task::FastForwardStep { world });
    }

    /// Apply the end of a skip. A storm-only skip finishing while another
    /// skip still moves the world's time leaves sleepers and the progress
    /// bar to that one.
    fn finish_skip(&mut self, world: WorldId, vote_type: VoteType) {
        if ConditionOracle::clears_weather(vote_type) {
            self.host.set_storm(world, false);
        }
        let woken = if self.is_fast_forwarding(world) {
            0
        } else {
            self.messenger.clear_progress(world);
            self.sleep.wake_all(world).len()
        };
        self.skips_completed.push(world);
        info!(
            %world,
            %vote_type,
            woken,
            time = ?self.host.time(world),
            "skip complete"
        );
    }

    /// Re-tally every running vote in `world`, e.g. votes held while it was
    /// fast-forwarding.
    fn retally_world(&mut self, world: WorldId) {
        let running: Vec<VoteType> = self
            .sessions
            .keys()
            .filter(|(w, _)| *w == world)
            .map(|(_, t)| *t)
            .collect();
        for vote_type in running {
            if self.condition_active(world, vote_type) {
                self.retally(world, vote_type);
            } else {
                self.fail(world, vote_type, FailureReason::ConditionLost);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sleep
    // -----------------------------------------------------------------------

    /// A player got into bed.
    ///
    /// Sleeping resets the player's rest statistic first, so the implicit
    /// YES on a running vote is never refused for sleep debt.
    pub fn bed_enter(&mut self, player: PlayerId) -> Result<Outcome, VoteError> {
        let world = self
            .registry
            .world_of(player)
            .ok_or(VoteError::NotEligible { player })?;
        self.registry.reset_rest(player);
        self.sleep.bed_enter(world, player);

        let (state, decision) = self.bed_decision(world);
        debug!(%world, %player, sleeping = state.sleeping, total = state.total, ?decision, "bed enter");

        match decision {
            BedDecision::Ballot(vote_type) => {
                self.record_ballot(world, vote_type, player, Ballot::Yes, BallotSource::Bed)
            }
            BedDecision::Silent => Ok(Outcome::InBed {
                sleeping: state.sleeping,
                total: state.total,
            }),
            BedDecision::NoVoteInProgress { needed } => {
                self.messenger
                    .send(player, Notice::InBedNoVoteInProgress { needed });
                Ok(Outcome::InBed {
                    sleeping: state.sleeping,
                    total: state.total,
                })
            }
            BedDecision::AllAsleep => {
                self.skip_all_asleep(world);
                Ok(Outcome::AllAsleep)
            }
        }
    }

    fn bed_decision(&self, world: WorldId) -> (SleepState, BedDecision) {
        let running = VoteType::ALL
            .into_iter()
            .find(|t| t.accepts_bed_ballot() && self.sessions.contains_key(&(world, *t)));
        let state = self.sleep_state(world);
        let night_active = self.oracle.config().rule(VoteType::Night).enabled
            && self.condition_active(world, VoteType::Night);
        let decision = sleep::decide(
            state,
            running,
            self.is_fast_forwarding(world),
            night_active,
        );
        (state, decision)
    }

    /// A player got out of bed. Ballots already cast stand.
    pub fn bed_leave(&mut self, player: PlayerId) {
        match self.registry.world_of(player) {
            Some(world) => {
                self.sleep.bed_leave(world, player);
            }
            None => self.sleep.remove_player(player),
        }
    }

    fn skip_all_asleep(&mut self, world: WorldId) {
        let tick = self.scheduler.now();
        info!(%world, tick, "everyone asleep, skipping the night without a vote");
        self.resolutions.push(Resolution {
            world,
            vote_type: VoteType::Night,
            state: VoteState::Passed,
            reason: None,
            all_asleep: true,
            tick,
        });
        self.announce(
            world,
            &Notice::VotePassed {
                vote_type: VoteType::Night,
            },
        );
        self.begin_fast_forward(world, VoteType::Night);
    }

    // -----------------------------------------------------------------------
    // Presence and weather
    // -----------------------------------------------------------------------

    /// A player connected or moved to `world`.
    pub fn join(&mut self, player: PlayerId, name: String, world: WorldId, time_since_rest: u64) {
        let previous = self.registry.world_of(player);
        self.registry.join(player, name, world, time_since_rest);
        if let Some(old) = previous.filter(|old| *old != world) {
            self.leave_world(player, old);
        }
        info!(%player, %world, time_since_rest, "player joined");

        let running: Vec<VoteType> = self
            .sessions
            .keys()
            .filter(|(w, _)| *w == world)
            .map(|(_, t)| *t)
            .collect();
        for vote_type in running {
            self.messenger.send(player, Notice::VotePrompt { vote_type });
        }
    }

    /// A player disconnected.
    pub fn quit(&mut self, player: PlayerId) {
        let Some(record) = self.registry.quit(player) else {
            self.sleep.remove_player(player);
            return;
        };
        info!(%player, world = %record.world, "player quit");
        self.leave_world(player, record.world);
    }

    /// Withdraw a departed player from `world` and re-tally its votes.
    /// The registry must already reflect the departure.
    fn leave_world(&mut self, player: PlayerId, world: WorldId) {
        self.sleep.remove_player(player);
        let affected: Vec<VoteType> = self
            .sessions
            .iter_mut()
            .filter(|((w, _), _)| *w == world)
            .map(|((_, t), session)| {
                session.withdraw(player);
                *t
            })
            .collect();
        for vote_type in affected {
            self.retally(world, vote_type);
        }

        // The last player awake leaving counts like the last one going to bed.
        if self.bed_decision(world).1 == BedDecision::AllAsleep {
            self.skip_all_asleep(world);
        }
    }

    /// The storm state of `world` changed. Votes whose condition no longer
    /// holds fail immediately.
    pub fn weather_change(&mut self, world: WorldId, storming: bool) {
        self.host.set_storm(world, storming);
        info!(%world, storming, "weather changed");
        let lost: Vec<VoteType> = self
            .sessions
            .keys()
            .filter(|(w, _)| *w == world)
            .map(|(_, t)| *t)
            .filter(|t| !self.condition_active(world, *t))
            .collect();
        for vote_type in lost {
            self.fail(world, vote_type, FailureReason::ConditionLost);
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one server tick: host world update, sleep debt, and every
    /// scheduled task that is due.
    pub fn tick(&mut self) -> TickSummary {
        self.host.advance();
        let tick = self.scheduler.advance();
        self.registry.advance_rest(&self.sleep.all_sleeping());

        for task in self.scheduler.take_due() {
            match task {
                Task::VoteCheck {
                    world,
                    vote_type,
                    session,
                } => self.run_vote_check(world, vote_type, session),
                Task::FastForwardStep { world } => self.step_fast_forward(world),
            }
        }

        TickSummary {
            tick,
            resolutions: std::mem::take(&mut self.resolutions),
            skips_completed: std::mem::take(&mut self.skips_completed),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn condition_active(&self, world: WorldId, vote_type: VoteType) -> bool {
        self.host.time(world).is_some_and(|time| {
            self.oracle
                .is_condition_active(time, self.host.is_storming(world), vote_type)
        })
    }

    fn announce(&mut self, world: WorldId, notice: &Notice) {
        for player in self.registry.eligible_players(world) {
            self.messenger.send(player, notice.clone());
        }
    }
}
