//! Vote sessions and tally math.
//!
//! A [`VoteSession`] is one live vote for a `(world, vote type)` pair. It
//! snapshots its threshold and deadline from the configuration when it is
//! created, so later config reloads do not move the goalposts.
//!
//! Tallies are always taken against the *current* set of present players:
//! ballots from players who left are ignored, and the denominator shrinks
//! with them.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use skipnight_types::{Ballot, PlayerId, SessionId, VoteState, VoteType, WorldId};

use crate::config::VoteRule;
use crate::error::SessionError;

/// Pass threshold snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// Fraction of present players that must vote YES.
    pub fraction: Decimal,
    /// Absolute YES count that also passes, if configured.
    pub count: Option<u32>,
}

impl Threshold {
    /// YES ballots needed to pass with `eligible` players present.
    ///
    /// Never less than one, so an empty world cannot pass a vote.
    pub fn needed(&self, eligible: u32) -> u32 {
        let by_fraction = self
            .fraction
            .checked_mul(Decimal::from(eligible))
            .map(|d| d.ceil())
            .and_then(|d| d.to_u32())
            .unwrap_or(u32::MAX);
        let needed = match self.count {
            Some(count) => by_fraction.min(count),
            None => by_fraction,
        };
        needed.max(1)
    }

    /// Whether `yes` ballots pass with `eligible` players present.
    pub fn is_met(&self, yes: u32, eligible: u32) -> bool {
        eligible > 0 && yes >= self.needed(eligible)
    }
}

/// Result of counting a session's ballots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// YES ballots from present players.
    pub yes: u32,
    /// NO ballots from present players.
    pub no: u32,
    /// Players present in the world.
    pub eligible: u32,
    /// YES ballots needed to pass.
    pub needed: u32,
    /// Whether the threshold is met.
    pub passed: bool,
}

/// How a ballot changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotChange {
    /// First ballot from this player.
    Recorded,
    /// The player switched their choice.
    Changed,
    /// The player repeated their existing choice.
    Unchanged,
}

/// One live vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSession {
    id: SessionId,
    world: WorldId,
    vote_type: VoteType,
    state: VoteState,
    initiator: PlayerId,
    ballots: BTreeMap<PlayerId, Ballot>,
    created_at_tick: u64,
    deadline_tick: u64,
    threshold: Threshold,
    requires_sleep: bool,
}

impl VoteSession {
    /// Open a session with the initiator's YES ballot already recorded.
    pub fn start(
        world: WorldId,
        vote_type: VoteType,
        initiator: PlayerId,
        now: u64,
        rule: &VoteRule,
    ) -> Self {
        let mut ballots = BTreeMap::new();
        ballots.insert(initiator, Ballot::Yes);
        Self {
            id: SessionId::new(),
            world,
            vote_type,
            state: VoteState::InProgress,
            initiator,
            ballots,
            created_at_tick: now,
            deadline_tick: now.saturating_add(rule.duration_ticks),
            threshold: Threshold {
                fraction: rule.required_fraction,
                count: rule.required_count,
            },
            requires_sleep: rule.requires_sleep,
        }
    }

    /// Session identity.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// World the vote runs in.
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Type of vote.
    pub const fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> VoteState {
        self.state
    }

    /// Player who started the vote.
    pub const fn initiator(&self) -> PlayerId {
        self.initiator
    }

    /// Server tick the vote started on.
    pub const fn created_at_tick(&self) -> u64 {
        self.created_at_tick
    }

    /// Server tick at which the vote times out.
    pub const fn deadline_tick(&self) -> u64 {
        self.deadline_tick
    }

    /// Threshold snapshot.
    pub const fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Whether voters must satisfy the sleep prerequisite.
    pub const fn requires_sleep(&self) -> bool {
        self.requires_sleep
    }

    /// Ballot on record for `player`.
    pub fn ballot(&self, player: PlayerId) -> Option<Ballot> {
        self.ballots.get(&player).copied()
    }

    /// Whether the deadline has been reached at `now`.
    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.deadline_tick
    }

    /// Server ticks left before the deadline.
    pub const fn remaining_ticks(&self, now: u64) -> u64 {
        self.deadline_tick.saturating_sub(now)
    }

    /// Record or overwrite a ballot.
    pub fn cast(&mut self, player: PlayerId, ballot: Ballot) -> BallotChange {
        match self.ballots.insert(player, ballot) {
            None => BallotChange::Recorded,
            Some(prev) if prev == ballot => BallotChange::Unchanged,
            Some(_) => BallotChange::Changed,
        }
    }

    /// Drop a ballot, returning it if there was one.
    pub fn withdraw(&mut self, player: PlayerId) -> Option<Ballot> {
        self.ballots.remove(&player)
    }

    /// Count ballots from the players in `present`.
    pub fn tally(&self, present: &BTreeSet<PlayerId>) -> Tally {
        let mut yes: u32 = 0;
        let mut no: u32 = 0;
        for (player, ballot) in &self.ballots {
            if !present.contains(player) {
                continue;
            }
            match ballot {
                Ballot::Yes => yes = yes.saturating_add(1),
                Ballot::No => no = no.saturating_add(1),
            }
        }
        let eligible = u32::try_from(present.len()).unwrap_or(u32::MAX);
        Tally {
            yes,
            no,
            eligible,
            needed: self.threshold.needed(eligible),
            passed: self.threshold.is_met(yes, eligible),
        }
    }

    /// Move to `next`, enforcing the forward-only lifecycle.
    pub fn transition(&mut self, next: VoteState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(initiator: PlayerId) -> VoteSession {
        VoteSession::start(WorldId::new(), VoteType::Night, initiator, 100, &VoteRule::night())
    }

    fn present(players: &[PlayerId]) -> BTreeSet<PlayerId> {
        players.iter().copied().collect()
    }

    #[test]
    fn starts_with_initiator_yes() {
        let a = PlayerId::new();
        let s = session(a);
        assert_eq!(s.state(), VoteState::InProgress);
        assert_eq!(s.ballot(a), Some(Ballot::Yes));
        assert_eq!(s.deadline_tick(), 1_300);
        assert!(!s.is_expired(1_299));
        assert!(s.is_expired(1_300));
    }

    #[test]
    fn single_player_passes_alone() {
        let a = PlayerId::new();
        let s = session(a);
        assert!(s.tally(&present(&[a])).passed);
    }

    #[test]
    fn half_is_not_a_majority() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let s = session(a);
        let t = s.tally(&present(&[a, b]));
        assert_eq!(t.yes, 1);
        assert_eq!(t.needed, 2);
        assert!(!t.passed);
    }

    #[test]
    fn leaving_player_lowers_denominator() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let c = PlayerId::new();
        let mut s = session(a);
        s.cast(b, Ballot::Yes);
        assert!(s.tally(&present(&[a, b, c])).passed);

        s.cast(b, Ballot::No);
        assert!(!s.tally(&present(&[a, b, c])).passed);
        assert!(!s.tally(&present(&[a, c])).passed);
        assert!(s.tally(&present(&[a])).passed);
    }

    #[test]
    fn ballots_from_absent_players_are_ignored() {
        let a = PlayerId::new();
        let ghost = PlayerId::new();
        let mut s = session(a);
        s.cast(ghost, Ballot::Yes);
        let t = s.tally(&present(&[a, PlayerId::new(), PlayerId::new()]));
        assert_eq!(t.yes, 1);
    }

    #[test]
    fn repeated_ballot_is_idempotent() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        let mut s = session(a);
        assert_eq!(s.cast(b, Ballot::No), BallotChange::Recorded);
        let before = s.tally(&present(&[a, b]));
        assert_eq!(s.cast(b, Ballot::No), BallotChange::Unchanged);
        assert_eq!(s.tally(&present(&[a, b])), before);
        assert_eq!(s.cast(b, Ballot::Yes), BallotChange::Changed);
    }

    #[test]
    fn absolute_count_can_pass_early() {
        let a = PlayerId::new();
        let mut rule = VoteRule::night();
        rule.required_count = Some(2);
        let mut s = VoteSession::start(WorldId::new(), VoteType::Night, a, 0, &rule);
        let b = PlayerId::new();
        s.cast(b, Ballot::Yes);
        let others: Vec<PlayerId> = (0..8).map(|_| PlayerId::new()).collect();
        let mut everyone = present(&others);
        everyone.insert(a);
        everyone.insert(b);
        assert!(s.tally(&everyone).passed);
    }

    #[test]
    fn empty_world_never_passes() {
        let s = session(PlayerId::new());
        assert!(!s.tally(&BTreeSet::new()).passed);
    }

    #[test]
    fn transitions_are_forward_only() {
        let mut s = session(PlayerId::new());
        assert!(s.transition(VoteState::Passed).is_ok());
        assert!(s.transition(VoteState::Failed).is_err());
        assert!(s.transition(VoteState::InProgress).is_err());
        assert!(s.transition(VoteState::None).is_ok());
        assert_eq!(s.state(), VoteState::None);
    }
}
