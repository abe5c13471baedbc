//! Participant registry.
//!
//! Tracks which players are present in which world and how long each has
//! gone without resting. Ballot eligibility is always derived from the live
//! registry, so a player leaving a world immediately drops out of every
//! vote denominator there.

use std::collections::{BTreeMap, BTreeSet};

use skipnight_types::{PlayerId, WorldId};

use crate::error::VoteError;

/// What the registry knows about one connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Display name used in messages.
    pub name: String,
    /// World the player is currently in.
    pub world: WorldId,
    /// Ticks since the player last slept (vanilla `TIME_SINCE_REST`).
    pub time_since_rest: u64,
}

/// Registry of connected players.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    players: BTreeMap<PlayerId, PlayerRecord>,
    max_time_since_rest: u64,
}

impl ParticipantRegistry {
    /// Create an empty registry with the given sleep-debt limit.
    pub const fn new(max_time_since_rest: u64) -> Self {
        Self {
            players: BTreeMap::new(),
            max_time_since_rest,
        }
    }

    /// Change the sleep-debt limit (config reload).
    pub const fn set_max_time_since_rest(&mut self, ticks: u64) {
        self.max_time_since_rest = ticks;
    }

    /// Record a player joining (or moving into) `world`.
    ///
    /// Re-joining replaces the previous record.
    pub fn join(&mut self, player: PlayerId, name: String, world: WorldId, time_since_rest: u64) {
        self.players.insert(
            player,
            PlayerRecord {
                name,
                world,
                time_since_rest,
            },
        );
    }

    /// Remove a player, returning their last record.
    pub fn quit(&mut self, player: PlayerId) -> Option<PlayerRecord> {
        self.players.remove(&player)
    }

    /// Look up a player.
    pub fn get(&self, player: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&player)
    }

    /// Display name of a player, falling back to their id.
    pub fn name(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .map_or_else(|| player.to_string(), |p| p.name.clone())
    }

    /// World a player is currently in.
    pub fn world_of(&self, player: PlayerId) -> Option<WorldId> {
        self.players.get(&player).map(|p| p.world)
    }

    /// Players currently present in `world`.
    pub fn eligible_players(&self, world: WorldId) -> BTreeSet<PlayerId> {
        self.players
            .iter()
            .filter(|(_, p)| p.world == world)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of players currently present in `world`.
    pub fn eligible_count(&self, world: WorldId) -> u32 {
        let count = self.players.values().filter(|p| p.world == world).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Whether `player` is present in `world`.
    pub fn is_present(&self, player: PlayerId, world: WorldId) -> bool {
        self.world_of(player) == Some(world)
    }

    /// Whether `player` has rested recently enough to vote without sleeping.
    ///
    /// Unknown players never meet the prerequisite.
    pub fn sleep_prerequisite_met(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.time_since_rest <= self.max_time_since_rest)
    }

    /// Set a player's time-since-rest statistic.
    pub fn set_time_since_rest(&mut self, player: PlayerId, ticks: u64) {
        if let Some(p) = self.players.get_mut(&player) {
            p.time_since_rest = ticks;
        }
    }

    /// Reset a player's time-since-rest after they sleep.
    pub fn reset_rest(&mut self, player: PlayerId) {
        self.set_time_since_rest(player, 0);
    }

    /// Accumulate one tick of sleep debt for every awake player.
    pub fn advance_rest(&mut self, sleeping: &BTreeSet<PlayerId>) {
        for (id, p) in &mut self.players {
            if !sleeping.contains(id) {
                p.time_since_rest = p.time_since_rest.saturating_add(1);
            }
        }
    }

    /// Check that `player` may take part in a vote in `world`.
    ///
    /// `new_vote` selects which must-sleep rejection applies.
    pub fn validate_voter(
        &self,
        player: PlayerId,
        world: WorldId,
        requires_sleep: bool,
        new_vote: bool,
    ) -> Result<(), VoteError> {
        if !self.is_present(player, world) {
            return Err(VoteError::NotEligible { player });
        }
        if requires_sleep && !self.sleep_prerequisite_met(player) {
            return Err(if new_vote {
                VoteError::MustSleepNewVote
            } else {
                VoteError::MustSleep
            });
        }
        Ok(())
    }
}
