//! Sleep tracking.
//!
//! Keeps the set of players currently in bed per world and decides what a
//! bed-enter means for voting. Anyone present in a world can sleep; whether
//! they may *vote* is a separate question answered by the registry.
//!
//! # Bed-enter decisions
//!
//! | Situation                                   | Result                  |
//! |---------------------------------------------|-------------------------|
//! | a bed-accepting vote is running             | implicit YES ballot     |
//! | the world is already fast-forwarding        | nothing                 |
//! | one player in the world                     | nothing                 |
//! | everyone asleep (2+) and night condition on | skip without a vote     |
//! | otherwise                                   | "N more needed" notice  |

use std::collections::{BTreeMap, BTreeSet};

use skipnight_types::{PlayerId, VoteType, WorldId};

/// Snapshot of bed occupancy in one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepState {
    /// Players currently in bed.
    pub sleeping: u32,
    /// Players present in the world.
    pub total: u32,
}

impl SleepState {
    /// Whether every present player is in bed.
    pub const fn everyone_asleep(&self) -> bool {
        self.total > 0 && self.sleeping >= self.total
    }

    /// Players still awake.
    pub const fn needed(&self) -> u32 {
        self.total.saturating_sub(self.sleeping)
    }
}

/// What a bed-enter should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedDecision {
    /// Cast an implicit YES on the running vote of this type.
    Ballot(VoteType),
    /// No message, no side effect.
    Silent,
    /// Tell the sleeper nobody has started a vote.
    NoVoteInProgress {
        /// Players still awake.
        needed: u32,
    },
    /// Everyone is asleep: skip the night without a vote.
    AllAsleep,
}

/// Per-world bed occupancy.
#[derive(Debug, Clone, Default)]
pub struct SleepTracker {
    beds: BTreeMap<WorldId, BTreeSet<PlayerId>>,
}

impl SleepTracker {
    /// Create a tracker with nobody asleep.
    pub const fn new() -> Self {
        Self {
            beds: BTreeMap::new(),
        }
    }

    /// Mark `player` as in bed in `world`. Returns `false` if already there.
    pub fn bed_enter(&mut self, world: WorldId, player: PlayerId) -> bool {
        self.beds.entry(world).or_default().insert(player)
    }

    /// Mark `player` as out of bed in `world`. Returns `false` if not in bed.
    pub fn bed_leave(&mut self, world: WorldId, player: PlayerId) -> bool {
        let Some(set) = self.beds.get_mut(&world) else {
            return false;
        };
        let removed = set.remove(&player);
        if set.is_empty() {
            self.beds.remove(&world);
        }
        removed
    }

    /// Forget `player` in every world (quit or world change).
    pub fn remove_player(&mut self, player: PlayerId) {
        self.beds.retain(|_, set| {
            set.remove(&player);
            !set.is_empty()
        });
    }

    /// Wake everyone in `world`.
    pub fn wake_all(&mut self, world: WorldId) -> BTreeSet<PlayerId> {
        self.beds.remove(&world).unwrap_or_default()
    }

    /// Whether `player` is in bed anywhere.
    pub fn is_sleeping(&self, player: PlayerId) -> bool {
        self.beds.values().any(|set| set.contains(&player))
    }

    /// Players in bed in any world.
    pub fn all_sleeping(&self) -> BTreeSet<PlayerId> {
        self.beds.values().flatten().copied().collect()
    }

    /// Number of sleepers in `world`.
    pub fn sleeping_count(&self, world: WorldId) -> u32 {
        let count = self.beds.get(&world).map_or(0, BTreeSet::len);
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Occupancy of `world` given `total` present players.
    pub fn state(&self, world: WorldId, total: u32) -> SleepState {
        SleepState {
            sleeping: self.sleeping_count(world),
            total,
        }
    }
}

/// Decide what a bed-enter means.
///
/// `running` is the bed-accepting vote type currently in progress in the
/// sleeper's world, if any. `state` must already include the sleeper.
pub const fn decide(
    state: SleepState,
    running: Option<VoteType>,
    fast_forwarding: bool,
    night_active: bool,
) -> BedDecision {
    if let Some(vote_type) = running {
        return BedDecision::Ballot(vote_type);
    }
    if fast_forwarding || state.total <= 1 {
        return BedDecision::Silent;
    }
    if state.everyone_asleep() {
        if night_active {
            return BedDecision::AllAsleep;
        }
        return BedDecision::Silent;
    }
    BedDecision::NoVoteInProgress {
        needed: state.needed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_sleeper_is_silent() {
        let state = SleepState {
            sleeping: 1,
            total: 1,
        };
        assert_eq!(decide(state, None, false, true), BedDecision::Silent);
    }

    #[test]
    fn first_of_two_gets_notice() {
        let state = SleepState {
            sleeping: 1,
            total: 2,
        };
        assert_eq!(
            decide(state, None, false, true),
            BedDecision::NoVoteInProgress { needed: 1 }
        );
    }

    #[test]
    fn everyone_asleep_skips_the_night() {
        let state = SleepState {
            sleeping: 3,
            total: 3,
        };
        assert_eq!(decide(state, None, false, true), BedDecision::AllAsleep);
        assert_eq!(decide(state, None, true, true), BedDecision::Silent);
        assert_eq!(decide(state, None, false, false), BedDecision::Silent);
    }

    #[test]
    fn running_vote_takes_a_ballot() {
        let state = SleepState {
            sleeping: 1,
            total: 1,
        };
        assert_eq!(
            decide(state, Some(VoteType::Night), false, true),
            BedDecision::Ballot(VoteType::Night)
        );
    }

    #[test]
    fn tracker_counts_per_world() {
        let mut tracker = SleepTracker::new();
        let w1 = WorldId::new();
        let w2 = WorldId::new();
        let a = PlayerId::new();
        let b = PlayerId::new();

        assert!(tracker.bed_enter(w1, a));
        assert!(!tracker.bed_enter(w1, a));
        assert!(tracker.bed_enter(w2, b));
        assert_eq!(tracker.sleeping_count(w1), 1);
        assert_eq!(tracker.all_sleeping().len(), 2);

        assert!(tracker.bed_leave(w1, a));
        assert!(!tracker.bed_leave(w1, a));
        assert_eq!(tracker.sleeping_count(w1), 0);

        tracker.remove_player(b);
        assert!(!tracker.is_sleeping(b));
    }

    #[test]
    fn wake_all_empties_world() {
        let mut tracker = SleepTracker::new();
        let w = WorldId::new();
        let a = PlayerId::new();
        tracker.bed_enter(w, a);
        assert_eq!(tracker.wake_all(w).len(), 1);
        assert_eq!(tracker.state(w, 1).sleeping, 0);
    }
}
