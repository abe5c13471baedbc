//! Host world abstraction.
//!
//! The vote engine never owns world time or weather; it reads and writes
//! them through [`WorldHost`]. A game server plugs its own worlds in here,
//! while [`SimWorlds`] is an in-memory host used by the bridge binary and
//! by tests.

use std::collections::BTreeMap;

use skipnight_types::WorldId;

use crate::clock::TICKS_PER_DAY;

/// Access to the time and weather of the host's worlds.
pub trait WorldHost {
    /// Current time-of-day of `world`, or `None` if the world is unknown.
    fn time(&self, world: WorldId) -> Option<u64>;

    /// Set the time-of-day of `world`. Unknown worlds are ignored.
    fn set_time(&mut self, world: WorldId, time: u64);

    /// Whether it is raining or thundering in `world`.
    fn is_storming(&self, world: WorldId) -> bool;

    /// Start or stop the storm in `world`.
    fn set_storm(&mut self, world: WorldId, storming: bool);

    /// Run the host's own per-tick world update (daylight cycle).
    fn advance(&mut self);
}

/// State of a single simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SimWorld {
    /// Time-of-day in `0..TICKS_PER_DAY`.
    pub time: u64,
    /// Whether a storm is active.
    pub storming: bool,
    /// Whether time advances by one each tick.
    pub daylight_cycle: bool,
}

/// In-memory [`WorldHost`].
#[derive(Debug, Clone, Default)]
pub struct SimWorlds {
    worlds: BTreeMap<WorldId, SimWorld>,
}

impl SimWorlds {
    /// Create a host with no worlds.
    pub const fn new() -> Self {
        Self {
            worlds: BTreeMap::new(),
        }
    }

    /// Register a world at the given time-of-day with a running daylight cycle.
    pub fn add_world(&mut self, world: WorldId, time: u64) {
        self.worlds.insert(
            world,
            SimWorld {
                time: time.checked_rem(TICKS_PER_DAY).unwrap_or(0),
                storming: false,
                daylight_cycle: true,
            },
        );
    }

    /// Freeze or resume the daylight cycle of a world.
    pub fn set_daylight_cycle(&mut self, world: WorldId, enabled: bool) {
        if let Some(w) = self.worlds.get_mut(&world) {
            w.daylight_cycle = enabled;
        }
    }
}

impl WorldHost for SimWorlds {
    fn time(&self, world: WorldId) -> Option<u64> {
        self.worlds.get(&world).map(|w| w.time)
    }

    fn set_time(&mut self, world: WorldId, time: u64) {
        if let Some(w) = self.worlds.get_mut(&world) {
            w.time = time.checked_rem(TICKS_PER_DAY).unwrap_or(0);
        }
    }

    fn is_storming(&self, world: WorldId) -> bool {
        self.worlds.get(&world).is_some_and(|w| w.storming)
    }

    fn set_storm(&mut self, world: WorldId, storming: bool) {
        if let Some(w) = self.worlds.get_mut(&world) {
            w.storming = storming;
        }
    }

    fn advance(&mut self) {
        for w in self.worlds.values_mut().filter(|w| w.daylight_cycle) {
            w.time = w.time.saturating_add(1).checked_rem(TICKS_PER_DAY).unwrap_or(0);
        }
    }
}
