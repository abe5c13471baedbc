//! Clock and condition oracle.
//!
//! Answers two questions for the vote engine: is the trigger condition of a
//! vote type active right now, and where should world time land when a vote
//! of that type passes. All inputs are raw host values (time-of-day ticks
//! and the storm flag); the oracle holds no world state of its own.
//!
//! # Design Principles
//!
//! - Time-of-day is always reduced modulo [`TICKS_PER_DAY`] before use.
//! - Windows are half-open and may wrap past midnight.
//! - Fast-forward only ever moves time forwards, so the distance to a
//!   target is measured forwards around the day cycle.

use skipnight_types::VoteType;

use crate::config::SkipConfig;

/// Length of one in-game day in world ticks.
pub const TICKS_PER_DAY: u64 = 24_000;

/// Read-only view over the configured vote windows.
#[derive(Debug, Clone)]
pub struct ConditionOracle {
    config: SkipConfig,
}

impl ConditionOracle {
    /// Create an oracle over a configuration snapshot.
    pub const fn new(config: SkipConfig) -> Self {
        Self { config }
    }

    /// Return the configuration snapshot in use.
    pub const fn config(&self) -> &SkipConfig {
        &self.config
    }

    /// Whether the trigger condition for `vote_type` holds.
    ///
    /// - `Night` -- inside the night window, or storming (beds work in storms).
    /// - `Day` -- inside the day window and not storming.
    /// - `Thunder` -- storming, regardless of time.
    pub fn is_condition_active(&self, current_time: u64, is_storming: bool, vote_type: VoteType) -> bool {
        let rule = self.config.rule(vote_type);
        let in_window = in_window(current_time, rule.start_time, rule.end_time);
        match vote_type {
            VoteType::Night => in_window || is_storming,
            VoteType::Day => in_window && !is_storming,
            VoteType::Thunder => is_storming,
        }
    }

    /// Time-of-day tick to fast-forward to when `vote_type` passes.
    ///
    /// `None` means the vote changes weather only.
    pub fn target_time(&self, vote_type: VoteType) -> Option<u64> {
        self.config.rule(vote_type).target_time
    }

    /// Whether passing `vote_type` clears rain and thunder.
    pub const fn clears_weather(vote_type: VoteType) -> bool {
        matches!(vote_type, VoteType::Night | VoteType::Thunder)
    }
}

/// Whether `time` lies in the half-open window `[start, end)`.
///
/// When `start > end` the window wraps past midnight. An empty window
/// (`start == end`) contains nothing.
pub fn in_window(time: u64, start: u64, end: u64) -> bool {
    let t = time_of_day(time);
    if start <= end {
        t >= start && t < end
    } else {
        t >= start || t < end
    }
}

/// Reduce an absolute world time to a time-of-day tick.
pub fn time_of_day(time: u64) -> u64 {
    time.checked_rem(TICKS_PER_DAY).unwrap_or(0)
}

/// World ticks needed to move forwards from `from` to the time-of-day `target`.
///
/// Returns 0 when already there; never goes backwards, so reaching an
/// earlier time-of-day means wrapping through midnight.
pub fn forward_distance(from: u64, target: u64) -> u64 {
    let from = time_of_day(from);
    let target = time_of_day(target);
    if target >= from {
        target.saturating_sub(from)
    } else {
        TICKS_PER_DAY.saturating_sub(from).saturating_add(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> ConditionOracle {
        ConditionOracle::new(SkipConfig::default())
    }

    #[test]
    fn night_window_bounds() {
        let o = oracle();
        assert!(!o.is_condition_active(12_515, false, VoteType::Night));
        assert!(o.is_condition_active(12_516, false, VoteType::Night));
        assert!(o.is_condition_active(13_000, false, VoteType::Night));
        assert!(o.is_condition_active(23_899, false, VoteType::Night));
        assert!(!o.is_condition_active(23_900, false, VoteType::Night));
        assert!(!o.is_condition_active(8_000, false, VoteType::Night));
    }

    #[test]
    fn every_tick_outside_night_window_is_inactive() {
        let o = oracle();
        for t in (0..12_516).chain(23_900..TICKS_PER_DAY) {
            assert!(!o.is_condition_active(t, false, VoteType::Night), "tick {t}");
        }
    }

    #[test]
    fn storm_enables_night_vote_during_day() {
        let o = oracle();
        assert!(o.is_condition_active(8_000, true, VoteType::Night));
    }

    #[test]
    fn thunder_ignores_time() {
        let o = oracle();
        assert!(o.is_condition_active(8_000, true, VoteType::Thunder));
        assert!(o.is_condition_active(18_000, true, VoteType::Thunder));
        assert!(!o.is_condition_active(18_000, false, VoteType::Thunder));
    }

    #[test]
    fn day_window_requires_clear_sky() {
        let o = oracle();
        assert!(o.is_condition_active(6_000, false, VoteType::Day));
        assert!(!o.is_condition_active(6_000, true, VoteType::Day));
        assert!(!o.is_condition_active(13_000, false, VoteType::Day));
    }

    #[test]
    fn absolute_time_is_reduced_to_time_of_day() {
        let o = oracle();
        assert!(o.is_condition_active(TICKS_PER_DAY * 3 + 13_000, false, VoteType::Night));
    }

    #[test]
    fn wrapping_window() {
        assert!(in_window(23_000, 22_000, 1_000));
        assert!(in_window(500, 22_000, 1_000));
        assert!(!in_window(1_000, 22_000, 1_000));
        assert!(!in_window(5_000, 5_000, 5_000));
    }

    #[test]
    fn forward_distance_wraps_through_midnight() {
        assert_eq!(forward_distance(13_000, 0), 11_000);
        assert_eq!(forward_distance(8_000, 0), 16_000);
        assert_eq!(forward_distance(6_000, 13_000), 7_000);
        assert_eq!(forward_distance(0, 0), 0);
    }

    #[test]
    fn night_target_is_outside_window() {
        let o = oracle();
        let target = o.target_time(VoteType::Night).unwrap_or(u64::MAX);
        assert!(!o.is_condition_active(target, false, VoteType::Night));
        assert_eq!(o.target_time(VoteType::Thunder), None);
    }
}
