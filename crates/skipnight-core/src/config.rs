//! Configuration loading and typed config structures for the vote engine.
//!
//! The canonical configuration lives in `skipnight-config.yaml`. Every field
//! has a default, so a missing file or a partial file both produce a usable
//! [`SkipConfig`]. Loaded values are validated before they reach the engine.
//!
//! Configuration is a read-only input: a running vote snapshots the values
//! it needs when it starts, so a reload never alters an in-progress session.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use skipnight_types::VoteType;

use crate::clock::TICKS_PER_DAY;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "SKIPNIGHT_LOG_LEVEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level vote engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkipConfig {
    /// Per-vote-type rules.
    #[serde(default)]
    pub votes: VotesConfig,

    /// Sleep prerequisite settings.
    #[serde(default)]
    pub sleep: SleepConfig,

    /// Fast-forward animation settings.
    #[serde(default)]
    pub fast_forward: FastForwardConfig,

    /// Tick loop settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Message template overrides, keyed by notice key.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SkipConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `SKIPNIGHT_LOG_LEVEL` overrides `logging.level` when set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Return the rule for a vote type.
    pub const fn rule(&self, vote_type: VoteType) -> &VoteRule {
        match vote_type {
            VoteType::Night => &self.votes.night,
            VoteType::Day => &self.votes.day,
            VoteType::Thunder => &self.votes.thunder,
        }
    }

    /// Check every value is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for vote_type in VoteType::ALL {
            self.rule(vote_type).validate(vote_type)?;
        }
        if self.fast_forward.step_ticks == 0 {
            return Err(ConfigError::Invalid {
                reason: "fast_forward.step_ticks must be at least 1".to_owned(),
            });
        }
        if self.scheduler.check_interval_ticks == 0 {
            return Err(ConfigError::Invalid {
                reason: "scheduler.check_interval_ticks must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Rules for all vote types.
///
/// Each `votes.<type>` section only overrides the fields it names; the rest
/// keep that type's own defaults ([`VoteRule::night`] and friends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotesConfig {
    /// Night skipping.
    pub night: VoteRule,

    /// Day skipping.
    pub day: VoteRule,

    /// Thunderstorm clearing.
    pub thunder: VoteRule,
}

impl<'de> Deserialize<'de> for VotesConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawVotes::deserialize(deserializer)?;
        Ok(Self {
            night: raw.night.apply(VoteRule::night()),
            day: raw.day.apply(VoteRule::day()),
            thunder: raw.thunder.apply(VoteRule::thunder()),
        })
    }
}

/// `votes` section as written in the file.
#[derive(Debug, Deserialize)]
struct RawVotes {
    #[serde(default)]
    night: RuleOverrides,
    #[serde(default)]
    day: RuleOverrides,
    #[serde(default)]
    thunder: RuleOverrides,
}

/// One `votes.<type>` section: only the fields present in the file.
#[derive(Debug, Default, Deserialize)]
struct RuleOverrides {
    enabled: Option<bool>,
    start_time: Option<u64>,
    end_time: Option<u64>,
    target_time: Option<u64>,
    required_fraction: Option<Decimal>,
    required_count: Option<u32>,
    requires_sleep: Option<bool>,
    duration_ticks: Option<u64>,
}

impl RuleOverrides {
    fn apply(self, base: VoteRule) -> VoteRule {
        VoteRule {
            enabled: self.enabled.unwrap_or(base.enabled),
            start_time: self.start_time.unwrap_or(base.start_time),
            end_time: self.end_time.unwrap_or(base.end_time),
            target_time: self.target_time.or(base.target_time),
            required_fraction: self.required_fraction.unwrap_or(base.required_fraction),
            required_count: self.required_count.or(base.required_count),
            requires_sleep: self.requires_sleep.unwrap_or(base.requires_sleep),
            duration_ticks: self.duration_ticks.unwrap_or(base.duration_ticks),
        }
    }
}

impl Default for VotesConfig {
    fn default() -> Self {
        Self {
            night: VoteRule::night(),
            day: VoteRule::day(),
            thunder: VoteRule::thunder(),
        }
    }
}

/// Settings for a single vote type.
///
/// The window is half-open, `[start_time, end_time)`, in time-of-day ticks,
/// and wraps past midnight when `start_time > end_time`. Thunder votes
/// ignore the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRule {
    /// Whether the command is available at all.
    pub enabled: bool,

    /// First time-of-day tick inside the window.
    pub start_time: u64,

    /// First time-of-day tick after the window.
    pub end_time: u64,

    /// Time-of-day tick to fast-forward to on pass, if time moves at all.
    pub target_time: Option<u64>,

    /// Fraction of present players that must vote YES.
    pub required_fraction: Decimal,

    /// Absolute YES count that also passes the vote, if set.
    pub required_count: Option<u32>,

    /// Whether voters must satisfy the sleep prerequisite.
    pub requires_sleep: bool,

    /// Server ticks a vote stays open.
    pub duration_ticks: u64,
}

impl VoteRule {
    /// Default night rule: `[12516, 23900)`, skip to dawn.
    pub fn night() -> Self {
        Self {
            enabled: true,
            start_time: 12_516,
            end_time: 23_900,
            target_time: Some(0),
            required_fraction: default_required_fraction(),
            required_count: None,
            requires_sleep: true,
            duration_ticks: default_duration_ticks(),
        }
    }

    /// Default day rule: `[0, 12000)`, skip to early night.
    pub fn day() -> Self {
        Self {
            enabled: true,
            start_time: 0,
            end_time: 12_000,
            target_time: Some(13_000),
            required_fraction: default_required_fraction(),
            required_count: None,
            requires_sleep: false,
            duration_ticks: default_duration_ticks(),
        }
    }

    /// Default thunder rule: storm only, no time change.
    pub fn thunder() -> Self {
        Self {
            enabled: true,
            start_time: 0,
            end_time: 0,
            target_time: None,
            required_fraction: default_required_fraction(),
            required_count: None,
            requires_sleep: false,
            duration_ticks: default_duration_ticks(),
        }
    }

    fn validate(&self, vote_type: VoteType) -> Result<(), ConfigError> {
        let name = vote_type.name();
        if self.start_time >= TICKS_PER_DAY || self.end_time >= TICKS_PER_DAY {
            return Err(ConfigError::Invalid {
                reason: format!("votes.{name}: window bounds must be below {TICKS_PER_DAY}"),
            });
        }
        if self.target_time.is_some_and(|t| t >= TICKS_PER_DAY) {
            return Err(ConfigError::Invalid {
                reason: format!("votes.{name}: target_time must be below {TICKS_PER_DAY}"),
            });
        }
        if self.required_fraction <= Decimal::ZERO || self.required_fraction > Decimal::ONE {
            return Err(ConfigError::Invalid {
                reason: format!("votes.{name}: required_fraction must be in (0, 1]"),
            });
        }
        if self.required_count == Some(0) {
            return Err(ConfigError::Invalid {
                reason: format!("votes.{name}: required_count must be at least 1"),
            });
        }
        if self.duration_ticks == 0 {
            return Err(ConfigError::Invalid {
                reason: format!("votes.{name}: duration_ticks must be at least 1"),
            });
        }
        Ok(())
    }
}

/// Sleep prerequisite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SleepConfig {
    /// Ticks since last rest above which a player must physically sleep.
    #[serde(default = "default_max_time_since_rest")]
    pub max_time_since_rest: u64,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            max_time_since_rest: default_max_time_since_rest(),
        }
    }
}

/// Fast-forward animation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FastForwardConfig {
    /// World-time ticks added per server tick while fast-forwarding.
    #[serde(default = "default_step_ticks")]
    pub step_ticks: u64,
}

impl Default for FastForwardConfig {
    fn default() -> Self {
        Self {
            step_ticks: default_step_ticks(),
        }
    }
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Server ticks between timeout / condition checks of a running vote.
    #[serde(default = "default_check_interval_ticks")]
    pub check_interval_ticks: u64,

    /// Real-time milliseconds per server tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_ticks: default_check_interval_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Override the level with `SKIPNIGHT_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            self.level = level;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_required_fraction() -> Decimal {
    Decimal::new(51, 2)
}

const fn default_duration_ticks() -> u64 {
    // 60 seconds at 20 ticks per second.
    1_200
}

const fn default_max_time_since_rest() -> u64 {
    // Three in-game days.
    72_000
}

const fn default_step_ticks() -> u64 {
    100
}

const fn default_check_interval_ticks() -> u64 {
    20
}

const fn default_tick_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SkipConfig::parse("{}").unwrap();
        assert_eq!(config, SkipConfig::default());
        assert_eq!(config.votes.night.start_time, 12_516);
        assert_eq!(config.votes.night.end_time, 23_900);
        assert_eq!(config.sleep.max_time_since_rest, 72_000);
        assert_eq!(config.rule(VoteType::Night).duration_ticks, 1_200);
    }

    #[test]
    fn partial_rule_keeps_other_defaults() {
        let yaml = r#"
votes:
  night:
    start_time: 13000
    end_time: 23000
    required_fraction: "0.75"
"#;
        let config = SkipConfig::parse(yaml).unwrap();
        assert_eq!(config.votes.night.start_time, 13_000);
        assert_eq!(config.votes.night.end_time, 23_000);
        assert_eq!(config.votes.night.required_fraction, Decimal::new(75, 2));
        assert_eq!(config.votes.night.target_time, Some(0));
        assert!(config.votes.night.requires_sleep);
        assert_eq!(config.votes.night.duration_ticks, 1_200);
        assert_eq!(config.votes.day, VoteRule::day());
    }

    #[test]
    fn single_field_override_keeps_the_type_defaults() {
        let yaml = "votes:\n  night:\n    required_fraction: \"0.75\"\n";
        let config = SkipConfig::parse(yaml).unwrap();

        let mut expected = VoteRule::night();
        expected.required_fraction = Decimal::new(75, 2);
        assert_eq!(config.votes.night, expected);
        assert_eq!(config.votes.night.start_time, 12_516);
        assert_eq!(config.votes.night.end_time, 23_900);
        assert_eq!(config.votes.night.target_time, Some(0));
        assert!(config.votes.night.requires_sleep);
    }

    #[test]
    fn each_type_falls_back_to_its_own_defaults() {
        let yaml = "votes:\n  day:\n    duration_ticks: 600\n  thunder:\n    enabled: false\n";
        let config = SkipConfig::parse(yaml).unwrap();
        assert_eq!(config.votes.day.start_time, 0);
        assert_eq!(config.votes.day.end_time, 12_000);
        assert_eq!(config.votes.day.target_time, Some(13_000));
        assert_eq!(config.votes.day.duration_ticks, 600);
        assert!(!config.votes.thunder.enabled);
        assert_eq!(config.votes.thunder.target_time, None);
        assert_eq!(config.votes.night, VoteRule::night());
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let yaml = "votes:\n  day:\n    required_fraction: \"1.5\"\n";
        let result = SkipConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn window_past_midnight_is_rejected() {
        let yaml = "votes:\n  night:\n    end_time: 24000\n";
        assert!(SkipConfig::parse(yaml).is_err());
    }

    #[test]
    fn zero_step_is_rejected() {
        let yaml = "fast_forward:\n  step_ticks: 0\n";
        assert!(SkipConfig::parse(yaml).is_err());
    }

    #[test]
    fn message_overrides_are_collected() {
        let yaml = "messages:\n  must_sleep: \"Go to bed first.\"\n";
        let config = SkipConfig::parse(yaml).unwrap();
        assert_eq!(
            config.messages.get("must_sleep").map(String::as_str),
            Some("Go to bed first.")
        );
    }
}
