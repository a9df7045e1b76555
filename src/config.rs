// src/config.rs
use std::time::Duration;

use crate::error::{QueueError, Result};
use crate::rank::CachedTerm;
use crate::utils::constants::{
    DEFAULT_BASE_KEY,
    DEFAULT_MAX_LEVEL,
    DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REGULAR_INTERVAL_MS,
    DEFAULT_THRESHOLD_COUNT,
};

#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Namespace every store key of this queue lives under.
    pub base_key: String,
    /// Number of priority levels; level 1 is served first.
    pub max_level: i64,
    /// Time trigger: the snapshot is refreshed at least this often.
    pub regular_interval: Duration,
    /// How often the drift trigger inspects the activity counters.
    pub poll_interval: Duration,
    /// Refresh early once `|pushes - pops|` exceeds this.
    pub threshold_count: u64,
    /// Cached population added by `count_before`; inclusive of the own level by default.
    pub cached_term: CachedTerm,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_key: DEFAULT_BASE_KEY.to_string(),
            max_level: DEFAULT_MAX_LEVEL,
            regular_interval: Duration::from_millis(DEFAULT_REGULAR_INTERVAL_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            threshold_count: DEFAULT_THRESHOLD_COUNT,
            cached_term: CachedTerm::default(),
        }
    }
}

impl QueueConfig {
    pub fn new(base_key: impl Into<String>, max_level: i64) -> Self {
        Self {
            base_key: base_key.into(),
            max_level,
            ..Self::default()
        }
    }

    pub fn with_regular_interval(mut self, interval: Duration) -> Self {
        self.regular_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_threshold_count(mut self, threshold: u64) -> Self {
        self.threshold_count = threshold;
        self
    }

    pub fn with_cached_term(mut self, term: CachedTerm) -> Self {
        self.cached_term = term;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_key.is_empty() {
            return Err(QueueError::InvalidConfig("base key must not be empty".into()));
        }
        if self.max_level < 1 {
            return Err(QueueError::InvalidConfig(format!(
                "max level must be at least 1, got {}",
                self.max_level
            )));
        }
        if self.regular_interval.is_zero() || self.poll_interval.is_zero() {
            return Err(QueueError::InvalidConfig(
                "refresh and poll intervals must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Checks `level` against `1..=max_level`.
    pub fn check_level(&self, level: i64) -> Result<()> {
        check_level(level, self.max_level)
    }
}

pub(crate) fn check_level(level: i64, max_level: i64) -> Result<()> {
    if level < 1 || level > max_level {
        return Err(QueueError::InvalidLevel { level, max_level });
    }
    Ok(())
}
