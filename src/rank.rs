// src/rank.rs
//! Rank estimation: an exact live count inside the element's own level plus a
//! cached population figure for the levels around it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::general::prefix_sum;

/// Which cached population is added to the live in-level count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachedTerm {
    /// Population of levels `1..=L`. The live count already covers level `L`,
    /// so the element's own level is counted twice; deep elements of a busy
    /// level can rank behind the head of the next one.
    #[default]
    ThroughOwnLevel,
    /// Population of levels `1..L`, i.e. only the levels served before `L`.
    /// Keeps level-major order after every refresh.
    LevelsAhead,
}

/// Immutable cached view of level populations, replaced wholesale on refresh.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelSnapshot {
    /// Entry `i` is the number of physical records in levels `1..=i+1`.
    pub prefix: Vec<i64>,
    /// Number of successful refreshes that led to this snapshot; 0 = never refreshed.
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl LevelSnapshot {
    /// The all-zero snapshot a queue starts with.
    pub fn empty(max_level: i64) -> Self {
        Self {
            prefix: vec![0; max_level.max(0) as usize],
            generation: 0,
            refreshed_at: None,
        }
    }

    pub fn from_lengths(lengths: &[i64], generation: u64) -> Self {
        Self {
            prefix: prefix_sum(lengths),
            generation,
            refreshed_at: Some(Utc::now()),
        }
    }

    /// Population of levels `1..=level`; 0 outside the known range.
    pub fn population_through(&self, level: i64) -> i64 {
        if level < 1 {
            return 0;
        }
        self.prefix
            .get(level as usize - 1)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.prefix.last().copied().unwrap_or(0)
    }

    pub fn cached_term(&self, level: i64, term: CachedTerm) -> i64 {
        match term {
            CachedTerm::LevelsAhead => self.population_through(level - 1),
            CachedTerm::ThroughOwnLevel => self.population_through(level),
        }
    }

    /// Two snapshots describe the same populations, regardless of when they were taken.
    pub fn same_populations(&self, other: &LevelSnapshot) -> bool {
        self.prefix == other.prefix
    }
}

/// Combines the live in-level count for an element at `level` with the cached term.
pub fn estimate(live_in_level: i64, level: i64, snapshot: &LevelSnapshot, term: CachedTerm) -> i64 {
    live_in_level + snapshot.cached_term(level, term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lengths: &[i64]) -> LevelSnapshot {
        LevelSnapshot::from_lengths(lengths, 1)
    }

    #[test]
    fn levels_ahead_skips_own_level() {
        let snap = snapshot(&[5, 1, 2]);
        assert_eq!(estimate(4, 1, &snap, CachedTerm::LevelsAhead), 4);
        assert_eq!(estimate(0, 2, &snap, CachedTerm::LevelsAhead), 5);
        assert_eq!(estimate(1, 3, &snap, CachedTerm::LevelsAhead), 7);
    }

    #[test]
    fn through_own_level_includes_it() {
        let snap = snapshot(&[5, 1, 2]);
        assert_eq!(estimate(4, 1, &snap, CachedTerm::ThroughOwnLevel), 9);
        assert_eq!(estimate(0, 2, &snap, CachedTerm::ThroughOwnLevel), 6);
        assert_eq!(estimate(1, 3, &snap, CachedTerm::ThroughOwnLevel), 9);
    }

    #[test]
    fn default_term_is_inclusive() {
        assert_eq!(CachedTerm::default(), CachedTerm::ThroughOwnLevel);
    }

    #[test]
    fn empty_snapshot_contributes_nothing() {
        let snap = LevelSnapshot::empty(3);
        assert_eq!(snap.prefix, vec![0, 0, 0]);
        assert_eq!(snap.generation, 0);
        assert_eq!(estimate(2, 3, &snap, CachedTerm::ThroughOwnLevel), 2);
    }

    #[test]
    fn snapshot_serializes_for_watchers() {
        let value = serde_json::to_value(snapshot(&[1, 2])).unwrap();
        assert_eq!(value["prefix"], serde_json::json!([1, 3]));
        assert_eq!(value["generation"], 1);
        assert!(value["refreshed_at"].is_string());
    }

    #[test]
    fn out_of_range_levels_read_as_zero() {
        let snap = snapshot(&[1, 1]);
        assert_eq!(snap.population_through(0), 0);
        assert_eq!(snap.population_through(9), 0);
        assert_eq!(snap.total(), 2);
    }
}
