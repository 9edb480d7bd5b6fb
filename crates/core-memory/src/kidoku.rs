use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Already-read text tracking.
///
/// Scenarios embed kidoku markers at text boundaries; recording them here
/// lets the text system classify a passage as previously read (skip-read
/// fast-forward, dimmed colour). Part of global memory: the table persists
/// across saves in the per-game global file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KidokuTable {
    seen: BTreeMap<i32, BTreeSet<i32>>,
}

impl KidokuTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_been_read(&self, scenario: i32, kidoku: i32) -> bool {
        self.seen
            .get(&scenario)
            .is_some_and(|markers| markers.contains(&kidoku))
    }

    pub fn record_kidoku(&mut self, scenario: i32, kidoku: i32) {
        self.seen.entry(scenario).or_default().insert(kidoku);
    }

    /// Number of distinct (scenario, kidoku) pairs recorded.
    pub fn len(&self) -> usize {
        self.seen.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
