//! Best-record persistence contract
//!
//! The run core only needs a key/value store with `get(key, default)` and
//! `set(key, value)`; where the values actually live (platform prefs, a
//! file, the browser) is the embedder's business. `MemoryScoreStore` is the
//! in-process implementation used by the demo binary and tests, with JSON
//! import/export so an embedder can persist it however it likes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of ranked best scores retained
pub const BEST_SCORE_SLOTS: usize = 3;
/// Key for the single best-distance record
pub const BEST_DISTANCE_KEY: &str = "best_distance";

/// Minimal persistence contract for best records.
pub trait ScoreStore {
    fn get(&self, key: &str, default: i64) -> i64;
    fn set(&mut self, key: &str, value: i64);
}

/// In-memory store, JSON round-trippable
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryScoreStore {
    values: HashMap<String, i64>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }
}

fn score_key(rank: usize) -> String {
    format!("best_score_{rank}")
}

/// Insert `score` into the ranked best list if it qualifies, shifting lower
/// ranks down. Returns the 1-based rank it earned, or `None`.
pub fn record_best_score(store: &mut impl ScoreStore, score: i64) -> Option<usize> {
    let bests: Vec<i64> = (1..=BEST_SCORE_SLOTS)
        .map(|rank| store.get(&score_key(rank), 0))
        .collect();

    let rank = bests.iter().position(|&best| score > best)?;

    // Shift everything at and below the earned rank down one slot
    for i in (rank + 1..BEST_SCORE_SLOTS).rev() {
        store.set(&score_key(i + 1), bests[i - 1]);
    }
    store.set(&score_key(rank + 1), score);
    log::info!("new best score {score} at rank {}", rank + 1);
    Some(rank + 1)
}

/// Record a new best distance if `distance` beats the stored record.
pub fn record_best_distance(store: &mut impl ScoreStore, distance: i64) -> bool {
    if distance <= store.get(BEST_DISTANCE_KEY, 0) {
        return false;
    }
    store.set(BEST_DISTANCE_KEY, distance);
    log::info!("new best distance {distance}");
    true
}
