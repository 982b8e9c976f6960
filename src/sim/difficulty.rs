//! Distance-driven difficulty scheduling
//!
//! A pure step function from cumulative distance traveled to a 3-way spawn
//! weight triple (obstacle, pickup A, pickup B). Weights only shift when the
//! distance crosses a configured threshold; recomputing at the same step is
//! a no-op so callers can poll every tick without log spam.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::DifficultyConfig;

/// Spawn weight triple; the three weights always sum to the configured total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnWeights {
    pub obstacle: u32,
    pub pickup_a: u32,
    pub pickup_b: u32,
}

impl SpawnWeights {
    pub fn total(&self) -> u32 {
        self.obstacle + self.pickup_a + self.pickup_b
    }
}

/// What the weighted draw selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Obstacle,
    PickupA,
    PickupB,
}

impl SpawnKind {
    /// Map to a concrete spawn type index, clamped into `[0, kind_count)`.
    pub fn spawn_type_index(self, kind_count: usize) -> usize {
        debug_assert!(kind_count > 0);
        let index = match self {
            SpawnKind::Obstacle => 0,
            SpawnKind::PickupA => 1,
            SpawnKind::PickupB => 2,
        };
        index.min(kind_count.saturating_sub(1))
    }
}

/// One threshold of the difficulty curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DifficultyStep {
    /// Cumulative distance at/above which these weights apply
    pub distance: f32,
    pub weights: SpawnWeights,
}

/// Maps cumulative distance to the current spawn weights.
pub struct DifficultyScheduler {
    base: SpawnWeights,
    steps: Vec<DifficultyStep>,
    /// 0 = base weights, i = steps[i-1] applied
    step_index: usize,
    weights: SpawnWeights,
}

impl DifficultyScheduler {
    pub fn new(cfg: &DifficultyConfig) -> Self {
        Self {
            base: cfg.base_weights,
            steps: cfg.steps.clone(),
            step_index: 0,
            weights: cfg.base_weights,
        }
    }

    /// Recompute the weights for `distance`.
    ///
    /// Idempotent: returns `true` only when the step index actually advanced
    /// (or regressed after a reset); calling again at the same distance does
    /// nothing.
    pub fn update(&mut self, distance: f32) -> bool {
        let index = self.steps.partition_point(|s| s.distance <= distance);
        if index == self.step_index {
            return false;
        }

        self.step_index = index;
        self.weights = if index == 0 {
            self.base
        } else {
            self.steps[index - 1].weights
        };
        log::info!(
            "difficulty step {} at {:.0}m: obstacle={} pickup_a={} pickup_b={}",
            index,
            distance,
            self.weights.obstacle,
            self.weights.pickup_a,
            self.weights.pickup_b
        );
        true
    }

    #[inline]
    pub fn weights(&self) -> SpawnWeights {
        self.weights
    }

    #[inline]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Weighted draw: uniform integer in `[0, total)` mapped to the three
    /// weight ranges in order.
    pub fn pick(&self, rng: &mut Pcg32) -> SpawnKind {
        let total = self.weights.total().max(1);
        let roll = rng.random_range(0..total);
        if roll < self.weights.obstacle {
            SpawnKind::Obstacle
        } else if roll < self.weights.obstacle + self.weights.pickup_a {
            SpawnKind::PickupA
        } else {
            SpawnKind::PickupB
        }
    }

    /// Back to the base step for a run restart.
    pub fn reset(&mut self) {
        self.step_index = 0;
        self.weights = self.base;
    }
}
