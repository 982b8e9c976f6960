//! Run configuration
//!
//! Everything tunable about a run lives here, serde-serializable so a full
//! configuration can be loaded from JSON or embedded as defaults. Validation
//! happens once at run construction; the simulation assumes a valid config
//! afterward.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_DESPAWN_DISTANCE, DEFAULT_MOVEMENT_SPEED, DEFAULT_POOL_SIZE, DEFAULT_SEGMENT_LENGTH,
    DEFAULT_WINDOW_SIZE, FORWARD,
};
use crate::sim::difficulty::{DifficultyStep, SpawnWeights};

/// Configuration rejected at run construction
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no segment kinds configured")]
    NoSegmentKinds,
    #[error("segment kind '{name}' has non-positive nominal length")]
    BadNominalLength { name: String },
    #[error("streamer window size must be at least 1")]
    ZeroWindow,
    #[error("difficulty step {step} weights sum to {got}, expected {expected}")]
    BadWeightTotal { step: usize, got: u32, expected: u32 },
    #[error("difficulty step {step} threshold is not strictly increasing")]
    UnorderedThresholds { step: usize },
}

/// One authored segment kind: its connection anchors in local space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentKindConfig {
    pub name: String,
    pub start_anchor: Vec3,
    pub end_anchor: Vec3,
    /// Fallback placement length when the anchor pair is degenerate
    pub nominal_length: f32,
}

impl SegmentKindConfig {
    /// A straight piece extending `length` along the forward axis.
    pub fn straight(name: &str, length: f32) -> Self {
        Self {
            name: name.to_string(),
            start_anchor: Vec3::ZERO,
            end_anchor: FORWARD * length,
            nominal_length: length,
        }
    }
}

/// Segment pool sizing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Instances pre-created per kind at run start
    pub initial_size: usize,
    /// Whether acquire may instantiate past the warmed capacity
    pub expandable: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_POOL_SIZE,
            expandable: true,
        }
    }
}

/// Course streaming parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Active window size the streamer tops up to every tick
    pub min_active_segments: usize,
    /// How far behind the reference point a segment's end must fall before
    /// it is recycled
    pub despawn_distance: f32,
    /// Course scroll speed in units per simulation second
    pub movement_speed: f32,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            min_active_segments: DEFAULT_WINDOW_SIZE,
            despawn_distance: DEFAULT_DESPAWN_DISTANCE,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
        }
    }
}

/// Distance-keyed difficulty curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub base_weights: SpawnWeights,
    /// Thresholds in strictly increasing distance order
    pub steps: Vec<DifficultyStep>,
    /// Every weight triple must sum to this
    pub expected_total: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_weights: SpawnWeights {
                obstacle: 2,
                pickup_a: 4,
                pickup_b: 4,
            },
            steps: vec![
                DifficultyStep {
                    distance: 550.0,
                    weights: SpawnWeights {
                        obstacle: 4,
                        pickup_a: 3,
                        pickup_b: 3,
                    },
                },
                DifficultyStep {
                    distance: 1200.0,
                    weights: SpawnWeights {
                        obstacle: 6,
                        pickup_a: 2,
                        pickup_b: 2,
                    },
                },
            ],
            expected_total: 10,
        }
    }
}

/// Power-up timings and life rules
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerUpConfig {
    pub shield_duration: f32,
    pub slow_time_duration: f32,
    /// Multiplier applied to the clock's time scale while slow-time is active
    pub slow_time_scale: f32,
    pub starting_extra_lives: u32,
    pub max_extra_lives: u32,
    /// The shield pickup also grants one extra life (authored content does
    /// both from the one collectible)
    pub shield_grants_life: bool,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            shield_duration: 5.0,
            slow_time_duration: 5.0,
            slow_time_scale: 0.5,
            starting_extra_lives: 1,
            max_extra_lives: 99,
            shield_grants_life: true,
        }
    }
}

/// Hazard classification and contact resolution tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Tags that mark a contact as hazardous
    pub hazard_tags: Vec<String>,
    /// Bitmask over contact layers; 0 disables layer-based classification
    pub hazard_layer_mask: u32,
    /// Case-insensitive substrings of contact names treated as hazards
    pub name_hints: Vec<String>,
    /// Debug switch: every contact resolves as a hazard
    pub treat_everything_as_hazard: bool,
    /// Real seconds during which repeat contacts with the same object are
    /// suppressed
    pub per_object_hit_cooldown: f32,
    /// Real seconds of immunity granted after an extra life is consumed;
    /// 0 disables the window
    pub invulnerability_window: f32,
    /// When true, an active shield resolves the contact even while the
    /// per-object cooldown would suppress it
    pub shield_bypasses_cooldown: bool,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            hazard_tags: vec!["Obstacle".to_string(), "RedSphere".to_string()],
            hazard_layer_mask: 0,
            name_hints: vec!["sphere".to_string()],
            treat_everything_as_hazard: false,
            per_object_hit_cooldown: 1.0,
            invulnerability_window: 0.0,
            shield_bypasses_cooldown: true,
        }
    }
}

/// Timer-driven track entity spawner
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Simulation seconds between spawn attempts
    pub spawn_interval: f32,
    /// Live entity cap; the timer still runs while at the cap
    pub max_active: usize,
    /// Base forward distance ahead of the reference point for new entities
    pub spawn_ahead: f32,
    /// Uniform jitter added to the spawn-ahead distance
    pub spawn_ahead_jitter: f32,
    /// Half-width of the lateral placement band
    pub lane_half_width: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 2.0,
            max_active: 10,
            spawn_ahead: 10.0,
            spawn_ahead_jitter: 2.0,
            lane_half_width: 0.5,
        }
    }
}

/// Complete per-run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub segment_kinds: Vec<SegmentKindConfig>,
    pub pool: PoolConfig,
    pub streamer: StreamerConfig,
    pub difficulty: DifficultyConfig,
    pub power_ups: PowerUpConfig,
    pub hazards: HazardConfig,
    pub spawner: SpawnerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            segment_kinds: vec![
                SegmentKindConfig::straight("flat", DEFAULT_SEGMENT_LENGTH),
                SegmentKindConfig::straight("ramp", DEFAULT_SEGMENT_LENGTH),
                SegmentKindConfig::straight("rail", DEFAULT_SEGMENT_LENGTH),
            ],
            pool: PoolConfig::default(),
            streamer: StreamerConfig::default(),
            difficulty: DifficultyConfig::default(),
            power_ups: PowerUpConfig::default(),
            hazards: HazardConfig::default(),
            spawner: SpawnerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validate cross-field invariants once before the run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_kinds.is_empty() {
            return Err(ConfigError::NoSegmentKinds);
        }
        for kind in &self.segment_kinds {
            if !(kind.nominal_length > 0.0) {
                return Err(ConfigError::BadNominalLength {
                    name: kind.name.clone(),
                });
            }
        }
        if self.streamer.min_active_segments == 0 {
            return Err(ConfigError::ZeroWindow);
        }

        let expected = self.difficulty.expected_total;
        if self.difficulty.base_weights.total() != expected {
            return Err(ConfigError::BadWeightTotal {
                step: 0,
                got: self.difficulty.base_weights.total(),
                expected,
            });
        }
        let mut last_distance = f32::NEG_INFINITY;
        for (i, step) in self.difficulty.steps.iter().enumerate() {
            if step.weights.total() != expected {
                return Err(ConfigError::BadWeightTotal {
                    step: i + 1,
                    got: step.weights.total(),
                    expected,
                });
            }
            if step.distance <= last_distance {
                return Err(ConfigError::UnorderedThresholds { step: i + 1 });
            }
            last_distance = step.distance;
        }

        Ok(())
    }
}
