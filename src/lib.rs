//! Lane Runner - simulation core for an endless-lane runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (course streaming, pooling, hazard resolution)
//! - `config`: Data-driven run configuration, validated at run start
//! - `scores`: Best-record persistence contract (key/value store)
//!
//! Rendering, input capture, audio, and the physics broad-phase are external
//! collaborators: they feed `ContactEvent`s in and drain `RunEvent`s out.

pub mod config;
pub mod scores;
pub mod sim;

pub use config::{ConfigError, RunConfig};
pub use sim::{ContactEvent, ContactOutcome, PowerUpKind, RunContext, RunEvent};

/// Simulation constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Track-forward axis: segments extend toward +Z
    pub const FORWARD: Vec3 = Vec3::Z;
    /// The course slides backward past the fixed viewpoint
    pub const MOVEMENT_DIR: Vec3 = Vec3::NEG_Z;

    /// Minimum start-to-end advance along the forward axis before an
    /// alignment pair is treated as degenerate
    pub const MIN_ANCHOR_ADVANCE: f32 = 0.01;

    /// Course defaults (authored segment length and pacing)
    pub const DEFAULT_SEGMENT_LENGTH: f32 = 12.88;
    pub const DEFAULT_MOVEMENT_SPEED: f32 = 8.0;
    pub const DEFAULT_DESPAWN_DISTANCE: f32 = 30.0;
    pub const DEFAULT_WINDOW_SIZE: usize = 12;
    pub const DEFAULT_POOL_SIZE: usize = 8;
}

/// Forward-axis component of a displacement (how far ahead `b` is of `a`)
#[inline]
pub fn forward_advance(a: glam::Vec3, b: glam::Vec3) -> f32 {
    (b - a).dot(consts::FORWARD)
}
