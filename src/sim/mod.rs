//! Deterministic run simulation
//!
//! Everything in this module is platform-free: no wall clock, no I/O, no
//! rendering. Time arrives as explicit frame deltas, randomness comes from a
//! seeded generator, and iteration orders are stable, so the same seed and
//! the same input sequence always produce the same run.

pub mod clock;
pub mod difficulty;
pub mod hazard;
pub mod pool;
pub mod segment;
pub mod spawner;
pub mod status;
pub mod streamer;
pub mod tick;

pub use clock::RunClock;
pub use difficulty::{DifficultyScheduler, DifficultyStep, SpawnKind, SpawnWeights};
pub use hazard::{ContactEvent, ContactKind, ContactOutcome, HazardId, HazardResolver, ShapeHint};
pub use pool::{PoolError, SegmentHandle, SegmentPool};
pub use segment::{AnchorPair, Segment, SegmentId};
pub use spawner::{EntityKind, TrackEntity, TrackSpawner};
pub use status::{PlayerStatus, PowerUpKind};
pub use streamer::CourseStreamer;
pub use tick::{RunContext, RunEvent, RunSummary};
