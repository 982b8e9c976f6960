//! Two-domain run clock
//!
//! Course movement and spawn cadence run on *simulation* time, which is
//! scaled by slow-time. Power-up expiry, invulnerability windows, and hit
//! cooldowns run on *real* time; driving those off simulation time would let
//! slow-time stretch its own duration.

/// Tracks real and simulation elapsed time for one run.
///
/// `time_scale` and `fixed_step` are the pair slow-time captures and
/// restores; mutating them mid-run only affects the simulation domain.
#[derive(Debug, Clone)]
pub struct RunClock {
    real_elapsed: f64,
    sim_elapsed: f64,
    time_scale: f32,
    fixed_step: f32,
}

impl RunClock {
    pub fn new(fixed_step: f32) -> Self {
        Self {
            real_elapsed: 0.0,
            sim_elapsed: 0.0,
            time_scale: 1.0,
            fixed_step,
        }
    }

    /// Advance both domains by one frame of wall-clock time.
    ///
    /// Returns the scaled simulation delta for this frame.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let sim_dt = real_dt * self.time_scale;
        self.real_elapsed += real_dt as f64;
        self.sim_elapsed += sim_dt as f64;
        sim_dt
    }

    /// Real seconds since run start (unaffected by slow-time)
    #[inline]
    pub fn real_now(&self) -> f64 {
        self.real_elapsed
    }

    /// Simulation seconds since run start
    #[inline]
    pub fn sim_now(&self) -> f64 {
        self.sim_elapsed
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    #[inline]
    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    pub fn set_fixed_step(&mut self, step: f32) {
        self.fixed_step = step;
    }

    /// Rewind to run start. Scale and fixed step return to their defaults;
    /// callers must restore any captured scales *before* resetting.
    pub fn reset(&mut self, fixed_step: f32) {
        self.real_elapsed = 0.0;
        self.sim_elapsed = 0.0;
        self.time_scale = 1.0;
        self.fixed_step = fixed_step;
    }
}
