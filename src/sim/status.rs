//! Player status: extra lives, shield, slow-time, invulnerability
//!
//! Each capability is an independent little state machine with an explicit
//! `expires_at` timestamp on the *real* clock, polled once per tick. No
//! suspended timers; everything is cancellable by a run reset.

use crate::config::PowerUpConfig;

use super::clock::RunClock;

/// Power-up kinds delivered by the pickup collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    Shield,
    SlowTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ShieldState {
    Inactive,
    Active { expires_at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SlowTimeState {
    Inactive,
    Active {
        expires_at: f64,
        /// Captured scales restored exactly on expiry; never a hardcoded 1.0,
        /// so stacking with other time-scale effects stays correct.
        saved_time_scale: f32,
        saved_fixed_step: f32,
    },
}

/// Per-run player protections, mutated through this API only.
pub struct PlayerStatus {
    extra_lives: u32,
    max_extra_lives: u32,
    shield: ShieldState,
    slow_time: SlowTimeState,
    invulnerable_until: Option<f64>,
    /// Polled change flag for the UI collaborator, consumed once per tick
    lives_changed: Option<u32>,
}

impl PlayerStatus {
    pub fn new(cfg: &PowerUpConfig) -> Self {
        Self {
            extra_lives: cfg.starting_extra_lives.min(cfg.max_extra_lives),
            max_extra_lives: cfg.max_extra_lives,
            shield: ShieldState::Inactive,
            slow_time: SlowTimeState::Inactive,
            invulnerable_until: None,
            lives_changed: None,
        }
    }

    #[inline]
    pub fn extra_lives(&self) -> u32 {
        self.extra_lives
    }

    #[inline]
    pub fn shield_active(&self) -> bool {
        matches!(self.shield, ShieldState::Active { .. })
    }

    #[inline]
    pub fn slow_time_active(&self) -> bool {
        matches!(self.slow_time, SlowTimeState::Active { .. })
    }

    pub fn invulnerable(&self, now_real: f64) -> bool {
        self.invulnerable_until.is_some_and(|until| now_real < until)
    }

    pub fn set_invulnerable_until(&mut self, until_real: f64) {
        self.invulnerable_until = Some(until_real);
    }

    /// Grant extra lives, clamped to the configured maximum.
    pub fn add_extra_life(&mut self, amount: u32) {
        let old = self.extra_lives;
        self.extra_lives = (self.extra_lives + amount).min(self.max_extra_lives);
        if self.extra_lives != old {
            log::info!("extra lives: {} -> {}", old, self.extra_lives);
            self.lives_changed = Some(self.extra_lives);
        }
    }

    /// Decrement the life counter; returns true iff a life was consumed.
    pub fn consume_extra_life(&mut self) -> bool {
        if self.extra_lives == 0 {
            return false;
        }
        self.extra_lives -= 1;
        log::info!("extra life consumed, {} remaining", self.extra_lives);
        self.lives_changed = Some(self.extra_lives);
        true
    }

    /// Force the shield Active -> Inactive ahead of its timer.
    ///
    /// Returns true iff a shield was actually consumed; false means the
    /// caller must fall through to its next resolution rule.
    pub fn consume_shield(&mut self) -> bool {
        if !self.shield_active() {
            return false;
        }
        self.shield = ShieldState::Inactive;
        log::info!("shield consumed");
        true
    }

    /// Route a pickup to the right capability.
    ///
    /// The shield pickup is dual-purpose in the authored content: it also
    /// grants one extra life when `shield_grants_life` is set.
    pub fn activate_power_up(
        &mut self,
        kind: PowerUpKind,
        cfg: &PowerUpConfig,
        now_real: f64,
        clock: &mut RunClock,
    ) {
        match kind {
            PowerUpKind::Shield => {
                if cfg.shield_grants_life {
                    self.add_extra_life(1);
                }
                self.activate_shield(cfg.shield_duration, now_real);
            }
            PowerUpKind::SlowTime => {
                self.activate_slow_time(cfg.slow_time_duration, cfg.slow_time_scale, now_real, clock);
            }
        }
    }

    /// Start the shield timer. Activating while already active is a no-op:
    /// the duration neither resets nor stacks.
    pub fn activate_shield(&mut self, duration: f32, now_real: f64) {
        if self.shield_active() {
            log::debug!("shield already active, ignoring activation");
            return;
        }
        self.shield = ShieldState::Active {
            expires_at: now_real + duration as f64,
        };
        log::info!("shield active for {duration:.1}s");
    }

    /// Start slow-time: capture the clock's current scales, apply the
    /// reduced multiplier to both, and arm a *real-time* expiry. No-op while
    /// already active.
    pub fn activate_slow_time(
        &mut self,
        duration: f32,
        scale: f32,
        now_real: f64,
        clock: &mut RunClock,
    ) {
        if self.slow_time_active() {
            log::debug!("slow-time already active, ignoring activation");
            return;
        }

        let saved_time_scale = clock.time_scale();
        let saved_fixed_step = clock.fixed_step();
        clock.set_time_scale(saved_time_scale * scale);
        clock.set_fixed_step(saved_fixed_step * scale);

        self.slow_time = SlowTimeState::Active {
            expires_at: now_real + duration as f64,
            saved_time_scale,
            saved_fixed_step,
        };
        log::info!("slow-time active for {duration:.1}s at x{scale:.2}");
    }

    /// Poll-based expiry, called once per tick with the real clock.
    pub fn tick(&mut self, now_real: f64, clock: &mut RunClock) {
        if let ShieldState::Active { expires_at } = self.shield
            && now_real >= expires_at
        {
            self.shield = ShieldState::Inactive;
            log::info!("shield expired");
        }

        if let SlowTimeState::Active {
            expires_at,
            saved_time_scale,
            saved_fixed_step,
        } = self.slow_time
            && now_real >= expires_at
        {
            clock.set_time_scale(saved_time_scale);
            clock.set_fixed_step(saved_fixed_step);
            self.slow_time = SlowTimeState::Inactive;
            log::info!("slow-time expired, time scale restored to {saved_time_scale}");
        }

        if let Some(until) = self.invulnerable_until
            && now_real >= until
        {
            self.invulnerable_until = None;
        }
    }

    /// One-shot life-change notification for observers (UI), drained per tick.
    pub fn take_lives_changed(&mut self) -> Option<u32> {
        self.lives_changed.take()
    }

    /// Run restart: cancel timers and restore any captured time scales.
    pub fn reset(&mut self, cfg: &PowerUpConfig, clock: &mut RunClock) {
        if let SlowTimeState::Active {
            saved_time_scale,
            saved_fixed_step,
            ..
        } = self.slow_time
        {
            clock.set_time_scale(saved_time_scale);
            clock.set_fixed_step(saved_fixed_step);
        }
        *self = Self::new(cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn cfg() -> PowerUpConfig {
        PowerUpConfig::default()
    }

    #[test]
    fn test_lives_clamped_to_max() {
        let mut status = PlayerStatus::new(&cfg());
        assert_eq!(status.extra_lives(), 1);

        status.add_extra_life(1000);
        assert_eq!(status.extra_lives(), cfg().max_extra_lives);
    }

    #[test]
    fn test_consume_extra_life_only_when_available() {
        let mut status = PlayerStatus::new(&cfg());
        assert!(status.consume_extra_life());
        assert_eq!(status.extra_lives(), 0);
        assert!(!status.consume_extra_life());
    }

    #[test]
    fn test_lives_changed_polled_once() {
        let mut status = PlayerStatus::new(&cfg());
        status.add_extra_life(1);
        assert_eq!(status.take_lives_changed(), Some(2));
        assert_eq!(status.take_lives_changed(), None);
    }

    #[test]
    fn test_shield_activation_does_not_stack() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.activate_shield(5.0, 0.0);
        // Re-activating at t=4 must not extend the original expiry
        status.activate_shield(5.0, 4.0);

        status.tick(5.5, &mut clock);
        assert!(!status.shield_active());
    }

    #[test]
    fn test_consume_shield_is_immediate() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.activate_shield(5.0, 0.0);
        assert!(status.consume_shield());
        assert!(!status.shield_active());
        assert!(!status.consume_shield());

        status.tick(10.0, &mut clock);
        assert!(!status.shield_active());
    }

    #[test]
    fn test_slow_time_restores_exact_captured_scales() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        // Some other effect already halved the time scale
        clock.set_time_scale(0.5);
        let original_step = clock.fixed_step();

        status.activate_slow_time(5.0, 0.5, 0.0, &mut clock);
        assert!((clock.time_scale() - 0.25).abs() < 1e-6);

        // 4.9 real seconds in: still active (real time, not scaled time)
        status.tick(4.9, &mut clock);
        assert!(status.slow_time_active());

        status.tick(5.0, &mut clock);
        assert!(!status.slow_time_active());
        assert_eq!(clock.time_scale(), 0.5);
        assert_eq!(clock.fixed_step(), original_step);
    }

    #[test]
    fn test_slow_time_activation_does_not_stack() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.activate_slow_time(5.0, 0.5, 0.0, &mut clock);
        let scaled = clock.time_scale();
        // Second activation while active must not compound the scale
        status.activate_slow_time(5.0, 0.5, 1.0, &mut clock);
        assert_eq!(clock.time_scale(), scaled);

        status.tick(5.0, &mut clock);
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_shield_pickup_bundles_extra_life() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.activate_power_up(PowerUpKind::Shield, &cfg(), 0.0, &mut clock);
        assert!(status.shield_active());
        assert_eq!(status.extra_lives(), 2);
    }

    #[test]
    fn test_invulnerability_window_expires() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.set_invulnerable_until(2.0);
        assert!(status.invulnerable(1.0));
        assert!(!status.invulnerable(2.0));

        status.tick(3.0, &mut clock);
        assert!(!status.invulnerable(1.0)); // cleared entirely
    }

    #[test]
    fn test_reset_restores_scales_mid_slow_time() {
        let mut status = PlayerStatus::new(&cfg());
        let mut clock = RunClock::new(SIM_DT);

        status.activate_slow_time(5.0, 0.5, 0.0, &mut clock);
        status.reset(&cfg(), &mut clock);
        assert_eq!(clock.time_scale(), 1.0);
        assert_eq!(status.extra_lives(), 1);
    }
}
