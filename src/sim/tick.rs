//! Run orchestration
//!
//! `RunContext` owns every simulation component for one run and advances
//! them in a fixed order each tick: clock, status expiry, course streaming,
//! difficulty, entity spawning, contact resolution. External collaborators
//! feed contacts in and drain run events out; nothing here is a global.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::{ConfigError, RunConfig};
use crate::consts::{MOVEMENT_DIR, SIM_DT};

use super::clock::RunClock;
use super::difficulty::DifficultyScheduler;
use super::hazard::{ContactEvent, ContactOutcome, HazardId, HazardResolver};
use super::pool::SegmentPool;
use super::segment::Segment;
use super::spawner::{EntityKind, TrackSpawner};
use super::status::{PlayerStatus, PowerUpKind};
use super::streamer::CourseStreamer;

/// Things that happened during a tick, drained by the run controller
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    LivesChanged(u32),
    PowerUpActivated(PowerUpKind),
    ContactResolved {
        hazard_id: HazardId,
        outcome: ContactOutcome,
    },
    Death,
}

/// Terminal (or in-progress) state of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub distance_traveled: f32,
    pub extra_lives: u32,
    pub dead: bool,
}

/// Owns one run's worth of simulation state.
pub struct RunContext {
    config: RunConfig,
    clock: RunClock,
    pool: SegmentPool,
    streamer: CourseStreamer,
    scheduler: DifficultyScheduler,
    spawner: TrackSpawner,
    status: PlayerStatus,
    resolver: HazardResolver,
    rng: Pcg32,
    seed: u64,
    events: Vec<RunEvent>,
    dead: bool,
}

impl RunContext {
    /// Validate the configuration and assemble a fresh run.
    pub fn new(config: RunConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = SegmentPool::new(&config.segment_kinds, &config.pool);
        let streamer = CourseStreamer::new(
            &config.streamer,
            Some(initial_segment(&config)),
            0.0,
        );
        let spawner = TrackSpawner::new(config.spawner, 0.0, config.streamer.despawn_distance);

        log::info!("run starting with seed {seed}");
        Ok(Self {
            clock: RunClock::new(SIM_DT),
            pool,
            streamer,
            scheduler: DifficultyScheduler::new(&config.difficulty),
            spawner,
            status: PlayerStatus::new(&config.power_ups),
            resolver: HazardResolver::new(config.hazards.clone()),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            events: Vec::new(),
            dead: false,
            config,
        })
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn distance_traveled(&self) -> f32 {
        self.streamer.distance_traveled()
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    #[inline]
    pub fn streamer(&self) -> &CourseStreamer {
        &self.streamer
    }

    #[inline]
    pub fn spawner(&self) -> &TrackSpawner {
        &self.spawner
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            distance_traveled: self.streamer.distance_traveled(),
            extra_lives: self.status.extra_lives(),
            dead: self.dead,
        }
    }

    /// Advance the run by one frame of wall-clock time.
    ///
    /// `contacts` are this frame's broad-phase reports; all of them are
    /// resolved even if an early one is fatal, since the resolver's death
    /// latch turns the rest into no-ops.
    pub fn tick(&mut self, real_dt: f32, contacts: &[ContactEvent]) {
        if self.dead {
            return;
        }

        let sim_dt = self.clock.advance(real_dt);
        let now = self.clock.real_now();

        self.status.tick(now, &mut self.clock);

        self.streamer.tick(sim_dt, &mut self.pool, &mut self.rng);
        self.scheduler.update(self.streamer.distance_traveled());

        let course_delta = MOVEMENT_DIR * self.streamer.movement_speed() * sim_dt;
        let retired = self
            .spawner
            .tick(sim_dt, course_delta, &self.scheduler, &mut self.rng);
        for id in retired {
            self.resolver.forget(id);
        }

        for contact in contacts {
            self.resolve_contact(contact, now);
        }

        if let Some(lives) = self.status.take_lives_changed() {
            self.events.push(RunEvent::LivesChanged(lives));
        }
    }

    fn resolve_contact(&mut self, contact: &ContactEvent, now: f64) {
        let Some(outcome) = self.resolver.resolve(contact, &mut self.status, now) else {
            return;
        };
        self.events.push(RunEvent::ContactResolved {
            hazard_id: contact.hazard_id,
            outcome,
        });
        if outcome == ContactOutcome::Death {
            self.on_death();
        }
    }

    /// Terminal transition: halt streaming and spawning, surface the event.
    fn on_death(&mut self) {
        self.dead = true;
        self.streamer.halt();
        self.spawner.halt();
        self.events.push(RunEvent::Death);
        log::warn!(
            "run over at {:.1}m (seed {})",
            self.streamer.distance_traveled(),
            self.seed
        );
    }

    /// Pickup collaborator entry point.
    pub fn activate_power_up(&mut self, kind: PowerUpKind) {
        let now = self.clock.real_now();
        self.status
            .activate_power_up(kind, &self.config.power_ups, now, &mut self.clock);
        self.events.push(RunEvent::PowerUpActivated(kind));
    }

    /// Collect a pickup entity by id. Returns false (and leaves the entity
    /// in place) if the id is unknown or names an obstacle.
    pub fn collect_pickup(&mut self, id: HazardId) -> bool {
        let Some(kind) = self
            .spawner
            .entities()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.kind)
        else {
            return false;
        };
        let power_up = match kind {
            EntityKind::ShieldPickup => PowerUpKind::Shield,
            EntityKind::SlowTimePickup => PowerUpKind::SlowTime,
            EntityKind::Obstacle => return false,
        };

        self.spawner.remove(id);
        self.resolver.forget(id);
        self.activate_power_up(power_up);
        true
    }

    /// Remove a destroyed hazard and evict its cooldown entry.
    pub fn destroy_hazard(&mut self, id: HazardId) {
        self.spawner.remove(id);
        self.resolver.forget(id);
    }

    /// Take everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.events)
    }

    /// Restart the run with a new seed. The configuration was validated at
    /// construction, so the rebuild cannot fail.
    pub fn reset(&mut self, seed: u64) {
        self.status.reset(&self.config.power_ups, &mut self.clock);
        self.clock.reset(SIM_DT);
        self.resolver.reset();
        self.scheduler.reset();

        self.pool = SegmentPool::new(&self.config.segment_kinds, &self.config.pool);
        self.streamer = CourseStreamer::new(
            &self.config.streamer,
            Some(initial_segment(&self.config)),
            0.0,
        );
        self.spawner = TrackSpawner::new(
            self.config.spawner,
            0.0,
            self.config.streamer.despawn_distance,
        );
        self.rng = Pcg32::seed_from_u64(seed);
        self.seed = seed;
        self.events.clear();
        self.dead = false;
        log::info!("run reset with seed {seed}");
    }
}

/// The authored starting piece, owned by the streamer and never pooled.
fn initial_segment(config: &RunConfig) -> Segment {
    Segment::from_kind(u32::MAX, 0, &config.segment_kinds[0])
}
