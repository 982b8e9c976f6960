//! Timer-driven track entity spawning
//!
//! Places obstacles and power-up pickups ahead of the viewpoint on a fixed
//! simulation-time cadence, weighted by the difficulty scheduler. Entities
//! ride the course: the streamer's per-tick translation is applied to them
//! too, and anything that falls behind the despawn line is retired.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::SpawnerConfig;

use super::difficulty::{DifficultyScheduler, SpawnKind};
use super::hazard::HazardId;

/// Concrete spawnable content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Obstacle,
    ShieldPickup,
    SlowTimePickup,
}

impl From<SpawnKind> for EntityKind {
    fn from(kind: SpawnKind) -> Self {
        match kind {
            SpawnKind::Obstacle => EntityKind::Obstacle,
            SpawnKind::PickupA => EntityKind::ShieldPickup,
            SpawnKind::PickupB => EntityKind::SlowTimePickup,
        }
    }
}

/// A live obstacle or pickup on the track
#[derive(Debug, Clone, Copy)]
pub struct TrackEntity {
    pub id: HazardId,
    pub kind: EntityKind,
    pub position: Vec3,
}

/// Spawns and retires track entities around the course window.
pub struct TrackSpawner {
    cfg: SpawnerConfig,
    entities: Vec<TrackEntity>,
    next_id: HazardId,
    /// Simulation seconds until the next spawn attempt
    timer: f32,
    enabled: bool,
    reference_z: f32,
    despawn_distance: f32,
    spawn_count: u64,
}

impl TrackSpawner {
    pub fn new(cfg: SpawnerConfig, reference_z: f32, despawn_distance: f32) -> Self {
        Self {
            timer: cfg.spawn_interval,
            cfg,
            entities: Vec::new(),
            next_id: 1,
            enabled: true,
            reference_z,
            despawn_distance,
            spawn_count: 0,
        }
    }

    #[inline]
    pub fn entities(&self) -> &[TrackEntity] {
        &self.entities
    }

    #[inline]
    pub fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    /// Remove an entity by id (collected or destroyed by gameplay).
    pub fn remove(&mut self, id: HazardId) -> Option<TrackEntity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.swap_remove(index))
    }

    /// Permanently stop spawning for this run.
    pub fn halt(&mut self) {
        self.enabled = false;
    }

    /// Advance one tick: ride the course, retire what fell behind, and
    /// spawn on cadence. Returns the ids of retired entities so callers can
    /// evict any per-entity bookkeeping.
    pub fn tick(
        &mut self,
        sim_dt: f32,
        course_delta: Vec3,
        scheduler: &DifficultyScheduler,
        rng: &mut Pcg32,
    ) -> Vec<HazardId> {
        if !self.enabled {
            return Vec::new();
        }

        for entity in &mut self.entities {
            entity.position += course_delta;
        }

        let limit = self.reference_z - self.despawn_distance;
        let mut retired = Vec::new();
        self.entities.retain(|e| {
            if e.position.z < limit {
                retired.push(e.id);
                false
            } else {
                true
            }
        });
        if !retired.is_empty() {
            log::debug!("{} track entities retired behind the course", retired.len());
        }

        self.timer -= sim_dt;
        while self.timer <= 0.0 {
            self.timer += self.cfg.spawn_interval;
            if self.entities.len() >= self.cfg.max_active {
                continue;
            }
            self.spawn(scheduler, rng);
        }

        retired
    }

    fn spawn(&mut self, scheduler: &DifficultyScheduler, rng: &mut Pcg32) {
        let kind = EntityKind::from(scheduler.pick(rng));

        let lateral = if self.cfg.lane_half_width > 0.0 {
            rng.random_range(-self.cfg.lane_half_width..self.cfg.lane_half_width)
        } else {
            0.0
        };
        let ahead = if self.cfg.spawn_ahead_jitter > 0.0 {
            self.cfg.spawn_ahead + rng.random_range(0.0..self.cfg.spawn_ahead_jitter)
        } else {
            self.cfg.spawn_ahead
        };

        let entity = TrackEntity {
            id: self.next_id,
            kind,
            position: Vec3::new(lateral, 0.1, self.reference_z + ahead),
        };
        self.next_id += 1;
        self.spawn_count += 1;
        log::debug!("spawned {:?} #{} at z {:.1}", entity.kind, entity.id, entity.position.z);
        self.entities.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DifficultyConfig;
    use crate::consts::SIM_DT;
    use rand::SeedableRng;

    fn fixtures() -> (TrackSpawner, DifficultyScheduler, Pcg32) {
        (
            TrackSpawner::new(SpawnerConfig::default(), 0.0, 30.0),
            DifficultyScheduler::new(&DifficultyConfig::default()),
            Pcg32::seed_from_u64(42),
        )
    }

    #[test]
    fn test_spawns_on_cadence() {
        let (mut spawner, scheduler, mut rng) = fixtures();

        // 10.5 simulation seconds at a 2s interval: spawns at 2,4,6,8,10
        for _ in 0..1260 {
            spawner.tick(SIM_DT, Vec3::ZERO, &scheduler, &mut rng);
        }
        assert_eq!(spawner.spawn_count(), 5);
    }

    #[test]
    fn test_retires_entities_behind_despawn_line() {
        let (mut spawner, scheduler, mut rng) = fixtures();

        // Spawn one, then drag the course far enough back to retire it
        for _ in 0..241 {
            spawner.tick(SIM_DT, Vec3::ZERO, &scheduler, &mut rng);
        }
        assert_eq!(spawner.entities().len(), 1);
        let id = spawner.entities()[0].id;

        let retired = spawner.tick(SIM_DT, Vec3::new(0.0, 0.0, -50.0), &scheduler, &mut rng);
        assert_eq!(retired, vec![id]);
        assert!(spawner.entities().is_empty());
    }

    #[test]
    fn test_respects_max_active_cap() {
        let cfg = SpawnerConfig {
            max_active: 3,
            ..SpawnerConfig::default()
        };
        let mut spawner = TrackSpawner::new(cfg, 0.0, 30.0);
        let scheduler = DifficultyScheduler::new(&DifficultyConfig::default());
        let mut rng = Pcg32::seed_from_u64(42);

        // Long run with no movement: nothing retires, cap binds
        for _ in 0..12_000 {
            spawner.tick(SIM_DT, Vec3::ZERO, &scheduler, &mut rng);
        }
        assert_eq!(spawner.entities().len(), 3);
    }

    #[test]
    fn test_remove_by_id() {
        let (mut spawner, scheduler, mut rng) = fixtures();
        for _ in 0..241 {
            spawner.tick(SIM_DT, Vec3::ZERO, &scheduler, &mut rng);
        }
        let id = spawner.entities()[0].id;

        let removed = spawner.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(spawner.remove(id).is_none());
    }

    #[test]
    fn test_halt_stops_spawning() {
        let (mut spawner, scheduler, mut rng) = fixtures();
        spawner.halt();
        for _ in 0..1200 {
            spawner.tick(SIM_DT, Vec3::ZERO, &scheduler, &mut rng);
        }
        assert_eq!(spawner.spawn_count(), 0);
    }
}
