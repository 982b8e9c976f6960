//! Course streaming
//!
//! Keeps a sliding window of active segments translating past a fixed
//! viewpoint: the course moves, the player does not. Every tick runs in a
//! strict order: movement, cursor recompute, despawn, spawn. Despawning
//! before movement would evaluate stale positions; spawning before despawn
//! would over-draw the pool.

use std::collections::VecDeque;

use glam::{Quat, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::StreamerConfig;
use crate::consts::{FORWARD, MIN_ANCHOR_ADVANCE, MOVEMENT_DIR};
use crate::forward_advance;

use super::pool::{PoolError, SegmentHandle, SegmentPool};
use super::segment::Segment;

/// Back reference to the newest placed segment (the spawn cursor's parent)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastRef {
    None,
    /// The designated initial segment, streamer-owned, never pooled
    Initial,
    Pooled(SegmentHandle),
}

/// Maintains the endless course illusion: spawn ahead, reclaim behind.
pub struct CourseStreamer {
    /// Oldest (furthest behind) to newest (furthest ahead)
    active: VecDeque<SegmentHandle>,
    /// Authored starting piece; translated with the window but never
    /// released to the pool and never part of the queue
    initial: Option<Segment>,
    last: LastRef,
    /// World position where the next segment's start anchor must land
    next_spawn_point: Vec3,
    course_rotation: Quat,
    course_scale: Vec3,
    movement_speed: f32,
    min_active: usize,
    despawn_distance: f32,
    /// Fixed forward-axis coordinate of the viewpoint
    reference_z: f32,
    distance_traveled: f32,
    enabled: bool,
    spawn_count: u64,
    despawn_count: u64,
}

impl CourseStreamer {
    pub fn new(cfg: &StreamerConfig, initial: Option<Segment>, reference_z: f32) -> Self {
        let (last, next_spawn_point) = match &initial {
            Some(seg) => (LastRef::Initial, safe_world_end(seg)),
            None => (LastRef::None, Vec3::new(0.0, 0.0, reference_z + 10.0)),
        };
        // The whole course shares the initial segment's orientation; placement
        // afterward is translation-only
        let (course_rotation, course_scale) = match &initial {
            Some(seg) => (seg.rotation, seg.scale),
            None => (Quat::IDENTITY, Vec3::ONE),
        };
        Self {
            active: VecDeque::with_capacity(cfg.min_active_segments + 1),
            initial,
            last,
            next_spawn_point,
            course_rotation,
            course_scale,
            movement_speed: cfg.movement_speed,
            min_active: cfg.min_active_segments,
            despawn_distance: cfg.despawn_distance,
            reference_z,
            distance_traveled: 0.0,
            enabled: true,
            spawn_count: 0,
            despawn_count: 0,
        }
    }

    #[inline]
    pub fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    #[inline]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    #[inline]
    pub fn despawn_count(&self) -> u64 {
        self.despawn_count
    }

    #[inline]
    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed;
    }

    /// Oldest-to-newest handles of the active window
    pub fn active_handles(&self) -> impl Iterator<Item = SegmentHandle> + '_ {
        self.active.iter().copied()
    }

    /// Permanently stop movement and streaming for this run.
    pub fn halt(&mut self) {
        self.enabled = false;
        log::info!(
            "course streaming halted at {:.1}m ({} spawned, {} recycled)",
            self.distance_traveled,
            self.spawn_count,
            self.despawn_count
        );
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn tick(&mut self, sim_dt: f32, pool: &mut SegmentPool, rng: &mut Pcg32) {
        if !self.enabled {
            return;
        }

        // 1. Movement
        self.distance_traveled += self.movement_speed * sim_dt;
        let delta = MOVEMENT_DIR * self.movement_speed * sim_dt;
        if let Some(initial) = &mut self.initial {
            initial.translate(delta);
        }
        for handle in &self.active {
            if let Some(seg) = pool.get_mut(*handle) {
                seg.translate(delta);
            }
        }

        // 2. Cursor follows the newest segment, which just moved
        self.recompute_cursor(pool, delta);

        // 3. Despawn behind the viewpoint
        self.despawn_pass(pool);

        // 4. Spawn ahead until the window is full
        self.spawn_pass(pool, rng);
    }

    fn recompute_cursor(&mut self, pool: &SegmentPool, delta: Vec3) {
        match self.last {
            LastRef::Pooled(handle) => {
                if let Some(seg) = pool.get(handle) {
                    self.next_spawn_point = safe_world_end(seg);
                }
            }
            LastRef::Initial => {
                if let Some(seg) = &self.initial {
                    self.next_spawn_point = safe_world_end(seg);
                }
            }
            // No parent segment: the cursor drifts with the course
            LastRef::None => self.next_spawn_point += delta,
        }
    }

    fn despawn_pass(&mut self, pool: &mut SegmentPool) {
        let limit = self.reference_z - self.despawn_distance;
        while let Some(&front) = self.active.front() {
            let behind = pool
                .get(front)
                .is_some_and(|seg| safe_world_end(seg).z < limit);
            if !behind {
                break;
            }

            self.active.pop_front();
            if let Err(err) = pool.release(front) {
                log::error!("failed to recycle segment {}: {err}", front.id);
            }
            self.despawn_count += 1;

            if self.active.is_empty() {
                // Window drained entirely: restart placement from the
                // initial segment's current end
                if let Some(initial) = &self.initial {
                    self.last = LastRef::Initial;
                    self.next_spawn_point = safe_world_end(initial);
                } else {
                    self.last = LastRef::None;
                }
            }
        }
    }

    fn spawn_pass(&mut self, pool: &mut SegmentPool, rng: &mut Pcg32) {
        while self.active.len() < self.min_active {
            let kind = rng.random_range(0..pool.kind_count());
            let handle = match pool.acquire(kind) {
                Ok(handle) => handle,
                Err(PoolError::Exhausted { kind }) => {
                    // Transient: retry next tick with whatever came back
                    log::warn!("segment pool exhausted for kind {kind}, window under-populated");
                    break;
                }
                Err(err) => {
                    log::error!("segment acquisition failed: {err}");
                    break;
                }
            };

            let Some(seg) = pool.get_mut(handle) else {
                break;
            };
            // Translation-only placement: rotation and scale are fixed per
            // course. Position the instance so its start anchor lands on
            // the cursor.
            seg.rotation = self.course_rotation;
            seg.scale = self.course_scale;
            seg.position =
                self.next_spawn_point - self.course_rotation * (seg.anchors.start * self.course_scale);

            self.next_spawn_point = safe_world_end(seg);
            self.active.push_back(handle);
            self.last = LastRef::Pooled(handle);
            self.spawn_count += 1;
        }
    }
}

/// World end anchor, guarded against malformed authored data.
///
/// If the end anchor is not ahead of the start along the forward axis (or is
/// numerically invalid), fall back to start plus the nominal length.
fn safe_world_end(seg: &Segment) -> Vec3 {
    let start = seg.world_start_anchor();
    let end = seg.world_end_anchor();
    let advance = forward_advance(start, end);
    if !advance.is_finite() || advance < MIN_ANCHOR_ADVANCE {
        log::warn!(
            "segment {} (kind {}) has degenerate anchors (advance {advance}), using nominal length",
            seg.id,
            seg.kind
        );
        return start + FORWARD * seg.nominal_length;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, SegmentKindConfig};
    use crate::consts::{DEFAULT_SEGMENT_LENGTH, SIM_DT};
    use rand::SeedableRng;

    fn kinds(n: usize) -> Vec<SegmentKindConfig> {
        (0..n)
            .map(|i| SegmentKindConfig::straight(&format!("kind{i}"), DEFAULT_SEGMENT_LENGTH))
            .collect()
    }

    fn initial_segment() -> Segment {
        Segment::from_kind(
            u32::MAX,
            0,
            &SegmentKindConfig::straight("initial", DEFAULT_SEGMENT_LENGTH),
        )
    }

    fn setup(cfg: StreamerConfig, pool_cfg: PoolConfig, kind_count: usize) -> (CourseStreamer, SegmentPool, Pcg32) {
        let pool = SegmentPool::new(&kinds(kind_count), &pool_cfg);
        let streamer = CourseStreamer::new(&cfg, Some(initial_segment()), 0.0);
        (streamer, pool, Pcg32::seed_from_u64(42))
    }

    #[test]
    fn test_first_tick_fills_window() {
        let (mut streamer, mut pool, mut rng) =
            setup(StreamerConfig::default(), PoolConfig::default(), 3);

        assert_eq!(streamer.active_len(), 0);
        streamer.tick(SIM_DT, &mut pool, &mut rng);
        assert_eq!(streamer.active_len(), 12);
    }

    #[test]
    fn test_window_is_contiguous_after_spawn_pass() {
        let (mut streamer, mut pool, mut rng) =
            setup(StreamerConfig::default(), PoolConfig::default(), 3);
        streamer.tick(SIM_DT, &mut pool, &mut rng);

        let handles: Vec<_> = streamer.active_handles().collect();
        for pair in handles.windows(2) {
            let end = pool.get(pair[0]).unwrap().world_end_anchor();
            let start = pool.get(pair[1]).unwrap().world_start_anchor();
            assert!((end - start).length() < 1e-3);
        }
    }

    #[test]
    fn test_steady_state_spawn_cadence() {
        // 10 seconds at 8 u/s covers 80 units; with 12.88-unit segments the
        // despawn line is crossed floor(80 / 12.88) = 6 times.
        let (mut streamer, mut pool, mut rng) =
            setup(StreamerConfig::default(), PoolConfig::default(), 3);

        // Warm up past the first recycle so the count starts at a crossing
        let mut guard = 0;
        while streamer.despawn_count() == 0 {
            streamer.tick(SIM_DT, &mut pool, &mut rng);
            guard += 1;
            assert!(guard < 100_000, "no despawn during warm-up");
        }

        let spawns_before = streamer.spawn_count();
        let window_before = streamer.active_len();
        for _ in 0..1200 {
            streamer.tick(SIM_DT, &mut pool, &mut rng);
        }

        assert_eq!(streamer.spawn_count() - spawns_before, 6);
        assert_eq!(streamer.active_len(), window_before);
    }

    #[test]
    fn test_distance_accumulates_with_speed() {
        let (mut streamer, mut pool, mut rng) =
            setup(StreamerConfig::default(), PoolConfig::default(), 3);
        for _ in 0..120 {
            streamer.tick(SIM_DT, &mut pool, &mut rng);
        }
        assert!((streamer.distance_traveled() - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_exhausted_pool_tolerated() {
        let cfg = StreamerConfig {
            min_active_segments: 4,
            ..StreamerConfig::default()
        };
        let pool_cfg = PoolConfig {
            initial_size: 2,
            expandable: false,
        };
        let (mut streamer, mut pool, mut rng) = setup(cfg, pool_cfg, 1);

        streamer.tick(SIM_DT, &mut pool, &mut rng);
        assert_eq!(streamer.active_len(), 2);
        // Retried next tick; still exhausted, still not fatal
        streamer.tick(SIM_DT, &mut pool, &mut rng);
        assert_eq!(streamer.active_len(), 2);
    }

    #[test]
    fn test_empty_window_resets_to_initial_segment() {
        let cfg = StreamerConfig {
            min_active_segments: 1,
            despawn_distance: 30.0,
            movement_speed: 8.0,
        };
        let pool_cfg = PoolConfig {
            initial_size: 1,
            expandable: false,
        };
        let (mut streamer, mut pool, mut rng) = setup(cfg, pool_cfg, 1);

        // Big steps so the lone segment falls behind quickly. When it is
        // recycled the spawn pass re-places it at the (far drifted) initial
        // segment's end anchor.
        let mut ticks = 0;
        while streamer.despawn_count() == 0 {
            streamer.tick(1.0, &mut pool, &mut rng);
            ticks += 1;
            assert!(ticks < 100);
        }

        assert_eq!(streamer.active_len(), 1);
        let front = streamer.active_handles().next().unwrap();
        let start_z = pool.get(front).unwrap().world_start_anchor().z;
        let expected = -8.0 * ticks as f32 + DEFAULT_SEGMENT_LENGTH;
        assert!((start_z - expected).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_anchors_fall_back_to_nominal_length() {
        let kind = SegmentKindConfig {
            name: "broken".to_string(),
            start_anchor: Vec3::ZERO,
            end_anchor: Vec3::ZERO,
            nominal_length: 5.0,
        };
        let mut pool = SegmentPool::new(&[kind], &PoolConfig::default());
        let cfg = StreamerConfig {
            min_active_segments: 3,
            ..StreamerConfig::default()
        };
        let mut streamer = CourseStreamer::new(&cfg, None, 0.0);
        let mut rng = Pcg32::seed_from_u64(1);

        streamer.tick(SIM_DT, &mut pool, &mut rng);

        let handles: Vec<_> = streamer.active_handles().collect();
        assert_eq!(handles.len(), 3);
        for pair in handles.windows(2) {
            let a = pool.get(pair[0]).unwrap().world_start_anchor();
            let b = pool.get(pair[1]).unwrap().world_start_anchor();
            assert!((forward_advance(a, b) - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_halt_freezes_the_course() {
        let (mut streamer, mut pool, mut rng) =
            setup(StreamerConfig::default(), PoolConfig::default(), 3);
        streamer.tick(SIM_DT, &mut pool, &mut rng);

        streamer.halt();
        let distance = streamer.distance_traveled();
        let spawns = streamer.spawn_count();
        streamer.tick(SIM_DT, &mut pool, &mut rng);

        assert_eq!(streamer.distance_traveled(), distance);
        assert_eq!(streamer.spawn_count(), spawns);
    }
}
