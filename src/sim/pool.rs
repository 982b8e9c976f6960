//! Segment pooling
//!
//! One arena of segment instances with a free list per kind. The course
//! streamer is the only writer: it acquires handles for the spawn pass and
//! releases them from the despawn pass. Instances are never destroyed, only
//! deactivated and recycled.

use thiserror::Error;

use super::segment::{Segment, SegmentId};
use crate::config::{PoolConfig, SegmentKindConfig};

/// Errors surfaced by pool operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("unknown segment kind {0}")]
    UnknownKind(usize),
    #[error("pool exhausted for segment kind {kind} (non-expandable)")]
    Exhausted { kind: usize },
    #[error("segment {id} released twice")]
    DoubleRelease { id: SegmentId },
}

/// Borrowed reference to an active segment; the pool retains ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHandle {
    pub id: SegmentId,
    pub kind: usize,
}

/// Reusable segment instances keyed by kind
pub struct SegmentPool {
    segments: Vec<Segment>,
    /// Per-kind free lists of pooled instance ids
    free: Vec<Vec<SegmentId>>,
    templates: Vec<SegmentKindConfig>,
    expandable: bool,
}

impl SegmentPool {
    /// Build the pool and pre-instantiate `initial_size` segments per kind so
    /// early-course spawns never pay instantiation cost.
    pub fn new(kinds: &[SegmentKindConfig], cfg: &PoolConfig) -> Self {
        let mut pool = Self {
            segments: Vec::with_capacity(kinds.len() * cfg.initial_size),
            free: vec![Vec::with_capacity(cfg.initial_size); kinds.len()],
            templates: kinds.to_vec(),
            expandable: cfg.expandable,
        };

        for kind in 0..kinds.len() {
            for _ in 0..cfg.initial_size {
                let id = pool.instantiate(kind);
                pool.free[kind].push(id);
            }
        }

        log::info!(
            "segment pool warmed: {} kinds x {} instances",
            kinds.len(),
            cfg.initial_size
        );
        pool
    }

    fn instantiate(&mut self, kind: usize) -> SegmentId {
        let id = self.segments.len() as SegmentId;
        self.segments
            .push(Segment::from_kind(id, kind, &self.templates[kind]));
        id
    }

    /// Number of configured segment kinds
    #[inline]
    pub fn kind_count(&self) -> usize {
        self.templates.len()
    }

    /// Pooled (inactive) instances available for `kind`
    pub fn free_count(&self, kind: usize) -> usize {
        self.free.get(kind).map(Vec::len).unwrap_or(0)
    }

    /// Total instances ever created
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Hand out an inactive instance of `kind`, instantiating a new one if
    /// the free list is empty and the pool is expandable. The instance is
    /// marked active but not yet positioned.
    pub fn acquire(&mut self, kind: usize) -> Result<SegmentHandle, PoolError> {
        if kind >= self.templates.len() {
            return Err(PoolError::UnknownKind(kind));
        }

        let id = match self.free[kind].pop() {
            Some(id) => id,
            None if self.expandable => {
                let id = self.instantiate(kind);
                log::debug!("pool expanded: new segment {id} of kind {kind}");
                id
            }
            None => return Err(PoolError::Exhausted { kind }),
        };

        self.segments[id as usize].active = true;
        Ok(SegmentHandle { id, kind })
    }

    /// Return an instance to its kind's free list.
    ///
    /// Releasing a handle twice corrupts the free-list invariant, so it is
    /// detected and reported rather than ignored.
    pub fn release(&mut self, handle: SegmentHandle) -> Result<(), PoolError> {
        let Some(segment) = self.segments.get_mut(handle.id as usize) else {
            return Err(PoolError::UnknownKind(handle.kind));
        };
        if !segment.active {
            return Err(PoolError::DoubleRelease { id: handle.id });
        }
        segment.active = false;

        debug_assert!(
            !self.free[handle.kind].contains(&handle.id),
            "segment {} already on free list",
            handle.id
        );
        self.free[handle.kind].push(handle.id);
        Ok(())
    }

    pub fn get(&self, handle: SegmentHandle) -> Option<&Segment> {
        self.segments.get(handle.id as usize)
    }

    pub fn get_mut(&mut self, handle: SegmentHandle) -> Option<&mut Segment> {
        self.segments.get_mut(handle.id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool(initial: usize, expandable: bool) -> SegmentPool {
        let kinds = vec![
            SegmentKindConfig::straight("flat", 12.88),
            SegmentKindConfig::straight("ramp", 12.88),
        ];
        SegmentPool::new(
            &kinds,
            &PoolConfig {
                initial_size: initial,
                expandable,
            },
        )
    }

    #[test]
    fn test_warmup_preinstantiates_per_kind() {
        let pool = test_pool(8, true);
        assert_eq!(pool.len(), 16);
        assert_eq!(pool.free_count(0), 8);
        assert_eq!(pool.free_count(1), 8);
    }

    #[test]
    fn test_acquire_release_round_trip() {
        let mut pool = test_pool(4, false);
        let before = pool.free_count(0);

        let handle = pool.acquire(0).unwrap();
        assert_eq!(pool.free_count(0), before - 1);
        assert!(pool.get(handle).unwrap().is_active());

        pool.release(handle).unwrap();
        assert_eq!(pool.free_count(0), before);
        assert!(!pool.get(handle).unwrap().is_active());
    }

    #[test]
    fn test_exhausted_when_not_expandable() {
        let mut pool = test_pool(1, false);
        let _held = pool.acquire(0).unwrap();
        assert_eq!(pool.acquire(0), Err(PoolError::Exhausted { kind: 0 }));
    }

    #[test]
    fn test_expands_on_demand() {
        let mut pool = test_pool(1, true);
        let a = pool.acquire(0).unwrap();
        let b = pool.acquire(0).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(pool.len(), 3); // 2 warmed + 1 expansion
    }

    #[test]
    fn test_double_release_detected() {
        let mut pool = test_pool(2, false);
        let handle = pool.acquire(0).unwrap();
        pool.release(handle).unwrap();
        assert_eq!(
            pool.release(handle),
            Err(PoolError::DoubleRelease { id: handle.id })
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut pool = test_pool(2, true);
        assert_eq!(pool.acquire(9), Err(PoolError::UnknownKind(9)));
    }
}
