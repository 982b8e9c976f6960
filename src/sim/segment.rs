//! Track segments and their alignment anchors
//!
//! A segment is a reusable course piece with two authored local connection
//! points: the start anchor is glued to the previous segment's end anchor at
//! spawn time. Segments never own their placement logic; the streamer does.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SegmentKindConfig;

/// Pool-wide segment identity (index into the pool arena)
pub type SegmentId = u32;

/// Local connection points defining where neighbors attach
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnchorPair {
    pub start: Vec3,
    pub end: Vec3,
}

/// A reusable track segment instance
///
/// Lifecycle: created once by the pool (or on demand if expandable),
/// then cycles pooled -> active -> pooled until process teardown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Pool-type index (which authored kind this instance is)
    pub kind: usize,
    pub position: Vec3,
    /// Fixed per course; never recomputed during placement
    pub rotation: Quat,
    pub scale: Vec3,
    pub anchors: AnchorPair,
    /// Fallback length used when the alignment pair is degenerate
    pub nominal_length: f32,
    pub(crate) active: bool,
}

impl Segment {
    pub fn from_kind(id: SegmentId, kind: usize, cfg: &SegmentKindConfig) -> Self {
        Self {
            id,
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            anchors: AnchorPair {
                start: cfg.start_anchor,
                end: cfg.end_anchor,
            },
            nominal_length: cfg.nominal_length,
            active: false,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start anchor in world space (recomputed per query; the segment moves)
    pub fn world_start_anchor(&self) -> Vec3 {
        self.position + self.rotation * (self.anchors.start * self.scale)
    }

    /// End anchor in world space
    pub fn world_end_anchor(&self) -> Vec3 {
        self.position + self.rotation * (self.anchors.end * self.scale)
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentKindConfig;

    #[test]
    fn test_world_anchors_follow_translation() {
        let cfg = SegmentKindConfig::straight("flat", 12.88);
        let mut seg = Segment::from_kind(0, 0, &cfg);
        seg.position = Vec3::new(0.0, 0.0, 5.0);

        assert!((seg.world_start_anchor().z - 5.0).abs() < 1e-6);
        assert!((seg.world_end_anchor().z - 17.88).abs() < 1e-4);

        seg.translate(Vec3::new(0.0, 0.0, -2.0));
        assert!((seg.world_start_anchor().z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_anchors_respect_scale() {
        let cfg = SegmentKindConfig::straight("flat", 10.0);
        let mut seg = Segment::from_kind(0, 0, &cfg);
        seg.scale = Vec3::splat(2.0);

        let span = seg.world_end_anchor() - seg.world_start_anchor();
        assert!((span.z - 20.0).abs() < 1e-5);
    }
}
