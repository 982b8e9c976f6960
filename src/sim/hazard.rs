//! Hazard classification and contact resolution
//!
//! The physics broad-phase is an external collaborator: it reports raw
//! contact events and this module decides what each one means for the
//! player. Resolution applies a strict rule order so protections compose
//! predictably: invulnerability, per-object cooldown, slow-time, shield,
//! extra life, death.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::HazardConfig;

use super::status::PlayerStatus;

/// Stable identity of a contacted object, assigned by the broad-phase
pub type HazardId = u64;

/// How the broad-phase observed the contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Collision,
    Trigger,
}

/// Collider shape reported with the contact, when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeHint {
    Sphere,
    Box,
    Capsule,
    Mesh,
    Unknown,
}

/// One raw contact as reported by the physics collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEvent {
    pub hazard_id: HazardId,
    pub name: String,
    pub tags: Vec<String>,
    pub layer: u8,
    pub shape: ShapeHint,
    pub kind: ContactKind,
}

/// What a hazardous contact resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Suppressed (invulnerable or on cooldown); nothing consumed
    Ignored,
    AbsorbedBySlowTime,
    AbsorbedByShield,
    LifeConsumed,
    Death,
}

/// Resolves contacts against the player's protections.
///
/// Holds the per-object cooldown table and the run's death latch. At most
/// one death outcome is produced per run; contacts after death resolve to
/// nothing at all.
pub struct HazardResolver {
    cfg: HazardConfig,
    /// Last real-time stamp a terminal outcome was recorded per object
    hits: HashMap<HazardId, f64>,
    is_dead: bool,
}

impl HazardResolver {
    pub fn new(cfg: HazardConfig) -> Self {
        Self {
            cfg,
            hits: HashMap::new(),
            is_dead: false,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Classify a contact: hazard or harmless scenery.
    ///
    /// Any one signal suffices: tag match, layer-mask match, sphere shape,
    /// or a configured name substring (case-insensitive).
    pub fn is_hazard(&self, ev: &ContactEvent) -> bool {
        if self.cfg.treat_everything_as_hazard {
            return true;
        }
        if ev.tags.iter().any(|t| self.cfg.hazard_tags.contains(t)) {
            return true;
        }
        if self.cfg.hazard_layer_mask != 0
            && (ev.layer as u32) < 32
            && self.cfg.hazard_layer_mask & (1 << ev.layer) != 0
        {
            return true;
        }
        if ev.shape == ShapeHint::Sphere {
            return true;
        }
        let name = ev.name.to_lowercase();
        self.cfg.name_hints.iter().any(|h| name.contains(&h.to_lowercase()))
    }

    /// Resolve one contact at real time `now`.
    ///
    /// Returns `None` for non-hazards and for anything arriving after the
    /// death latch; `Some(outcome)` otherwise. The cooldown table only
    /// records contacts that actually consumed something, so an ignored
    /// repeat never extends its own suppression.
    pub fn resolve(
        &mut self,
        ev: &ContactEvent,
        status: &mut PlayerStatus,
        now: f64,
    ) -> Option<ContactOutcome> {
        if self.is_dead || !self.is_hazard(ev) {
            return None;
        }

        if status.invulnerable(now) {
            log::debug!("contact with '{}' ignored: invulnerable", ev.name);
            return Some(ContactOutcome::Ignored);
        }

        let on_cooldown = self
            .hits
            .get(&ev.hazard_id)
            .is_some_and(|&last| now - last < self.cfg.per_object_hit_cooldown as f64);
        if on_cooldown && !(self.cfg.shield_bypasses_cooldown && status.shield_active()) {
            log::debug!("contact with '{}' ignored: on cooldown", ev.name);
            return Some(ContactOutcome::Ignored);
        }

        if status.slow_time_active() {
            self.hits.insert(ev.hazard_id, now);
            log::info!("hazard '{}' absorbed by slow-time", ev.name);
            return Some(ContactOutcome::AbsorbedBySlowTime);
        }

        if status.consume_shield() {
            self.hits.insert(ev.hazard_id, now);
            log::info!("hazard '{}' absorbed by shield", ev.name);
            return Some(ContactOutcome::AbsorbedByShield);
        }

        if status.consume_extra_life() {
            self.hits.insert(ev.hazard_id, now);
            if self.cfg.invulnerability_window > 0.0 {
                status.set_invulnerable_until(now + self.cfg.invulnerability_window as f64);
            }
            log::info!("hazard '{}' consumed an extra life", ev.name);
            return Some(ContactOutcome::LifeConsumed);
        }

        self.hits.insert(ev.hazard_id, now);
        self.is_dead = true;
        Some(ContactOutcome::Death)
    }

    /// Drop cooldown state for an object that left the world.
    pub fn forget(&mut self, id: HazardId) {
        self.hits.remove(&id);
    }

    pub fn reset(&mut self) {
        self.hits.clear();
        self.is_dead = false;
    }
}
