//! Headless demo runner
//!
//! Drives a run with a synthetic broad-phase: any track entity crossing the
//! viewpoint line becomes either a contact report (obstacles) or a pickup
//! collection. Useful for eyeballing the simulation with `RUST_LOG=info`.

use lane_runner::scores::{self, MemoryScoreStore};
use lane_runner::sim::{ContactEvent, ContactKind, EntityKind, ShapeHint};
use lane_runner::{RunConfig, RunContext, RunEvent, consts};

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_RUN_SECONDS: f32 = 60.0;
/// Half-depth of the synthetic contact band around the viewpoint
const CONTACT_BAND: f32 = 0.5;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);

    let mut run = match RunContext::new(RunConfig::default(), seed) {
        Ok(run) => run,
        Err(err) => {
            log::error!("invalid run configuration: {err}");
            std::process::exit(1);
        }
    };

    let mut accumulator = 0.0f32;
    let mut elapsed = 0.0f32;
    while elapsed < MAX_RUN_SECONDS && !run.is_dead() {
        elapsed += FRAME_DT;
        accumulator += FRAME_DT;

        let (contacts, pickups) = scan_viewpoint_band(&run);
        for id in pickups {
            run.collect_pickup(id);
        }

        let mut substeps = 0;
        let mut frame_contacts = contacts.as_slice();
        while accumulator >= consts::SIM_DT && substeps < consts::MAX_SUBSTEPS {
            run.tick(consts::SIM_DT, frame_contacts);
            frame_contacts = &[];
            accumulator -= consts::SIM_DT;
            substeps += 1;
        }

        for event in run.drain_events() {
            match event {
                RunEvent::LivesChanged(lives) => log::info!("lives: {lives}"),
                RunEvent::PowerUpActivated(kind) => log::info!("power-up: {kind:?}"),
                RunEvent::ContactResolved { hazard_id, outcome } => {
                    log::info!("contact #{hazard_id}: {outcome:?}")
                }
                RunEvent::Death => log::info!("death"),
            }
        }
    }

    let summary = run.summary();
    println!(
        "run finished: {:.1}m traveled, {} extra lives, {}",
        summary.distance_traveled,
        summary.extra_lives,
        if summary.dead { "dead" } else { "survived" }
    );

    let mut store = MemoryScoreStore::new();
    let distance = summary.distance_traveled as i64;
    if let Some(rank) = scores::record_best_score(&mut store, distance) {
        println!("score {distance} ranked #{rank}");
    }
    scores::record_best_distance(&mut store, distance);
}

/// Synthetic broad-phase: obstacles in the band become contact events,
/// pickups in the band are collected.
fn scan_viewpoint_band(run: &RunContext) -> (Vec<ContactEvent>, Vec<u64>) {
    let mut contacts = Vec::new();
    let mut pickups = Vec::new();
    for entity in run.spawner().entities() {
        if entity.position.z.abs() > CONTACT_BAND {
            continue;
        }
        match entity.kind {
            EntityKind::Obstacle => contacts.push(ContactEvent {
                hazard_id: entity.id,
                name: format!("obstacle_{}", entity.id),
                tags: vec!["Obstacle".to_string()],
                layer: 0,
                shape: ShapeHint::Box,
                kind: ContactKind::Collision,
            }),
            EntityKind::ShieldPickup | EntityKind::SlowTimePickup => pickups.push(entity.id),
        }
    }
    (contacts, pickups)
}
