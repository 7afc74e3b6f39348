use bevy::prelude::*;
use serde::Serialize;

use crate::{
    faction::{FactionId, FACTION_COUNT},
    manager::{MatchPhase, SnatcherManager},
    projectile::Projectiles,
    registry::HostCensus,
    reservation::WanderPoints,
    resources::MatchClock,
};

#[derive(Resource, Debug, Clone, Serialize)]
pub struct MatchMetrics {
    pub frame: u64,
    pub census: HostCensus,
    pub claims: [u32; FACTION_COUNT],
    pub alive: [bool; FACTION_COUNT],
    pub in_flight: [bool; FACTION_COUNT],
    pub reserved_points: u32,
    pub projectiles_in_flight: usize,
    pub phase: MatchPhase,
}

impl Default for MatchMetrics {
    fn default() -> Self {
        Self {
            frame: 0,
            census: HostCensus::default(),
            claims: [0; FACTION_COUNT],
            alive: [false; FACTION_COUNT],
            in_flight: [false; FACTION_COUNT],
            reserved_points: 0,
            projectiles_in_flight: 0,
            phase: MatchPhase::Pending,
        }
    }
}

pub fn collect_metrics(
    clock: Res<MatchClock>,
    manager: Res<SnatcherManager>,
    points: Res<WanderPoints>,
    projectiles: Res<Projectiles>,
    mut metrics: ResMut<MatchMetrics>,
) {
    metrics.frame = clock.frame;
    metrics.census = manager.hosts().census();
    metrics.claims = FactionId::ALL.map(|faction| manager.claim_count(faction));
    for slot in manager.slots() {
        if let Some(index) = slot.faction().index() {
            metrics.alive[index] = slot.is_alive();
            metrics.in_flight[index] = slot.is_in_flight();
        }
    }
    metrics.reserved_points = points.reserved_total();
    metrics.projectiles_in_flight = projectiles.len();
    metrics.phase = manager.phase();
}
