use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    ai::{AiPilots, AiSettings},
    config::MatchConfig,
    faction::FactionId,
    layout::ArenaLayout,
    manager::{MatchRules, SnatcherManager},
    reservation::WanderPoints,
    services::Navigation,
    wander::{WanderSettings, Wanderers},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("arena layout has no spawn points")]
    NoSpawnPoints,
    #[error("spawn.host_count is zero, nothing to possess")]
    NoHosts,
    #[error("placement point {index} names zone {zone}, expected 1..=4")]
    InvalidZone { index: usize, zone: u8 },
}

/// Everything a fresh match starts from.
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub manager: SnatcherManager,
    pub points: WanderPoints,
    pub wanderers: Wanderers,
    pub pilots: AiPilots,
}

/// Builds the wander points, spawns hosts on a shuffled subset of the
/// placement points and hands every faction its first host.
///
/// The layout is checked up front, so an error leaves `world` untouched.
pub fn prepare_match<N, R>(
    config: &MatchConfig,
    layout: &ArenaLayout,
    world: &mut N,
    rng: &mut R,
) -> Result<MatchSetup, SetupError>
where
    N: Navigation + ?Sized,
    R: Rng + ?Sized,
{
    if layout.points.is_empty() {
        return Err(SetupError::NoSpawnPoints);
    }
    if config.spawn.host_count == 0 {
        return Err(SetupError::NoHosts);
    }
    let zones = layout
        .points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            FactionId::new(point.zone).ok_or(SetupError::InvalidZone {
                index,
                zone: point.zone,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut points = WanderPoints::default();
    for (point, zone) in layout.points.iter().zip(&zones) {
        points.insert(
            point.position,
            *zone,
            point.capacity.max(1),
            point.reservation_timeout,
        );
    }

    let requested = config.spawn.host_count as usize;
    if requested > layout.points.len() {
        warn!(
            target: "snatch::setup",
            requested,
            available = layout.points.len(),
            "spawn.points_short"
        );
    }
    let mut order: Vec<usize> = (0..layout.points.len()).collect();
    order.shuffle(rng);
    order.truncate(requested);

    let mut manager = SnatcherManager::new(MatchRules::from_config(config));
    let mut wanderers = Wanderers::new(WanderSettings::from_config(&config.wander));
    for index in order {
        let zone = zones[index];
        let host = manager.register_host(zone);
        world.place_host(host, layout.points[index].position);
        wanderers.insert(host, zone);
    }

    let mut pilots = AiPilots::new(AiSettings::from_config(&config.ai));
    for faction in FactionId::ALL {
        if manager.rules().human != Some(faction) {
            pilots.insert(faction);
        }
    }

    manager.assign_initial_hosts(rng);
    info!(
        target: "snatch::setup",
        hosts = manager.hosts().len(),
        wander_points = points.len(),
        human = ?manager.rules().human.map(|f| f.0),
        "match.prepared"
    );

    Ok(MatchSetup {
        manager,
        points,
        wanderers,
        pilots,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bevy::math::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{host::HostId, layout::PlacementPoint, manager::MatchPhase};

    #[derive(Default)]
    struct Placements(HashMap<HostId, Vec2>);

    impl Navigation for Placements {
        fn place_host(&mut self, host: HostId, position: Vec2) {
            self.0.insert(host, position);
        }

        fn position(&self, host: HostId) -> Option<Vec2> {
            self.0.get(&host).copied()
        }

        fn set_destination(&mut self, _host: HostId, _destination: Vec2) {}

        fn has_arrived(&self, _host: HostId) -> bool {
            true
        }

        fn has_complete_path(&self, _host: HostId, _destination: Vec2) -> bool {
            true
        }

        fn stop(&mut self, _host: HostId) {}

        fn deactivate(&mut self, _host: HostId) {}
    }

    fn config(hosts: u32) -> MatchConfig {
        let mut config = MatchConfig::default();
        config.spawn.host_count = hosts;
        config
    }

    #[test]
    fn spawns_hosts_and_starts_the_match() {
        let layout = ArenaLayout::quadrants(20.0, 5, 0.0, 3);
        let mut world = Placements::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let setup = prepare_match(&config(12), &layout, &mut world, &mut rng).expect("valid");
        assert_eq!(setup.manager.hosts().len(), 12);
        assert_eq!(world.0.len(), 12);
        assert_eq!(setup.points.len(), 20);
        assert_eq!(setup.wanderers.len(), 12);
        assert_eq!(setup.manager.phase(), MatchPhase::Running);
        // Zone 4 is human in the default config.
        assert_eq!(setup.pilots.len(), 3);
        assert!(setup.pilots.get(FactionId(4)).is_none());
    }

    #[test]
    fn caps_hosts_at_the_number_of_points() {
        let layout = ArenaLayout::quadrants(20.0, 2, 0.0, 3);
        let mut world = Placements::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let setup = prepare_match(&config(50), &layout, &mut world, &mut rng).expect("valid");
        assert_eq!(setup.manager.hosts().len(), 8);
    }

    #[test]
    fn rejects_missing_and_malformed_placements() {
        let mut world = Placements::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let empty = ArenaLayout {
            points: Vec::new(),
            ..ArenaLayout::default()
        };
        assert_eq!(
            prepare_match(&config(4), &empty, &mut world, &mut rng).err(),
            Some(SetupError::NoSpawnPoints)
        );

        let layout = ArenaLayout::quadrants(20.0, 2, 0.0, 3);
        assert_eq!(
            prepare_match(&config(0), &layout, &mut world, &mut rng).err(),
            Some(SetupError::NoHosts)
        );

        let mut bad = ArenaLayout::quadrants(20.0, 1, 0.0, 3);
        bad.points.push(PlacementPoint {
            position: Vec2::ZERO,
            zone: 7,
            capacity: 1,
            reservation_timeout: 0.0,
        });
        assert_eq!(
            prepare_match(&config(4), &bad, &mut world, &mut rng).err(),
            Some(SetupError::InvalidZone { index: 4, zone: 7 })
        );
        assert!(world.0.is_empty(), "no partial placement on error");
    }
}
