use std::collections::BTreeMap;

use bevy::{math::Vec2, prelude::Resource};
use tracing::trace;

use crate::{
    config::AiConfig,
    faction::FactionId,
    host::{Host, HostId},
    manager::SnatcherManager,
    services::{Navigation, SpatialQuery},
};

#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub shot_cooldown: f32,
    pub target_max_distance: f32,
    pub shot_min_distance: f32,
    pub shot_max_distance: f32,
    pub retarget_interval: f32,
}

impl AiSettings {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            shot_cooldown: config.shot_cooldown_seconds.max(0.0),
            target_max_distance: config.target_max_distance,
            shot_min_distance: config.shot_min_distance,
            shot_max_distance: config.shot_max_distance,
            retarget_interval: config.retarget_interval_seconds.max(0.0),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

/// What the pilot wants done with its body this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiDecision {
    Idle,
    Pursue(HostId),
    /// Shoot the snatcher out along `direction`.
    Fire { direction: Vec2 },
}

/// Flies whichever host an AI faction currently occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct AiPilot {
    faction: FactionId,
    target: Option<HostId>,
    retarget_timer: f32,
    shot_timer: f32,
    bound_host: Option<HostId>,
}

impl AiPilot {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            target: None,
            retarget_timer: 0.0,
            shot_timer: 0.0,
            bound_host: None,
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn target(&self) -> Option<HostId> {
        self.target
    }

    pub fn bound_host(&self) -> Option<HostId> {
        self.bound_host
    }

    /// A host worth jumping into: alive, empty, and not already scored by
    /// this faction.
    pub fn is_valid_target(&self, host: &Host) -> bool {
        !host.is_decayed() && host.occupant().is_none() && host.claimed_by() != Some(self.faction)
    }

    pub fn tick<W>(
        &mut self,
        dt: f32,
        manager: &SnatcherManager,
        world: &mut W,
        settings: &AiSettings,
    ) -> AiDecision
    where
        W: Navigation + SpatialQuery + ?Sized,
    {
        let Some(body) = manager.slot(self.faction).and_then(|slot| slot.current_host()) else {
            self.bound_host = None;
            self.target = None;
            return AiDecision::Idle;
        };

        if self.bound_host != Some(body) {
            self.bound_host = Some(body);
            self.target = None;
            self.retarget_timer = 0.0;
            self.shot_timer = settings.shot_cooldown;
        }

        self.shot_timer = (self.shot_timer - dt).max(0.0);
        self.retarget_timer -= dt;

        let target_still_valid = self
            .target
            .and_then(|target| manager.host(target))
            .map(|host| self.is_valid_target(host))
            .unwrap_or(false);
        if !target_still_valid || self.retarget_timer <= 0.0 {
            self.target = self.choose_target(body, manager, world, settings);
            self.retarget_timer = settings.retarget_interval;
        }

        let Some(target) = self.target else {
            return AiDecision::Idle;
        };
        let (Some(from), Some(to)) = (world.position(body), world.position(target)) else {
            return AiDecision::Idle;
        };

        let distance = from.distance(to);
        let in_band =
            distance >= settings.shot_min_distance && distance <= settings.shot_max_distance;
        if in_band
            && self.shot_timer <= 0.0
            && world.ray_hits(body, target, settings.shot_max_distance)
        {
            self.shot_timer = settings.shot_cooldown;
            trace!(
                target: "snatch::ai",
                faction = %self.faction,
                host = %body,
                target_host = %target,
                distance,
                "ai.fire"
            );
            return AiDecision::Fire {
                direction: (to - from).normalize_or_zero(),
            };
        }

        world.set_destination(body, to);
        AiDecision::Pursue(target)
    }

    fn choose_target<W>(
        &self,
        body: HostId,
        manager: &SnatcherManager,
        world: &W,
        settings: &AiSettings,
    ) -> Option<HostId>
    where
        W: Navigation + SpatialQuery + ?Sized,
    {
        let origin = world.position(body)?;
        manager
            .hosts()
            .iter()
            .filter(|host| host.id() != body && self.is_valid_target(host))
            .filter_map(|host| {
                let distance = origin.distance(world.position(host.id())?);
                (distance <= settings.target_max_distance).then_some((host.id(), distance))
            })
            .filter(|(id, _)| world.is_reachable(body, *id))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

/// One pilot per AI-controlled faction.
#[derive(Resource, Debug, Clone, Default)]
pub struct AiPilots {
    settings: AiSettings,
    pilots: BTreeMap<FactionId, AiPilot>,
}

impl AiPilots {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            settings,
            pilots: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, faction: FactionId) {
        self.pilots.insert(faction, AiPilot::new(faction));
    }

    pub fn get(&self, faction: FactionId) -> Option<&AiPilot> {
        self.pilots.get(&faction)
    }

    pub fn len(&self) -> usize {
        self.pilots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pilots.is_empty()
    }

    /// Runs every pilot once and returns the factions that decided to fire.
    pub fn tick<W>(
        &mut self,
        dt: f32,
        manager: &SnatcherManager,
        world: &mut W,
    ) -> Vec<(FactionId, Vec2)>
    where
        W: Navigation + SpatialQuery + ?Sized,
    {
        let settings = &self.settings;
        self.pilots
            .values_mut()
            .filter_map(|pilot| match pilot.tick(dt, manager, world, settings) {
                AiDecision::Fire { direction } => Some((pilot.faction, direction)),
                AiDecision::Idle | AiDecision::Pursue(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::manager::MatchRules;

    #[derive(Default)]
    struct OpenField {
        positions: HashMap<HostId, Vec2>,
        destinations: HashMap<HostId, Vec2>,
        walls: HashSet<HostId>,
    }

    impl Navigation for OpenField {
        fn place_host(&mut self, host: HostId, position: Vec2) {
            self.positions.insert(host, position);
        }

        fn position(&self, host: HostId) -> Option<Vec2> {
            self.positions.get(&host).copied()
        }

        fn set_destination(&mut self, host: HostId, destination: Vec2) {
            self.destinations.insert(host, destination);
        }

        fn has_arrived(&self, _host: HostId) -> bool {
            true
        }

        fn has_complete_path(&self, _host: HostId, _destination: Vec2) -> bool {
            true
        }

        fn stop(&mut self, host: HostId) {
            self.destinations.remove(&host);
        }

        fn deactivate(&mut self, host: HostId) {
            self.positions.remove(&host);
        }
    }

    impl SpatialQuery for OpenField {
        fn is_reachable(&self, _from: HostId, to: HostId) -> bool {
            !self.walls.contains(&to)
        }

        fn ray_hits(&self, from: HostId, target: HostId, max_distance: f32) -> bool {
            match (self.position(from), self.position(target)) {
                (Some(a), Some(b)) => a.distance(b) <= max_distance,
                _ => false,
            }
        }
    }

    /// Faction 1 owns host 0 at the origin; neutral hosts 1 and 2 wait at
    /// x = 5 and x = 20.
    fn scene() -> (SnatcherManager, OpenField) {
        let mut manager = SnatcherManager::new(MatchRules::default());
        let mut field = OpenField::default();
        for (zone, x) in [(1, 0.0), (2, 5.0), (3, 20.0)] {
            let id = manager.register_host(FactionId(zone));
            field.place_host(id, Vec2::new(x, 0.0));
        }
        manager.assign_initial_hosts(&mut ChaCha8Rng::seed_from_u64(3));
        (manager, field)
    }

    fn settings() -> AiSettings {
        AiSettings {
            shot_cooldown: 1.0,
            target_max_distance: 25.0,
            shot_min_distance: 3.0,
            shot_max_distance: 10.0,
            retarget_interval: 0.5,
        }
    }

    #[test]
    fn idles_when_every_host_is_occupied() {
        let (manager, mut field) = scene();
        let mut pilot = AiPilot::new(FactionId(1));
        let settings = settings();

        // Hosts 1 and 2 are occupied by factions 2 and 3, so nothing is valid.
        assert_eq!(pilot.tick(0.1, &manager, &mut field, &settings), AiDecision::Idle);
        assert_eq!(pilot.bound_host(), Some(HostId(0)));
    }

    #[test]
    fn fires_once_cooldown_elapses_inside_the_band() {
        let mut manager = SnatcherManager::new(MatchRules::default());
        let mut field = OpenField::default();
        let own = manager.register_host(FactionId(1));
        field.place_host(own, Vec2::ZERO);
        let spare = manager.register_host(FactionId(1));
        field.place_host(spare, Vec2::new(6.0, 0.0));
        let far = manager.register_host(FactionId(1));
        field.place_host(far, Vec2::new(9.0, 0.0));
        manager.assign_initial_hosts(&mut ChaCha8Rng::seed_from_u64(11));

        let body = manager
            .slot(FactionId(1))
            .and_then(|slot| slot.current_host())
            .expect("faction 1 spawned");
        let mut pilot = AiPilot::new(FactionId(1));
        let settings = settings();

        let first = pilot.tick(0.25, &manager, &mut field, &settings);
        assert!(matches!(first, AiDecision::Pursue(_)), "cooldown starts on binding");
        assert!(field.destinations.contains_key(&body));

        let mut fired = None;
        for _ in 0..4 {
            if let AiDecision::Fire { direction } = pilot.tick(0.25, &manager, &mut field, &settings) {
                fired = Some(direction);
                break;
            }
        }
        let direction = fired.expect("fires within the cooldown window");
        assert!((direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn skips_unreachable_and_self_claimed_hosts() {
        let (mut manager, mut field) = scene();
        let mut pilot = AiPilot::new(FactionId(2));
        let settings = settings();

        // Faction 1 vacates host 0 and claims it; it is valid for faction 2.
        assert_eq!(manager.on_snatcher_shot(FactionId(1)), Some(HostId(0)));
        pilot.tick(0.1, &manager, &mut field, &settings);
        assert_eq!(pilot.target(), Some(HostId(0)));

        let mut walled = AiPilot::new(FactionId(2));
        field.walls.insert(HostId(0));
        walled.tick(0.1, &manager, &mut field, &settings);
        assert_eq!(walled.target(), None);

        let claimer = AiPilot::new(FactionId(1));
        let host = manager.host(HostId(0)).expect("registered");
        assert!(!claimer.is_valid_target(host));
    }

    #[test]
    fn losing_the_body_clears_the_binding() {
        let (mut manager, mut field) = scene();
        let mut pilot = AiPilot::new(FactionId(3));
        let settings = settings();
        pilot.tick(0.1, &manager, &mut field, &settings);
        assert_eq!(pilot.bound_host(), Some(HostId(2)));

        manager.on_snatcher_shot(FactionId(3));
        assert_eq!(pilot.tick(0.1, &manager, &mut field, &settings), AiDecision::Idle);
        assert_eq!(pilot.bound_host(), None);
    }
}
