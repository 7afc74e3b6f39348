use std::collections::BTreeMap;

use bevy::{math::Vec2, prelude::Resource};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::ProjectileConfig,
    events::DeathCause,
    faction::FactionId,
    host::HostId,
    manager::SnatcherManager,
    services::{Contact, ProjectilePhysics},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Lifetime ran out without touching anything.
    Expired,
    Obstacle,
    /// Hit a host the firer may not possess.
    Rejected(HostId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileOutcome {
    Possessed { host: HostId },
    Missed(MissReason),
}

/// A fired snatcher in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    id: ProjectileId,
    firing_faction: FactionId,
    source_host: HostId,
    resolved: bool,
    remaining_lifetime: f32,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        firing_faction: FactionId,
        source_host: HostId,
        lifetime: f32,
    ) -> Self {
        Self {
            id,
            firing_faction,
            source_host,
            resolved: false,
            remaining_lifetime: lifetime,
        }
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn firing_faction(&self) -> FactionId {
        self.firing_faction
    }

    pub fn source_host(&self) -> HostId {
        self.source_host
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn remaining_lifetime(&self) -> f32 {
        self.remaining_lifetime
    }

    /// Settles this frame's contacts, then the lifetime. The first qualifying
    /// event wins; once resolved, every later call returns `None`.
    pub fn resolve(
        &mut self,
        contacts: &[Contact],
        dt: f32,
        manager: &mut SnatcherManager,
    ) -> Option<ProjectileOutcome> {
        if self.resolved {
            return None;
        }

        let mut outcome = None;
        for contact in contacts {
            match *contact {
                Contact::Host(host) if host == self.source_host => continue,
                Contact::Host(host) => {
                    outcome = Some(if manager.possess_host(self.firing_faction, host) {
                        ProjectileOutcome::Possessed { host }
                    } else {
                        ProjectileOutcome::Missed(MissReason::Rejected(host))
                    });
                }
                Contact::Obstacle => {
                    outcome = Some(ProjectileOutcome::Missed(MissReason::Obstacle));
                }
            }
            break;
        }

        if outcome.is_none() {
            self.remaining_lifetime -= dt;
            if self.remaining_lifetime <= 0.0 {
                outcome = Some(ProjectileOutcome::Missed(MissReason::Expired));
            }
        }

        let outcome = outcome?;
        self.resolved = true;
        if let ProjectileOutcome::Missed(_) = outcome {
            manager.kill_snatcher(self.firing_faction, DeathCause::Missed);
        }
        Some(outcome)
    }
}

/// Every projectile in flight.
#[derive(Resource, Debug, Clone)]
pub struct Projectiles {
    speed: f32,
    lifetime: f32,
    next_id: u32,
    live: BTreeMap<ProjectileId, Projectile>,
}

impl Default for Projectiles {
    fn default() -> Self {
        Self::from_config(&ProjectileConfig::default())
    }
}

impl Projectiles {
    pub fn from_config(config: &ProjectileConfig) -> Self {
        Self {
            speed: config.speed,
            lifetime: config.lifetime_seconds,
            next_id: 0,
            live: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.live.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.live.values()
    }

    pub fn in_flight_for(&self, faction: FactionId) -> Option<&Projectile> {
        self.live
            .values()
            .find(|projectile| projectile.firing_faction == faction)
    }

    /// Shoots the faction's snatcher out of its host along `direction`.
    ///
    /// Returns `None` when the faction holds no host to shoot from.
    pub fn fire<P: ProjectilePhysics + ?Sized>(
        &mut self,
        faction: FactionId,
        direction: Vec2,
        manager: &mut SnatcherManager,
        physics: &mut P,
    ) -> Option<ProjectileId> {
        let source = manager.on_snatcher_shot(faction)?;
        let id = ProjectileId(self.next_id);
        self.next_id += 1;

        physics.launch(id, source, direction, self.speed);
        self.live
            .insert(id, Projectile::new(id, faction, source, self.lifetime));
        debug!(
            target: "snatch::projectile",
            projectile = id.0,
            faction = %faction,
            source = %source,
            "projectile.fired"
        );
        Some(id)
    }

    /// Advances every projectile and resolves the ones that hit or expired.
    pub fn step<P: ProjectilePhysics + ?Sized>(
        &mut self,
        dt: f32,
        manager: &mut SnatcherManager,
        physics: &mut P,
    ) -> Vec<(ProjectileId, ProjectileOutcome)> {
        let mut settled = Vec::new();
        for (id, projectile) in self.live.iter_mut() {
            let contacts = physics.advance(*id, dt);
            if let Some(outcome) = projectile.resolve(&contacts, dt, manager) {
                info!(
                    target: "snatch::projectile",
                    projectile = id.0,
                    faction = %projectile.firing_faction,
                    outcome = ?outcome,
                    "projectile.resolved"
                );
                settled.push((*id, outcome));
            }
        }

        for (id, _) in &settled {
            physics.despawn(*id);
            self.live.remove(id);
        }
        settled
    }
}
