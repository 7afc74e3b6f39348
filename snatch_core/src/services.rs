//! Interfaces to the collaborators that own locomotion, spatial queries and
//! projectile physics. The engine only makes decisions through these.

use bevy::{math::Vec2, prelude::Resource};

use crate::{host::HostId, projectile::ProjectileId};

/// Movement and navigation for host bodies.
pub trait Navigation {
    /// Registers a freshly spawned host body at `position`.
    fn place_host(&mut self, host: HostId, position: Vec2);

    fn position(&self, host: HostId) -> Option<Vec2>;

    fn set_destination(&mut self, host: HostId, destination: Vec2);

    /// Within stopping tolerance of the current destination, or idle.
    fn has_arrived(&self, host: HostId) -> bool;

    fn has_complete_path(&self, host: HostId, destination: Vec2) -> bool;

    fn stop(&mut self, host: HostId);

    /// Removes the body's movement, collision and visual presence for good.
    fn deactivate(&mut self, host: HostId);
}

/// Spatial and line-of-sight queries between host bodies.
pub trait SpatialQuery {
    fn is_reachable(&self, from: HostId, to: HostId) -> bool;

    /// Whether a ray from `from` toward `target` reaches it within
    /// `max_distance` without striking another body first.
    fn ray_hits(&self, from: HostId, target: HostId, max_distance: f32) -> bool;
}

/// What a projectile touched during one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Host(HostId),
    /// Anything that is not a host body.
    Obstacle,
}

/// Ballistic bodies for fired projectiles.
pub trait ProjectilePhysics {
    fn launch(&mut self, projectile: ProjectileId, source: HostId, direction: Vec2, speed: f32);

    /// Moves the projectile by `dt` and returns its contacts in travel order.
    fn advance(&mut self, projectile: ProjectileId, dt: f32) -> Vec<Contact>;

    fn despawn(&mut self, projectile: ProjectileId);
}

/// Everything the engine needs from the world it runs in.
pub trait MatchWorld: Navigation + SpatialQuery + ProjectilePhysics + Send + Sync {
    /// Advances locomotion by one frame.
    fn step(&mut self, _dt: f32) {}
}

/// The world collaborator installed in the app.
#[derive(Resource)]
pub struct WorldLink(Box<dyn MatchWorld>);

impl WorldLink {
    pub fn new(world: Box<dyn MatchWorld>) -> Self {
        Self(world)
    }

    pub fn get(&self) -> &dyn MatchWorld {
        self.0.as_ref()
    }

    pub fn get_mut(&mut self) -> &mut dyn MatchWorld {
        self.0.as_mut()
    }
}
