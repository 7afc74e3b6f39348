//! A flat, obstacle-free stand-in for the game world: bodies steer in
//! straight lines, darts fly in straight lines, and the arena edge is the
//! only scenery.

use std::collections::BTreeMap;

use bevy::math::{Rect, Vec2};

use crate::{
    host::HostId,
    projectile::ProjectileId,
    services::{Contact, MatchWorld, Navigation, ProjectilePhysics, SpatialQuery},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SandboxTuning {
    pub host_speed: f32,
    pub body_radius: f32,
    pub stop_tolerance: f32,
}

impl Default for SandboxTuning {
    fn default() -> Self {
        Self {
            host_speed: 3.5,
            body_radius: 0.5,
            stop_tolerance: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Body {
    position: Vec2,
    destination: Option<Vec2>,
    active: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Dart {
    position: Vec2,
    velocity: Vec2,
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    bounds: Rect,
    tuning: SandboxTuning,
    bodies: BTreeMap<HostId, Body>,
    darts: BTreeMap<ProjectileId, Dart>,
}

impl SandboxWorld {
    pub fn new(bounds: Rect) -> Self {
        Self::with_tuning(bounds, SandboxTuning::default())
    }

    pub fn with_tuning(bounds: Rect, tuning: SandboxTuning) -> Self {
        Self {
            bounds,
            tuning,
            bodies: BTreeMap::new(),
            darts: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_active(&self, host: HostId) -> bool {
        self.bodies.get(&host).map(|b| b.active).unwrap_or(false)
    }

    pub fn active_bodies(&self) -> usize {
        self.bodies.values().filter(|b| b.active).count()
    }

    pub fn dart_position(&self, projectile: ProjectileId) -> Option<Vec2> {
        self.darts.get(&projectile).map(|d| d.position)
    }

    fn active_position(&self, host: HostId) -> Option<Vec2> {
        self.bodies
            .get(&host)
            .filter(|b| b.active)
            .map(|b| b.position)
    }

    /// Fraction along `start..end` where the segment first enters the circle,
    /// if it does.
    fn segment_entry(&self, start: Vec2, end: Vec2, center: Vec2) -> Option<f32> {
        let radius = self.tuning.body_radius;
        let travel = end - start;
        let length_sq = travel.length_squared();
        if length_sq <= f32::EPSILON {
            return (start.distance(center) <= radius).then_some(0.0);
        }
        let t = ((center - start).dot(travel) / length_sq).clamp(0.0, 1.0);
        let closest = start + travel * t;
        (closest.distance(center) <= radius).then_some(t)
    }
}

impl Navigation for SandboxWorld {
    fn place_host(&mut self, host: HostId, position: Vec2) {
        self.bodies.insert(
            host,
            Body {
                position,
                destination: None,
                active: true,
            },
        );
    }

    fn position(&self, host: HostId) -> Option<Vec2> {
        self.bodies.get(&host).map(|b| b.position)
    }

    fn set_destination(&mut self, host: HostId, destination: Vec2) {
        if let Some(body) = self.bodies.get_mut(&host).filter(|b| b.active) {
            body.destination = Some(destination);
        }
    }

    fn has_arrived(&self, host: HostId) -> bool {
        match self.bodies.get(&host) {
            Some(Body {
                destination: Some(destination),
                position,
                ..
            }) => position.distance(*destination) <= self.tuning.stop_tolerance,
            _ => true,
        }
    }

    fn has_complete_path(&self, _host: HostId, destination: Vec2) -> bool {
        self.bounds.contains(destination)
    }

    fn stop(&mut self, host: HostId) {
        if let Some(body) = self.bodies.get_mut(&host) {
            body.destination = None;
        }
    }

    fn deactivate(&mut self, host: HostId) {
        if let Some(body) = self.bodies.get_mut(&host) {
            body.active = false;
            body.destination = None;
        }
    }
}

impl SpatialQuery for SandboxWorld {
    fn is_reachable(&self, from: HostId, to: HostId) -> bool {
        self.active_position(from).is_some() && self.active_position(to).is_some()
    }

    fn ray_hits(&self, from: HostId, target: HostId, max_distance: f32) -> bool {
        let (Some(start), Some(end)) = (self.active_position(from), self.active_position(target))
        else {
            return false;
        };
        if start.distance(end) > max_distance {
            return false;
        }
        let Some(target_t) = self.segment_entry(start, end, end) else {
            return false;
        };
        !self.bodies.iter().any(|(id, body)| {
            *id != from
                && *id != target
                && body.active
                && self
                    .segment_entry(start, end, body.position)
                    .map(|t| t < target_t)
                    .unwrap_or(false)
        })
    }
}

impl ProjectilePhysics for SandboxWorld {
    fn launch(&mut self, projectile: ProjectileId, source: HostId, direction: Vec2, speed: f32) {
        let position = self.position(source).unwrap_or(Vec2::ZERO);
        self.darts.insert(
            projectile,
            Dart {
                position,
                velocity: direction.normalize_or_zero() * speed,
            },
        );
    }

    fn advance(&mut self, projectile: ProjectileId, dt: f32) -> Vec<Contact> {
        let Some(dart) = self.darts.get(&projectile).cloned() else {
            return vec![Contact::Obstacle];
        };
        let end = dart.position + dart.velocity * dt;

        let mut hits: Vec<(f32, HostId)> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.active)
            .filter_map(|(id, body)| {
                self.segment_entry(dart.position, end, body.position)
                    .map(|t| (t, *id))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut contacts: Vec<Contact> = hits.into_iter().map(|(_, id)| Contact::Host(id)).collect();
        if !self.bounds.contains(end) {
            contacts.push(Contact::Obstacle);
        }
        if let Some(dart) = self.darts.get_mut(&projectile) {
            dart.position = end;
        }
        contacts
    }

    fn despawn(&mut self, projectile: ProjectileId) {
        self.darts.remove(&projectile);
    }
}

impl MatchWorld for SandboxWorld {
    fn step(&mut self, dt: f32) {
        let max_step = self.tuning.host_speed * dt;
        for body in self.bodies.values_mut().filter(|b| b.active) {
            let Some(destination) = body.destination else {
                continue;
            };
            let offset = destination - body.position;
            let distance = offset.length();
            if distance <= max_step {
                body.position = destination;
            } else {
                body.position += offset / distance * max_step;
            }
        }
    }
}
