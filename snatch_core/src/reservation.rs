use bevy::{math::Vec2, prelude::Resource};
use serde::{Deserialize, Serialize};

use crate::faction::{FactionId, FACTION_COUNT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WanderPointId(pub u32);

/// A capacity-limited destination that wandering hosts reserve before they
/// travel to it.
///
/// `try_reserve` / `release` run on the single frame thread, so each call is
/// an uninterrupted test-and-update from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct WanderPoint {
    id: WanderPointId,
    position: Vec2,
    zone: FactionId,
    capacity: u32,
    reservation_timeout: Option<f32>,
    reserved: u32,
    held_since: Option<f32>,
}

impl WanderPoint {
    pub fn new(id: WanderPointId, position: Vec2, zone: FactionId) -> Self {
        Self {
            id,
            position,
            zone,
            capacity: 1,
            reservation_timeout: None,
            reserved: 0,
            held_since: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Reservations older than `seconds` are force-cleared by
    /// [`WanderPoint::expire_stale`]. Non-positive values disable expiry.
    pub fn with_reservation_timeout(mut self, seconds: f32) -> Self {
        self.reservation_timeout = (seconds > 0.0).then_some(seconds);
        self
    }

    pub fn id(&self) -> WanderPointId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn zone(&self) -> FactionId {
        self.zone
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    pub fn is_available(&self) -> bool {
        self.reserved < self.capacity
    }

    pub fn try_reserve(&mut self, now: f32) -> bool {
        if !self.is_available() {
            return false;
        }
        if self.reserved == 0 {
            self.held_since = Some(now);
        }
        self.reserved += 1;
        true
    }

    pub fn release(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
        if self.reserved == 0 {
            self.held_since = None;
        }
    }

    /// Clears every reservation once the current holding period has lasted
    /// the timeout. Returns `true` when something was cleared.
    pub fn expire_stale(&mut self, now: f32) -> bool {
        let (Some(timeout), Some(since)) = (self.reservation_timeout, self.held_since) else {
            return false;
        };
        if self.reserved == 0 || now - since < timeout {
            return false;
        }
        self.reserved = 0;
        self.held_since = None;
        true
    }
}

/// Every wander point in the arena, created once at setup.
#[derive(Resource, Debug, Clone, Default)]
pub struct WanderPoints {
    points: Vec<WanderPoint>,
    by_zone: [Vec<WanderPointId>; FACTION_COUNT],
}

impl WanderPoints {
    pub fn insert(
        &mut self,
        position: Vec2,
        zone: FactionId,
        capacity: u32,
        reservation_timeout: f32,
    ) -> WanderPointId {
        let id = WanderPointId(self.points.len() as u32);
        self.points.push(
            WanderPoint::new(id, position, zone)
                .with_capacity(capacity)
                .with_reservation_timeout(reservation_timeout),
        );
        if let Some(index) = zone.index() {
            self.by_zone[index].push(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: WanderPointId) -> Option<&WanderPoint> {
        self.points.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: WanderPointId) -> Option<&mut WanderPoint> {
        self.points.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WanderPoint> {
        self.points.iter()
    }

    pub fn in_zone(&self, zone: FactionId) -> &[WanderPointId] {
        zone.index()
            .map(|index| self.by_zone[index].as_slice())
            .unwrap_or(&[])
    }

    pub fn release(&mut self, id: WanderPointId) {
        if let Some(point) = self.get_mut(id) {
            point.release();
        }
    }

    pub fn reserved_total(&self) -> u32 {
        self.points.iter().map(WanderPoint::reserved).sum()
    }

    /// Runs the timeout sweep over every point; returns how many were cleared.
    pub fn expire_stale(&mut self, now: f32) -> usize {
        self.points
            .iter_mut()
            .filter_map(|point| point.expire_stale(now).then_some(point.id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> WanderPoint {
        WanderPoint::new(WanderPointId(0), Vec2::ZERO, FactionId(1))
    }

    #[test]
    fn second_reservation_waits_for_release() {
        let mut point = point();
        assert!(point.try_reserve(0.0), "agent X reserves");
        assert!(!point.try_reserve(0.1), "agent Y is refused while X holds");
        assert_eq!(point.reserved(), 1);
        point.release();
        assert!(point.try_reserve(0.2), "agent Y succeeds after release");
    }

    #[test]
    fn release_is_floored_at_zero() {
        let mut point = point().with_capacity(2);
        point.release();
        assert_eq!(point.reserved(), 0);
        assert!(point.try_reserve(0.0));
        assert!(point.try_reserve(0.0));
        assert!(!point.is_available());
        point.release();
        point.release();
        point.release();
        assert_eq!(point.reserved(), 0);
        assert!(point.is_available());
    }

    #[test]
    fn timeout_clears_abandoned_reservations() {
        let mut point = point().with_capacity(2).with_reservation_timeout(5.0);
        assert!(point.try_reserve(1.0));
        assert!(point.try_reserve(3.0));
        assert!(!point.expire_stale(5.9), "measured from the first reservation");
        assert!(point.expire_stale(6.0));
        assert_eq!(point.reserved(), 0);
        assert!(!point.expire_stale(100.0), "nothing held, nothing to clear");
    }

    #[test]
    fn release_to_zero_restarts_the_holding_period() {
        let mut point = point().with_reservation_timeout(2.0);
        assert!(point.try_reserve(0.0));
        point.release();
        assert!(point.try_reserve(10.0));
        assert!(!point.expire_stale(11.0));
        assert!(point.expire_stale(12.0));
    }

    #[test]
    fn zero_timeout_never_expires() {
        let mut point = point().with_reservation_timeout(0.0);
        assert!(point.try_reserve(0.0));
        assert!(!point.expire_stale(1_000.0));
        assert_eq!(point.reserved(), 1);
    }

    #[test]
    fn registry_indexes_zones() {
        let mut points = WanderPoints::default();
        let a = points.insert(Vec2::new(1.0, 1.0), FactionId(2), 1, 0.0);
        let b = points.insert(Vec2::new(2.0, 1.0), FactionId(2), 3, 0.0);
        points.insert(Vec2::new(3.0, 1.0), FactionId(4), 1, 0.0);
        assert_eq!(points.in_zone(FactionId(2)), &[a, b]);
        assert_eq!(points.get(b).map(WanderPoint::capacity), Some(3));
        assert!(points.get_mut(a).map(|p| p.try_reserve(0.0)).unwrap_or(false));
        assert_eq!(points.reserved_total(), 1);
        points.release(a);
        assert_eq!(points.reserved_total(), 0);
    }
}
