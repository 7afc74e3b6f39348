use std::collections::BTreeMap;

use bevy::prelude::Resource;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    config::WanderConfig,
    faction::FactionId,
    host::HostId,
    reservation::{WanderPointId, WanderPoints},
    services::Navigation,
};

/// Why a selection round came back empty. Not an error for the match: the
/// controller backs off and tries again next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickFailure {
    #[error("no sampled wander point belongs to the host's zone")]
    NoZoneMatch,
    #[error("every sampled point in the zone is fully reserved")]
    AllReserved,
    #[error("every available point sampled was closer than the minimum distance")]
    AllTooClose,
    #[error("an available point refused the reservation")]
    ReservationLost,
}

impl PickFailure {
    /// Summarises what both sampling passes saw. Zone misses outrank
    /// distance misses, which outrank full points.
    fn classify(saw_zone: bool, saw_available: bool, saw_too_close: bool) -> Self {
        if !saw_zone {
            PickFailure::NoZoneMatch
        } else if saw_too_close && saw_available {
            PickFailure::AllTooClose
        } else {
            PickFailure::AllReserved
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WanderSettings {
    pub min_destination_distance: f32,
    pub pick_attempts: u32,
    pub wait_min: f32,
    pub wait_max: f32,
    pub travel_timeout: f32,
    pub require_complete_path: bool,
}

impl WanderSettings {
    pub fn from_config(config: &WanderConfig) -> Self {
        Self {
            min_destination_distance: config.min_destination_distance.max(0.0),
            pick_attempts: config.pick_attempts.max(1),
            wait_min: config.wait_min_seconds.max(0.0),
            wait_max: config.wait_max_seconds.max(config.wait_min_seconds.max(0.0)),
            travel_timeout: config.travel_timeout_seconds,
            require_complete_path: config.require_complete_path,
        }
    }
}

impl Default for WanderSettings {
    fn default() -> Self {
        Self::from_config(&WanderConfig::default())
    }
}

/// Persisted position in the wander loop between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderPhase {
    /// Selecting: looks for a point on the next tick.
    Idle,
    Traveling { point: WanderPointId, elapsed: f32 },
    Waiting { point: WanderPointId, remaining: f32 },
    Disabled,
}

/// Shared state a controller needs for one tick.
pub struct WanderContext<'a, N: Navigation + ?Sized, R: Rng + ?Sized> {
    pub navigation: &'a mut N,
    pub points: &'a mut WanderPoints,
    pub rng: &'a mut R,
    pub settings: &'a WanderSettings,
    /// Match clock, used to timestamp reservations.
    pub now: f32,
}

/// Per-host loop: reserve a point in the host's zone, walk there, linger,
/// release, repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct WanderController {
    host: HostId,
    zone: FactionId,
    phase: WanderPhase,
    last_failure: Option<PickFailure>,
}

impl WanderController {
    pub fn new(host: HostId, zone: FactionId) -> Self {
        Self {
            host,
            zone,
            phase: WanderPhase::Idle,
            last_failure: None,
        }
    }

    pub fn host(&self) -> HostId {
        self.host
    }

    pub fn zone(&self) -> FactionId {
        self.zone
    }

    pub fn phase(&self) -> WanderPhase {
        self.phase
    }

    pub fn last_failure(&self) -> Option<PickFailure> {
        self.last_failure
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != WanderPhase::Disabled
    }

    pub fn reserved_point(&self) -> Option<WanderPointId> {
        match self.phase {
            WanderPhase::Traveling { point, .. } | WanderPhase::Waiting { point, .. } => {
                Some(point)
            }
            WanderPhase::Idle | WanderPhase::Disabled => None,
        }
    }

    pub fn enable(&mut self) {
        if self.phase == WanderPhase::Disabled {
            self.phase = WanderPhase::Idle;
        }
    }

    /// Halts the loop and gives back any held reservation on the spot.
    pub fn disable(&mut self, points: &mut WanderPoints) {
        if let Some(point) = self.reserved_point() {
            points.release(point);
            trace!(target: "snatch::wander", host = %self.host, point = point.0, "wander.force_released");
        }
        self.phase = WanderPhase::Disabled;
    }

    pub fn tick<N, R>(&mut self, dt: f32, ctx: &mut WanderContext<'_, N, R>)
    where
        N: Navigation + ?Sized,
        R: Rng + ?Sized,
    {
        match self.phase {
            WanderPhase::Disabled => {}
            WanderPhase::Idle => self.begin_trip(ctx),
            WanderPhase::Traveling { point, elapsed } => {
                let elapsed = elapsed + dt;
                let arrived = ctx.navigation.has_arrived(self.host);
                if arrived || elapsed >= ctx.settings.travel_timeout {
                    ctx.navigation.stop(self.host);
                    if !arrived {
                        debug!(target: "snatch::wander", host = %self.host, point = point.0, "wander.travel_timeout");
                    }
                    let settings = ctx.settings;
                    let remaining = if settings.wait_max > settings.wait_min {
                        ctx.rng.gen_range(settings.wait_min..settings.wait_max)
                    } else {
                        settings.wait_min
                    };
                    self.phase = WanderPhase::Waiting { point, remaining };
                } else {
                    self.phase = WanderPhase::Traveling { point, elapsed };
                }
            }
            WanderPhase::Waiting { point, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    ctx.points.release(point);
                    self.phase = WanderPhase::Idle;
                } else {
                    self.phase = WanderPhase::Waiting { point, remaining };
                }
            }
        }
    }

    fn begin_trip<N, R>(&mut self, ctx: &mut WanderContext<'_, N, R>)
    where
        N: Navigation + ?Sized,
        R: Rng + ?Sized,
    {
        let point = match self.select(ctx) {
            Ok(point) => point,
            Err(failure) => {
                trace!(target: "snatch::wander", host = %self.host, reason = %failure, "wander.pick_failed");
                self.last_failure = Some(failure);
                return;
            }
        };
        self.last_failure = None;

        let Some(destination) = ctx.points.get(point).map(|p| p.position()) else {
            return;
        };
        if ctx.settings.require_complete_path
            && !ctx.navigation.has_complete_path(self.host, destination)
        {
            ctx.points.release(point);
            debug!(target: "snatch::wander", host = %self.host, point = point.0, "wander.path_incomplete");
            return;
        }

        ctx.navigation.set_destination(self.host, destination);
        self.phase = WanderPhase::Traveling {
            point,
            elapsed: 0.0,
        };
    }

    /// Two sampling passes over every point: the first insists on the
    /// minimum distance, the second drops it.
    fn select<N, R>(&self, ctx: &mut WanderContext<'_, N, R>) -> Result<WanderPointId, PickFailure>
    where
        N: Navigation + ?Sized,
        R: Rng + ?Sized,
    {
        if ctx.points.is_empty() {
            return Err(PickFailure::NoZoneMatch);
        }
        let origin = ctx.navigation.position(self.host);
        let now = ctx.now;
        let mut saw_zone = false;
        let mut saw_available = false;
        let mut saw_too_close = false;

        for enforce_distance in [true, false] {
            for _ in 0..ctx.settings.pick_attempts {
                let id = WanderPointId(ctx.rng.gen_range(0..ctx.points.len()) as u32);
                let Some(candidate) = ctx.points.get(id) else {
                    continue;
                };
                if candidate.zone() != self.zone {
                    continue;
                }
                saw_zone = true;
                if !candidate.is_available() {
                    continue;
                }
                saw_available = true;
                if enforce_distance {
                    if let Some(origin) = origin {
                        if origin.distance(candidate.position())
                            < ctx.settings.min_destination_distance
                        {
                            saw_too_close = true;
                            continue;
                        }
                    }
                }
                let reserved = ctx
                    .points
                    .get_mut(id)
                    .map(|point| point.try_reserve(now))
                    .unwrap_or(false);
                if reserved {
                    return Ok(id);
                }
                return Err(PickFailure::ReservationLost);
            }
        }

        Err(PickFailure::classify(saw_zone, saw_available, saw_too_close))
    }
}

/// Wander controllers for every live host, keyed by host.
#[derive(Resource, Debug, Clone, Default)]
pub struct Wanderers {
    settings: WanderSettings,
    controllers: BTreeMap<HostId, WanderController>,
    frozen: bool,
}

impl Wanderers {
    pub fn new(settings: WanderSettings) -> Self {
        Self {
            settings,
            controllers: BTreeMap::new(),
            frozen: false,
        }
    }

    pub fn settings(&self) -> &WanderSettings {
        &self.settings
    }

    pub fn insert(&mut self, host: HostId, zone: FactionId) {
        self.controllers
            .insert(host, WanderController::new(host, zone));
    }

    pub fn remove(&mut self, host: HostId) -> Option<WanderController> {
        self.controllers.remove(&host)
    }

    pub fn get(&self, host: HostId) -> Option<&WanderController> {
        self.controllers.get(&host)
    }

    pub fn get_mut(&mut self, host: HostId) -> Option<&mut WanderController> {
        self.controllers.get_mut(&host)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WanderController> {
        self.controllers.values()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Disables every controller for good; used when the match ends.
    pub fn freeze(&mut self, points: &mut WanderPoints) {
        for controller in self.controllers.values_mut() {
            controller.disable(points);
        }
        self.frozen = true;
    }

    pub(crate) fn split_mut(
        &mut self,
    ) -> (&WanderSettings, &mut BTreeMap<HostId, WanderController>) {
        (&self.settings, &mut self.controllers)
    }
}
