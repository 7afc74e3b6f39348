use serde::Serialize;

use crate::{
    faction::{ControllerMode, FactionId},
    host::HostId,
};

/// Respawn timer value meaning "no neutral host was left, stop trying".
pub const RESPAWN_ABANDONED: f32 = -1.0;

/// Per-faction snatcher state. Mutated only by [`crate::SnatcherManager`].
///
/// A slot can be alive without a host: that is the snatcher travelling inside
/// its fired projectile, waiting for the hit or miss to settle its fate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    faction: FactionId,
    alive: bool,
    current_host: Option<HostId>,
    decay_remaining: f32,
    respawn_timer: f32,
    human: bool,
    last_host: Option<HostId>,
}

impl Slot {
    pub(crate) fn new(faction: FactionId, human: bool) -> Self {
        Self {
            faction,
            alive: false,
            current_host: None,
            decay_remaining: 0.0,
            respawn_timer: 0.0,
            human,
            last_host: None,
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn current_host(&self) -> Option<HostId> {
        self.current_host
    }

    pub fn decay_remaining(&self) -> f32 {
        self.decay_remaining
    }

    pub fn respawn_timer(&self) -> f32 {
        self.respawn_timer
    }

    pub fn is_human(&self) -> bool {
        self.human
    }

    /// Host vacated by the most recent shot. Cosmetic: lets presentation play
    /// the death cue where the snatcher was last seen.
    pub fn last_host(&self) -> Option<HostId> {
        self.last_host
    }

    pub fn is_in_flight(&self) -> bool {
        self.alive && self.current_host.is_none()
    }

    pub fn respawn_abandoned(&self) -> bool {
        !self.alive && self.respawn_timer < 0.0
    }

    pub fn controller_mode(&self) -> ControllerMode {
        if self.human {
            ControllerMode::Human
        } else {
            ControllerMode::Ai
        }
    }

    pub(crate) fn occupy(&mut self, host: HostId, decay_seconds: f32) {
        self.alive = true;
        self.current_host = Some(host);
        self.decay_remaining = decay_seconds;
        self.respawn_timer = 0.0;
    }

    pub(crate) fn leave_host(&mut self, respawn_delay: f32) -> Option<HostId> {
        let host = self.current_host.take();
        self.last_host = host;
        self.decay_remaining = 0.0;
        self.respawn_timer = respawn_delay;
        host
    }

    pub(crate) fn die(&mut self, respawn_delay: f32) -> Option<HostId> {
        self.alive = false;
        self.decay_remaining = 0.0;
        self.respawn_timer = respawn_delay;
        self.last_host = None;
        self.current_host.take()
    }

    pub(crate) fn drain_decay(&mut self, dt: f32) -> bool {
        self.decay_remaining -= dt;
        self.decay_remaining <= 0.0
    }

    /// Counts the respawn timer down. Returns `true` once it reaches zero.
    pub(crate) fn drain_respawn(&mut self, dt: f32) -> bool {
        if self.respawn_timer < 0.0 {
            return false;
        }
        self.respawn_timer -= dt;
        self.respawn_timer <= 0.0
    }

    pub(crate) fn abandon_respawn(&mut self) {
        self.respawn_timer = RESPAWN_ABANDONED;
    }
}
