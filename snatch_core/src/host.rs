use std::fmt;

use serde::{Deserialize, Serialize};

use crate::faction::{ControllerMode, FactionId};

/// Stable identifier assigned to a host when it is spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub u32);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host_{:03}", self.0)
    }
}

/// Mutually exclusive classification used for the host census.
///
/// A possessed host may also carry a claim; it is counted as possessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Neutral,
    Possessed,
    Claimed,
    Decayed,
}

/// Authoritative per-host record. Only [`crate::HostRegistry`] mutates it,
/// on behalf of the match state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    id: HostId,
    zone: FactionId,
    occupant: Option<FactionId>,
    claimed_by: Option<FactionId>,
    decayed: bool,
    controller: ControllerMode,
}

impl Host {
    pub(crate) fn new(id: HostId, zone: FactionId) -> Self {
        Self {
            id,
            zone,
            occupant: None,
            claimed_by: None,
            decayed: false,
            controller: ControllerMode::None,
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn zone(&self) -> FactionId {
        self.zone
    }

    pub fn occupant(&self) -> Option<FactionId> {
        self.occupant
    }

    pub fn claimed_by(&self) -> Option<FactionId> {
        self.claimed_by
    }

    pub fn is_decayed(&self) -> bool {
        self.decayed
    }

    pub fn controller(&self) -> ControllerMode {
        self.controller
    }

    pub fn is_possessed(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    pub fn is_neutral(&self) -> bool {
        self.occupant.is_none() && self.claimed_by.is_none() && !self.decayed
    }

    pub fn status(&self) -> HostStatus {
        if self.decayed {
            HostStatus::Decayed
        } else if self.occupant.is_some() {
            HostStatus::Possessed
        } else if self.claimed_by.is_some() {
            HostStatus::Claimed
        } else {
            HostStatus::Neutral
        }
    }

    pub(crate) fn set_occupant(&mut self, faction: FactionId, controller: ControllerMode) {
        debug_assert!(!self.decayed, "decayed hosts cannot be occupied");
        self.occupant = Some(faction);
        self.controller = controller;
    }

    pub(crate) fn clear_occupant(&mut self) {
        self.occupant = None;
        self.controller = ControllerMode::None;
    }

    /// Records the first claimant. Later claims are ignored.
    pub(crate) fn claim(&mut self, faction: FactionId) -> bool {
        if self.claimed_by.is_some() {
            return false;
        }
        self.claimed_by = Some(faction);
        true
    }

    pub(crate) fn mark_decayed(&mut self) {
        self.clear_occupant();
        self.decayed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_write_once() {
        let mut host = Host::new(HostId(7), FactionId(2));
        assert!(host.claim(FactionId(1)));
        assert!(!host.claim(FactionId(3)));
        assert_eq!(host.claimed_by(), Some(FactionId(1)));
    }

    #[test]
    fn status_prefers_decay_then_occupancy() {
        let mut host = Host::new(HostId(1), FactionId(1));
        assert_eq!(host.status(), HostStatus::Neutral);
        host.claim(FactionId(2));
        assert_eq!(host.status(), HostStatus::Claimed);
        host.set_occupant(FactionId(3), ControllerMode::Ai);
        assert_eq!(host.status(), HostStatus::Possessed);
        host.mark_decayed();
        assert_eq!(host.status(), HostStatus::Decayed);
        assert_eq!(host.occupant(), None);
        assert_eq!(host.controller(), ControllerMode::None);
    }
}
