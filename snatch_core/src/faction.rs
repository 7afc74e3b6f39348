use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of competing factions. Each faction owns exactly one zone.
pub const FACTION_COUNT: usize = 4;

/// Identifier for a faction and, 1:1, the zone it owns (1..=4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub u8);

impl FactionId {
    pub const ALL: [FactionId; FACTION_COUNT] =
        [FactionId(1), FactionId(2), FactionId(3), FactionId(4)];

    pub fn new(zone: u8) -> Option<Self> {
        if (1..=FACTION_COUNT as u8).contains(&zone) {
            Some(Self(zone))
        } else {
            None
        }
    }

    /// Dense array index for this faction, `None` for ids outside 1..=4.
    pub fn index(self) -> Option<usize> {
        let zone = self.0 as usize;
        if (1..=FACTION_COUNT).contains(&zone) {
            Some(zone - 1)
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < FACTION_COUNT, "faction index out of range");
        Self(index as u8 + 1)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who drives a host this frame.
///
/// Interpreted in exactly one place (`systems::dispatch_host_controllers`):
/// `None` hosts wander, `Human` hosts take queued input, `Ai` hosts are flown
/// by their faction's pilot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerMode {
    #[default]
    None,
    Human,
    Ai,
}

impl ControllerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerMode::None => "none",
            ControllerMode::Human => "human",
            ControllerMode::Ai => "ai",
        }
    }
}
