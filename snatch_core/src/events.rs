use bevy::prelude::Resource;
use serde::Serialize;

use crate::{faction::FactionId, host::HostId};

/// Why a snatcher died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeathCause {
    /// Another faction possessed the host it occupied.
    Displaced { by: FactionId },
    /// Its projectile expired, hit scenery, or hit a host it may not take.
    Missed,
    /// The decay timer of its host ran out.
    Decayed,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::Displaced { .. } => "displaced",
            DeathCause::Missed => "missed",
            DeathCause::Decayed => "decayed",
        }
    }
}

/// State transitions published by the match state machine for presentation
/// consumers (audio cues, death and respawn messages, camera targets).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum MatchEvent {
    MatchStarted,
    Possessed {
        faction: FactionId,
        host: HostId,
        displaced: Option<FactionId>,
    },
    Vacated {
        faction: FactionId,
        host: HostId,
        claimed: bool,
    },
    SnatcherKilled {
        faction: FactionId,
        cause: DeathCause,
        host: Option<HostId>,
        last_host: Option<HostId>,
    },
    HostDecayed {
        faction: FactionId,
        host: HostId,
    },
    Respawned {
        faction: FactionId,
        host: HostId,
    },
    RespawnAbandoned {
        faction: FactionId,
    },
    MatchEnded {
        winner: FactionId,
    },
}

/// Events drained from the state machine, kept for the current frame plus a
/// running total.
#[derive(Resource, Debug, Clone, Default)]
pub struct MatchEventLog {
    pub frame: Vec<MatchEvent>,
    pub total: u64,
}

impl MatchEventLog {
    pub fn record(&mut self, events: Vec<MatchEvent>) {
        self.total += events.len() as u64;
        self.frame = events;
    }
}
