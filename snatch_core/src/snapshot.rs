use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::{
    faction::FactionId,
    host::{HostId, HostStatus},
    manager::{MatchPhase, SnatcherManager, Standing},
    resources::MatchClock,
    services::{Navigation, WorldLink},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub faction: FactionId,
    pub name: String,
    pub alive: bool,
    pub host: Option<HostId>,
    pub decay_fraction: f32,
    pub respawn_in: f32,
    pub human: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostView {
    pub id: HostId,
    pub zone: FactionId,
    pub status: HostStatus,
    pub occupant: Option<FactionId>,
    pub claimed_by: Option<FactionId>,
    pub position: Option<[f32; 2]>,
}

/// Read-only picture of one frame for presentation consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub frame: u64,
    pub elapsed: f32,
    pub phase: MatchPhase,
    pub slots: Vec<SlotView>,
    pub hosts: Vec<HostView>,
    pub standings: Vec<Standing>,
}

#[derive(Resource, Debug, Default)]
pub struct SnapshotHistory {
    pub last_snapshot: Option<MatchSnapshot>,
    /// Hosts whose view differs from the previous frame.
    pub changed_hosts: Vec<HostView>,
    pub encoded_snapshot: Option<Vec<u8>>,
    hosts: BTreeMap<HostId, HostView>,
}

impl SnapshotHistory {
    fn update(&mut self, snapshot: MatchSnapshot) {
        let index: BTreeMap<HostId, HostView> = snapshot
            .hosts
            .iter()
            .map(|view| (view.id, view.clone()))
            .collect();
        self.changed_hosts = index
            .iter()
            .filter(|(id, view)| self.hosts.get(*id) != Some(*view))
            .map(|(_, view)| view.clone())
            .collect();

        match bincode::serialize(&snapshot) {
            Ok(bytes) => self.encoded_snapshot = Some(bytes),
            Err(err) => {
                warn!(target: "snatch::match", error = %err, "snapshot.encode_failed");
                self.encoded_snapshot = None;
            }
        }
        self.hosts = index;
        self.last_snapshot = Some(snapshot);
    }
}

pub fn build_snapshot(
    clock: &MatchClock,
    manager: &SnatcherManager,
    world: Option<&WorldLink>,
) -> MatchSnapshot {
    let slots = manager
        .slots()
        .iter()
        .map(|slot| SlotView {
            faction: slot.faction(),
            name: manager.zone_name(slot.faction()),
            alive: slot.is_alive(),
            host: slot.current_host(),
            decay_fraction: manager.decay_fraction(slot.faction()),
            respawn_in: manager.respawn_time_remaining(slot.faction()),
            human: slot.is_human(),
        })
        .collect();
    let hosts = manager
        .hosts()
        .iter()
        .map(|host| HostView {
            id: host.id(),
            zone: host.zone(),
            status: host.status(),
            occupant: host.occupant(),
            claimed_by: host.claimed_by(),
            position: world
                .and_then(|link| link.get().position(host.id()))
                .map(|p| p.to_array()),
        })
        .collect();

    MatchSnapshot {
        frame: clock.frame,
        elapsed: clock.elapsed,
        phase: manager.phase(),
        slots,
        hosts,
        standings: manager.standings(),
    }
}

pub fn capture_snapshot(
    clock: Res<MatchClock>,
    manager: Res<SnatcherManager>,
    world: Option<Res<WorldLink>>,
    mut history: ResMut<SnapshotHistory>,
) {
    let snapshot = build_snapshot(&clock, &manager, world.as_deref());
    history.update(snapshot);
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::manager::MatchRules;

    #[test]
    fn only_changed_hosts_are_reported() {
        let mut manager = SnatcherManager::new(MatchRules::default());
        for faction in FactionId::ALL {
            manager.register_host(faction);
        }
        manager.register_host(FactionId(1));
        manager.assign_initial_hosts(&mut ChaCha8Rng::seed_from_u64(2));

        let mut history = SnapshotHistory::default();
        let clock = MatchClock::default();
        history.update(build_snapshot(&clock, &manager, None));
        assert_eq!(history.changed_hosts.len(), 5);
        assert!(history.encoded_snapshot.as_ref().map(|b| !b.is_empty()).unwrap_or(false));

        history.update(build_snapshot(&clock, &manager, None));
        assert!(history.changed_hosts.is_empty());

        let vacated = manager.on_snatcher_shot(FactionId(2)).expect("faction 2 holds a host");
        history.update(build_snapshot(&clock, &manager, None));
        assert_eq!(history.changed_hosts.len(), 1);
        assert_eq!(history.changed_hosts[0].id, vacated);
        assert_eq!(history.changed_hosts[0].status, HostStatus::Claimed);
    }
}
