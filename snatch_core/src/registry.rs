use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::{
    faction::{ControllerMode, FactionId, FACTION_COUNT},
    host::{Host, HostId, HostStatus},
};

/// Host counts by [`HostStatus`]. The four buckets always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostCensus {
    pub neutral: u32,
    pub possessed: u32,
    pub claimed: u32,
    pub decayed: u32,
    pub total: u32,
}

impl HostCensus {
    pub fn is_balanced(&self) -> bool {
        self.neutral + self.possessed + self.claimed + self.decayed == self.total
    }
}

/// Index of every host in the match.
///
/// Ids are dense, so id lookup is a vector index. Zone membership and the
/// neutral set are maintained incrementally by the mutators, which are only
/// reachable from the match state machine.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: Vec<Host>,
    by_zone: [Vec<HostId>; FACTION_COUNT],
    neutral: Vec<HostId>,
    neutral_slots: HashMap<HostId, usize>,
    claims: [u32; FACTION_COUNT],
}

impl HostRegistry {
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn get(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }

    pub fn in_zone(&self, zone: FactionId) -> &[HostId] {
        zone.index()
            .map(|index| self.by_zone[index].as_slice())
            .unwrap_or(&[])
    }

    pub fn neutral_hosts(&self) -> &[HostId] {
        &self.neutral
    }

    pub fn neutral_count(&self) -> usize {
        self.neutral.len()
    }

    /// Uniformly random member of the neutral set.
    pub fn pick_neutral<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<HostId> {
        if self.neutral.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.neutral.len());
        Some(self.neutral[index])
    }

    /// Hosts ever claimed by `faction`, decayed ones included.
    pub fn claim_count(&self, faction: FactionId) -> u32 {
        faction
            .index()
            .map(|index| self.claims[index])
            .unwrap_or(0)
    }

    pub fn census(&self) -> HostCensus {
        let mut census = HostCensus {
            total: self.hosts.len() as u32,
            ..Default::default()
        };
        for host in &self.hosts {
            match host.status() {
                HostStatus::Neutral => census.neutral += 1,
                HostStatus::Possessed => census.possessed += 1,
                HostStatus::Claimed => census.claimed += 1,
                HostStatus::Decayed => census.decayed += 1,
            }
        }
        census
    }

    pub(crate) fn insert(&mut self, zone: FactionId) -> HostId {
        let id = HostId(self.hosts.len() as u32);
        self.hosts.push(Host::new(id, zone));
        if let Some(index) = zone.index() {
            self.by_zone[index].push(id);
        }
        self.refresh_neutral(id);
        id
    }

    pub(crate) fn possess(&mut self, id: HostId, faction: FactionId, controller: ControllerMode) {
        if let Some(host) = self.hosts.get_mut(id.0 as usize) {
            host.set_occupant(faction, controller);
        }
        self.refresh_neutral(id);
    }

    pub(crate) fn vacate(&mut self, id: HostId) {
        if let Some(host) = self.hosts.get_mut(id.0 as usize) {
            host.clear_occupant();
        }
        self.refresh_neutral(id);
    }

    pub(crate) fn claim(&mut self, id: HostId, faction: FactionId) -> bool {
        let claimed = self
            .hosts
            .get_mut(id.0 as usize)
            .map(|host| host.claim(faction))
            .unwrap_or(false);
        if claimed {
            if let Some(index) = faction.index() {
                self.claims[index] += 1;
            }
        }
        self.refresh_neutral(id);
        claimed
    }

    pub(crate) fn decay(&mut self, id: HostId) {
        if let Some(host) = self.hosts.get_mut(id.0 as usize) {
            host.mark_decayed();
        }
        self.refresh_neutral(id);
    }

    fn refresh_neutral(&mut self, id: HostId) {
        let is_neutral = self
            .hosts
            .get(id.0 as usize)
            .map(Host::is_neutral)
            .unwrap_or(false);
        match (is_neutral, self.neutral_slots.get(&id).copied()) {
            (true, None) => {
                self.neutral_slots.insert(id, self.neutral.len());
                self.neutral.push(id);
            }
            (false, Some(slot)) => {
                self.neutral.swap_remove(slot);
                self.neutral_slots.remove(&id);
                if let Some(moved) = self.neutral.get(slot).copied() {
                    self.neutral_slots.insert(moved, slot);
                }
            }
            _ => {}
        }
    }
}
