use bevy::prelude::Resource;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::MatchConfig,
    events::{DeathCause, MatchEvent},
    faction::{FactionId, FACTION_COUNT},
    host::{Host, HostId},
    registry::HostRegistry,
    slot::Slot,
};

/// The subset of [`MatchConfig`] the state machine adjudicates with.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRules {
    pub decay_enabled: bool,
    /// Already floored at [`crate::config::MIN_DECAY_SECONDS`].
    pub decay_seconds: f32,
    pub respawn_delay: f32,
    pub zone_names: [String; FACTION_COUNT],
    pub human: Option<FactionId>,
}

impl MatchRules {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            decay_enabled: config.decay.enabled,
            decay_seconds: config.decay.duration(),
            respawn_delay: config.respawn.delay_seconds.max(0.0),
            zone_names: config.zones.names.clone(),
            human: config.zones.human_faction(),
        }
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum MatchPhase {
    /// Hosts may be registered; nothing ticks yet.
    Pending,
    Running,
    /// Terminal. Every mutation is rejected from here on.
    Ended { winner: FactionId },
}

/// One row of the score board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub faction: FactionId,
    pub name: String,
    pub claims: u32,
}

/// Authoritative match state: the single writer of every [`Host`] and
/// [`Slot`] record.
///
/// Wander controllers, projectiles, pilots and presentation only read through
/// the query methods or go through the operations below; rejected operations
/// are expected outcomes of racing agents and surface as `false` / no-ops.
#[derive(Resource, Debug, Clone)]
pub struct SnatcherManager {
    rules: MatchRules,
    slots: [Slot; FACTION_COUNT],
    hosts: HostRegistry,
    phase: MatchPhase,
    events: Vec<MatchEvent>,
}

impl Default for SnatcherManager {
    fn default() -> Self {
        Self::new(MatchRules::default())
    }
}

impl SnatcherManager {
    pub fn new(rules: MatchRules) -> Self {
        let slots =
            FactionId::ALL.map(|faction| Slot::new(faction, rules.human == Some(faction)));
        Self {
            rules,
            slots,
            hosts: HostRegistry::default(),
            phase: MatchPhase::Pending,
            events: Vec::new(),
        }
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.phase != MatchPhase::Pending
    }

    pub fn is_running(&self) -> bool {
        self.phase == MatchPhase::Running
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended { .. })
    }

    pub fn winner(&self) -> Option<FactionId> {
        match self.phase {
            MatchPhase::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    pub fn host(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, faction: FactionId) -> Option<&Slot> {
        faction.index().map(|index| &self.slots[index])
    }

    /// Adds a freshly spawned, neutral host to the registry.
    pub fn register_host(&mut self, zone: FactionId) -> HostId {
        let id = self.hosts.insert(zone);
        debug!(target: "snatch::match", host = %id, zone = %zone, "host.registered");
        id
    }

    /// Gives every slot a random host from its own zone and starts the match.
    ///
    /// A zone without hosts leaves its slot dead with a running respawn timer,
    /// so it joins as soon as the respawn search finds a neutral host.
    pub fn assign_initial_hosts<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.phase != MatchPhase::Pending {
            warn!(target: "snatch::match", "match.already_started");
            return;
        }
        self.phase = MatchPhase::Running;
        self.events.push(MatchEvent::MatchStarted);

        for index in 0..FACTION_COUNT {
            let faction = FactionId::from_index(index);
            let candidates: Vec<HostId> = self
                .hosts
                .in_zone(faction)
                .iter()
                .copied()
                .filter(|id| self.hosts.get(*id).map(Host::is_neutral).unwrap_or(false))
                .collect();

            if candidates.is_empty() {
                warn!(
                    target: "snatch::match",
                    faction = %faction,
                    "match.zone_without_hosts"
                );
                self.slots[index].die(self.rules.respawn_delay);
                continue;
            }

            let host = candidates[rng.gen_range(0..candidates.len())];
            self.occupy(index, host);
            self.events.push(MatchEvent::Possessed {
                faction,
                host,
                displaced: None,
            });
        }

        info!(
            target: "snatch::match",
            hosts = self.hosts.len(),
            neutral = self.hosts.neutral_count(),
            "match.started"
        );
    }

    /// The faction's snatcher leaves its host inside a fired projectile.
    ///
    /// The host is claimed for `faction` (first claim only) and returns to the
    /// wander pool. The slot stays alive, hostless, until the projectile
    /// resolves. Returns the vacated host, the projectile's source.
    pub fn on_snatcher_shot(&mut self, faction: FactionId) -> Option<HostId> {
        if !self.is_running() {
            return None;
        }
        let index = faction.index()?;
        if self.slots[index].current_host().is_none() {
            return None;
        }

        let host = self.slots[index].leave_host(self.rules.respawn_delay)?;
        self.hosts.vacate(host);
        let claimed = self.hosts.claim(host, faction);

        info!(
            target: "snatch::match",
            faction = %faction,
            host = %host,
            claimed,
            "host.vacated"
        );
        self.events.push(MatchEvent::Vacated {
            faction,
            host,
            claimed,
        });
        Some(host)
    }

    /// Moves `attacker` into `target`, killing the faction displaced from it.
    ///
    /// Rejected when the attacker is dead, the host is decayed or already the
    /// attacker's, or the host is unoccupied but already claimed by the
    /// attacker.
    pub fn possess_host(&mut self, attacker: FactionId, target: HostId) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(attacker_index) = attacker.index() else {
            return false;
        };
        if !self.slots[attacker_index].is_alive() {
            return false;
        }
        let Some(host) = self.hosts.get(target) else {
            return false;
        };
        if host.is_decayed() {
            return false;
        }
        let occupant = host.occupant();
        if occupant == Some(attacker) {
            return false;
        }
        if occupant.is_none() && host.claimed_by() == Some(attacker) {
            return false;
        }

        if let Some(previous) = self.slots[attacker_index].current_host() {
            // A faction holds one host at a time; the old body goes back to
            // the wander pool unclaimed.
            self.hosts.vacate(previous);
            self.events.push(MatchEvent::Vacated {
                faction: attacker,
                host: previous,
                claimed: false,
            });
        }

        if let Some(defender) = occupant {
            self.kill_snatcher(defender, DeathCause::Displaced { by: attacker });
        }

        self.occupy(attacker_index, target);
        info!(
            target: "snatch::match",
            faction = %attacker,
            host = %target,
            displaced = ?occupant.map(|f| f.0),
            "host.possessed"
        );
        self.events.push(MatchEvent::Possessed {
            faction: attacker,
            host: target,
            displaced: occupant,
        });
        true
    }

    /// Ends the faction's current life. The host it occupied, if any, is left
    /// exactly as the caller left it.
    pub fn kill_snatcher(&mut self, faction: FactionId, cause: DeathCause) {
        if !self.is_running() {
            return;
        }
        let Some(index) = faction.index() else {
            return;
        };
        let slot = &mut self.slots[index];
        if !slot.is_alive() {
            return;
        }

        let last_host = slot.last_host();
        let host = slot.die(self.rules.respawn_delay);

        info!(
            target: "snatch::match",
            faction = %faction,
            cause = cause.as_str(),
            respawn_in = self.rules.respawn_delay,
            "snatcher.killed"
        );
        self.events.push(MatchEvent::SnatcherKilled {
            faction,
            cause,
            host,
            last_host,
        });
    }

    /// Advances decay and respawn timers for every slot, then checks whether
    /// the match is over. Nothing happens before the start or after the end.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        if !self.is_running() {
            return;
        }

        for index in 0..FACTION_COUNT {
            if !self.slots[index].is_alive() {
                self.tick_respawn(index, dt, rng);
                continue;
            }
            if !self.rules.decay_enabled || self.slots[index].current_host().is_none() {
                continue;
            }
            self.tick_decay(index, dt);
        }

        self.evaluate_match_end();
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn can_respawn(&self, faction: FactionId) -> bool {
        if self.is_ended() {
            return false;
        }
        match self.slot(faction) {
            Some(slot) => !slot.is_alive() && self.hosts.neutral_count() > 0,
            None => false,
        }
    }

    pub fn respawn_time_remaining(&self, faction: FactionId) -> f32 {
        self.slot(faction)
            .map(|slot| slot.respawn_timer().max(0.0))
            .unwrap_or(0.0)
    }

    pub fn zone_name(&self, faction: FactionId) -> String {
        match faction.index() {
            Some(index) => self.rules.zone_names[index].clone(),
            None => format!("Zone {}", faction.0),
        }
    }

    pub fn claim_count(&self, faction: FactionId) -> u32 {
        self.hosts.claim_count(faction)
    }

    pub fn remaining_neutral_hosts(&self) -> usize {
        self.hosts.neutral_count()
    }

    /// Remaining decay as a 0..=1 ratio, `0` for a slot without a host.
    pub fn decay_fraction(&self, faction: FactionId) -> f32 {
        match self.slot(faction) {
            Some(slot) if slot.is_alive() && slot.current_host().is_some() => {
                (slot.decay_remaining() / self.rules.decay_seconds).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Factions ordered by claims, highest first; ties keep zone order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut board: Vec<Standing> = FactionId::ALL
            .iter()
            .map(|faction| Standing {
                faction: *faction,
                name: self.zone_name(*faction),
                claims: self.claim_count(*faction),
            })
            .collect();
        board.sort_by(|a, b| b.claims.cmp(&a.claims));
        board
    }

    fn occupy(&mut self, index: usize, host: HostId) {
        let slot = &mut self.slots[index];
        self.hosts
            .possess(host, slot.faction(), slot.controller_mode());
        slot.occupy(host, self.rules.decay_seconds);
    }

    fn tick_decay(&mut self, index: usize, dt: f32) {
        if !self.slots[index].drain_decay(dt) {
            return;
        }
        let faction = self.slots[index].faction();
        let Some(host) = self.slots[index].die(self.rules.respawn_delay) else {
            return;
        };
        self.hosts.decay(host);

        info!(
            target: "snatch::match",
            faction = %faction,
            host = %host,
            "host.decayed"
        );
        self.events.push(MatchEvent::SnatcherKilled {
            faction,
            cause: DeathCause::Decayed,
            host: Some(host),
            last_host: None,
        });
        self.events.push(MatchEvent::HostDecayed { faction, host });
    }

    fn tick_respawn<R: Rng + ?Sized>(&mut self, index: usize, dt: f32, rng: &mut R) {
        if !self.slots[index].drain_respawn(dt) {
            return;
        }
        let faction = self.slots[index].faction();
        match self.hosts.pick_neutral(rng) {
            Some(host) => {
                self.occupy(index, host);
                info!(
                    target: "snatch::match",
                    faction = %faction,
                    host = %host,
                    "snatcher.respawned"
                );
                self.events.push(MatchEvent::Respawned { faction, host });
            }
            None => {
                self.slots[index].abandon_respawn();
                info!(
                    target: "snatch::match",
                    faction = %faction,
                    "snatcher.respawn_abandoned"
                );
                self.events.push(MatchEvent::RespawnAbandoned { faction });
            }
        }
    }

    fn evaluate_match_end(&mut self) {
        if !self.is_running() || self.hosts.neutral_count() > 0 {
            return;
        }

        let winner = self.winning_faction();
        self.phase = MatchPhase::Ended { winner };
        let claims: Vec<u32> = FactionId::ALL
            .iter()
            .map(|faction| self.claim_count(*faction))
            .collect();
        info!(
            target: "snatch::match",
            winner = %winner,
            name = %self.zone_name(winner),
            claims = ?claims,
            "match.ended"
        );
        self.events.push(MatchEvent::MatchEnded { winner });
    }

    fn winning_faction(&self) -> FactionId {
        let mut best = FactionId::ALL[0];
        let mut best_count = 0;
        for faction in FactionId::ALL {
            let count = self.claim_count(faction);
            if count > best_count {
                best = faction;
                best_count = count;
            }
        }
        best
    }
}
