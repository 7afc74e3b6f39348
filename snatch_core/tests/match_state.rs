use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snatch_core::{
    DeathCause, FactionId, HostId, HostStatus, MatchEvent, MatchPhase, MatchRules,
    SnatcherManager, RESPAWN_ABANDONED,
};

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(0x5eed)
}

fn rules(decay_enabled: bool, respawn_delay: f32) -> MatchRules {
    MatchRules {
        decay_enabled,
        decay_seconds: 10.0,
        respawn_delay,
        human: None,
        ..MatchRules::default()
    }
}

/// `per_zone` hosts in every zone, registered zone by zone.
fn started(rules: MatchRules, per_zone: usize) -> SnatcherManager {
    let mut manager = SnatcherManager::new(rules);
    for faction in FactionId::ALL {
        for _ in 0..per_zone {
            manager.register_host(faction);
        }
    }
    manager.assign_initial_hosts(&mut rng());
    manager
}

fn held(manager: &SnatcherManager, faction: FactionId) -> Option<HostId> {
    manager.slot(faction).and_then(|slot| slot.current_host())
}

fn alive(manager: &SnatcherManager, faction: FactionId) -> bool {
    manager.slot(faction).map(|slot| slot.is_alive()).unwrap_or(false)
}

fn assert_invariants(manager: &SnatcherManager) {
    let census = manager.hosts().census();
    assert!(census.is_balanced(), "census out of balance: {census:?}");
    assert_eq!(census.neutral as usize, manager.remaining_neutral_hosts());
    for host in manager.hosts().iter() {
        if host.is_decayed() {
            assert_eq!(host.occupant(), None, "{} decayed but occupied", host.id());
        }
    }
    for slot in manager.slots() {
        if !slot.is_alive() {
            assert_eq!(slot.current_host(), None);
        }
        if let Some(host) = slot.current_host() {
            assert_eq!(
                manager.host(host).and_then(|h| h.occupant()),
                Some(slot.faction())
            );
        }
    }
}

#[test]
fn shot_claims_the_host_and_exhausted_respawn_ends_the_match() {
    let mut manager = started(rules(false, 0.0), 1);
    let vacated = manager.on_snatcher_shot(FactionId(1)).expect("faction 1 holds a host");

    let host = manager.host(vacated).expect("registered");
    assert_eq!(host.claimed_by(), Some(FactionId(1)));
    assert_eq!(host.occupant(), None);
    assert_eq!(host.status(), HostStatus::Claimed);
    assert_eq!(manager.claim_count(FactionId(1)), 1);

    // The projectile misses; faction 1 is dead with a zero respawn delay.
    manager.kill_snatcher(FactionId(1), DeathCause::Missed);
    assert!(!alive(&manager, FactionId(1)));

    // Three hosts are held and the fourth is claimed: nothing is neutral.
    manager.tick(0.016, &mut rng());
    assert!(manager.slot(FactionId(1)).map(|s| s.respawn_abandoned()).unwrap_or(false));
    assert_eq!(manager.winner(), Some(FactionId(1)));
    assert_invariants(&manager);
}

#[test]
fn respawn_with_zero_delay_lands_in_a_neutral_host() {
    let mut manager = started(rules(false, 0.0), 2);
    let vacated = manager.on_snatcher_shot(FactionId(1)).expect("fired");
    manager.kill_snatcher(FactionId(1), DeathCause::Missed);

    manager.tick(0.016, &mut rng());
    let respawned = held(&manager, FactionId(1)).expect("respawned this frame");
    assert_ne!(respawned, vacated);
    let host = manager.host(respawned).expect("registered");
    assert_eq!(host.claimed_by(), None);
    assert_eq!(host.occupant(), Some(FactionId(1)));
    assert_invariants(&manager);
}

#[test]
fn displacement_kills_the_defender_and_keeps_the_claim() {
    let mut manager = started(rules(false, 4.0), 2);
    let target = held(&manager, FactionId(2)).expect("faction 2 holds a host");
    let claimed_before = manager.host(target).and_then(|h| h.claimed_by());

    manager.on_snatcher_shot(FactionId(1));
    assert!(manager.possess_host(FactionId(1), target));

    assert!(!alive(&manager, FactionId(2)));
    assert_eq!(manager.slot(FactionId(2)).map(|s| s.respawn_timer()), Some(4.0));
    let host = manager.host(target).expect("registered");
    assert_eq!(host.occupant(), Some(FactionId(1)));
    assert_eq!(host.claimed_by(), claimed_before);

    let killed = manager.drain_events().into_iter().any(|event| {
        event
            == MatchEvent::SnatcherKilled {
                faction: FactionId(2),
                cause: DeathCause::Displaced { by: FactionId(1) },
                host: Some(target),
                last_host: None,
            }
    });
    assert!(killed);
    assert_invariants(&manager);
}

#[test]
fn possession_of_own_or_self_claimed_hosts_is_rejected() {
    let mut manager = started(rules(false, 4.0), 2);
    let own = held(&manager, FactionId(3)).expect("faction 3 holds a host");
    assert!(!manager.possess_host(FactionId(3), own));
    assert_eq!(manager.host(own).and_then(|h| h.occupant()), Some(FactionId(3)));

    let claimed = manager.on_snatcher_shot(FactionId(3)).expect("fired");
    assert!(!manager.possess_host(FactionId(3), claimed));
    assert_eq!(manager.host(claimed).and_then(|h| h.occupant()), None);

    // Another faction may still take it; the claim stays with faction 3.
    assert!(manager.possess_host(FactionId(4), claimed));
    assert_eq!(manager.host(claimed).and_then(|h| h.claimed_by()), Some(FactionId(3)));
}

#[test]
fn claims_are_write_once() {
    let mut manager = started(rules(false, 0.0), 2);
    let first = manager.on_snatcher_shot(FactionId(1)).expect("fired");
    assert!(manager.possess_host(FactionId(2), first));
    assert_eq!(manager.on_snatcher_shot(FactionId(2)), Some(first));

    let host = manager.host(first).expect("registered");
    assert_eq!(host.claimed_by(), Some(FactionId(1)));
    assert_eq!(manager.claim_count(FactionId(1)), 1);
    assert_eq!(manager.claim_count(FactionId(2)), 0);
}

#[test]
fn kill_is_idempotent() {
    let mut manager = started(rules(false, 3.0), 1);
    manager.kill_snatcher(FactionId(4), DeathCause::Missed);
    let once = manager.clone();
    let events_once = manager.pending_events().len();

    manager.kill_snatcher(FactionId(4), DeathCause::Missed);
    assert_eq!(manager.slots(), once.slots());
    assert_eq!(manager.pending_events().len(), events_once);
}

#[test]
fn hostless_factions_do_not_respawn_while_in_flight() {
    let mut manager = started(rules(true, 0.5), 2);
    manager.on_snatcher_shot(FactionId(2));
    let slot = manager.slot(FactionId(2)).expect("slot");
    assert!(slot.is_in_flight());

    for _ in 0..10 {
        manager.tick(0.1, &mut rng());
    }
    let slot = manager.slot(FactionId(2)).expect("slot");
    assert!(slot.is_in_flight(), "waits for the projectile to resolve");
    assert_eq!(slot.decay_remaining(), 0.0);
}

#[test]
fn decay_destroys_the_host_and_kills_the_occupant() {
    let mut manager = started(rules(true, 2.0), 2);
    let host = held(&manager, FactionId(1)).expect("holds a host");

    manager.tick(4.0, &mut rng());
    manager.tick(6.5, &mut rng());
    assert!(!alive(&manager, FactionId(1)) || held(&manager, FactionId(1)) != Some(host));

    let record = manager.host(host).expect("registered");
    assert!(record.is_decayed());
    assert_eq!(record.occupant(), None);
    assert_eq!(record.status(), HostStatus::Decayed);
    assert!(!manager.possess_host(FactionId(2), host), "decayed hosts are gone for good");
    assert!(manager
        .drain_events()
        .contains(&MatchEvent::HostDecayed { faction: FactionId(1), host }));
    assert_invariants(&manager);
}

#[test]
fn simultaneous_respawns_share_the_last_neutral_host() {
    let mut manager = SnatcherManager::new(rules(false, 1.0));
    for faction in FactionId::ALL {
        manager.register_host(faction);
    }
    manager.register_host(FactionId(1));
    let mut rng = rng();
    manager.assign_initial_hosts(&mut rng);
    // Zone 1 has two hosts; whichever was not picked is the last neutral one.
    let spare = manager.hosts().neutral_hosts().to_vec();
    assert_eq!(spare.len(), 1);
    let last = spare[0];

    manager.kill_snatcher(FactionId(3), DeathCause::Missed);
    manager.kill_snatcher(FactionId(4), DeathCause::Missed);
    manager.tick(1.0, &mut rng);

    assert_eq!(held(&manager, FactionId(3)), Some(last), "zone order decides");
    let loser = manager.slot(FactionId(4)).expect("slot");
    assert!(!loser.is_alive());
    assert_eq!(loser.respawn_timer(), RESPAWN_ABANDONED);
    assert_invariants(&manager);
}

#[test]
fn match_ends_once_with_the_lowest_zone_winning_ties() {
    let mut manager = started(rules(false, 100.0), 1);
    let mut ended = 0;

    // Factions 2 and 3 each claim one host; nobody else scores.
    manager.on_snatcher_shot(FactionId(2));
    manager.on_snatcher_shot(FactionId(3));
    for _ in 0..3 {
        manager.tick(0.1, &mut rng());
        ended += manager
            .drain_events()
            .iter()
            .filter(|event| matches!(event, MatchEvent::MatchEnded { .. }))
            .count();
    }

    assert_eq!(ended, 1);
    assert_eq!(manager.phase(), MatchPhase::Ended { winner: FactionId(2) });
    assert_eq!(manager.winner(), Some(FactionId(2)));

    // Everything is frozen afterwards.
    let host = held(&manager, FactionId(1)).expect("faction 1 still holds a host");
    assert!(!manager.possess_host(FactionId(4), host));
    assert_eq!(manager.on_snatcher_shot(FactionId(1)), None);
    let before = manager.clone();
    manager.tick(50.0, &mut rng());
    assert_eq!(manager.slots(), before.slots());
    assert!(!manager.can_respawn(FactionId(2)));
}

#[test]
fn queries_report_the_score_board() {
    let mut manager = started(rules(true, 1.0), 3);
    manager.on_snatcher_shot(FactionId(4));
    manager.kill_snatcher(FactionId(4), DeathCause::Missed);
    manager.tick(1.0, &mut rng());
    manager.on_snatcher_shot(FactionId(4));

    assert_eq!(manager.claim_count(FactionId(4)), 2);
    assert_eq!(manager.zone_name(FactionId(4)), "Blue");
    assert_eq!(manager.zone_name(FactionId(9)), "Zone 9");
    assert!((manager.decay_fraction(FactionId(1)) - 0.9).abs() < 1e-4);
    assert_eq!(manager.decay_fraction(FactionId(4)), 0.0);

    let board = manager.standings();
    assert_eq!(board[0].faction, FactionId(4));
    assert_eq!(board[0].claims, 2);
    assert_eq!(
        board.iter().skip(1).map(|row| row.faction).collect::<Vec<_>>(),
        vec![FactionId(1), FactionId(2), FactionId(3)]
    );
}

#[test]
fn zone_without_hosts_waits_for_respawn() {
    let mut manager = SnatcherManager::new(rules(false, 0.5));
    for zone in [1, 1, 2, 3] {
        manager.register_host(FactionId(zone));
    }
    manager.assign_initial_hosts(&mut rng());
    assert!(!alive(&manager, FactionId(4)));
    assert!(manager.can_respawn(FactionId(4)));

    manager.tick(0.5, &mut rng());
    assert!(alive(&manager, FactionId(4)));
    let host = held(&manager, FactionId(4)).expect("respawned");
    assert_eq!(manager.host(host).map(|h| h.zone()), Some(FactionId(1)));
}
