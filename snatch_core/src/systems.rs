use bevy::{ecs::system::SystemParam, prelude::*};
use tracing::{debug, error, info};

use crate::{
    ai::AiPilots,
    config::MatchConfig,
    events::MatchEventLog,
    faction::ControllerMode,
    input::HumanInput,
    layout::ArenaLayout,
    manager::SnatcherManager,
    projectile::Projectiles,
    reservation::WanderPoints,
    resources::{FrameDelta, MatchClock, MatchRng},
    services::{Navigation, WorldLink},
    setup::prepare_match,
    wander::{WanderContext, Wanderers},
};

/// Resources rebuilt when a match is prepared.
#[derive(SystemParam)]
pub struct MatchState<'w> {
    pub manager: ResMut<'w, SnatcherManager>,
    pub points: ResMut<'w, WanderPoints>,
    pub wanderers: ResMut<'w, Wanderers>,
    pub pilots: ResMut<'w, AiPilots>,
    pub projectiles: ResMut<'w, Projectiles>,
}

pub fn start_match(
    config: Res<MatchConfig>,
    layout: Res<ArenaLayout>,
    mut world: ResMut<WorldLink>,
    mut rng: ResMut<MatchRng>,
    mut state: MatchState,
) {
    match prepare_match(&config, &layout, world.get_mut(), &mut rng.0) {
        Ok(setup) => {
            *state.manager = setup.manager;
            *state.points = setup.points;
            *state.wanderers = setup.wanderers;
            *state.pilots = setup.pilots;
            *state.projectiles = Projectiles::from_config(&config.projectile);
        }
        Err(err) => {
            error!(target: "snatch::setup", error = %err, "match.setup_failed");
        }
    }
}

pub fn advance_clock(delta: Res<FrameDelta>, mut clock: ResMut<MatchClock>) {
    clock.advance(delta.0);
}

pub fn step_world(delta: Res<FrameDelta>, mut world: ResMut<WorldLink>) {
    world.get_mut().step(delta.0);
}

pub fn expire_reservations(clock: Res<MatchClock>, mut points: ResMut<WanderPoints>) {
    let cleared = points.expire_stale(clock.elapsed);
    if cleared > 0 {
        debug!(target: "snatch::wander", cleared, "reservation.expired");
    }
}

pub fn apply_human_input(
    mut input: ResMut<HumanInput>,
    mut manager: ResMut<SnatcherManager>,
    mut projectiles: ResMut<Projectiles>,
    mut world: ResMut<WorldLink>,
) {
    for (faction, direction) in input.drain() {
        let is_human = manager
            .slot(faction)
            .map(|slot| slot.is_human())
            .unwrap_or(false);
        if !is_human {
            debug!(target: "snatch::match", faction = %faction, "input.not_human");
            continue;
        }
        projectiles.fire(faction, direction, &mut manager, world.get_mut());
    }
}

pub fn drive_ai_pilots(
    delta: Res<FrameDelta>,
    mut manager: ResMut<SnatcherManager>,
    mut pilots: ResMut<AiPilots>,
    mut projectiles: ResMut<Projectiles>,
    mut world: ResMut<WorldLink>,
) {
    if !manager.is_running() {
        return;
    }
    let shots = pilots.tick(delta.0, &manager, world.get_mut());
    for (faction, direction) in shots {
        projectiles.fire(faction, direction, &mut manager, world.get_mut());
    }
}

pub fn advance_projectiles(
    delta: Res<FrameDelta>,
    mut manager: ResMut<SnatcherManager>,
    mut projectiles: ResMut<Projectiles>,
    mut world: ResMut<WorldLink>,
) {
    projectiles.step(delta.0, &mut manager, world.get_mut());
}

pub fn tick_match(
    delta: Res<FrameDelta>,
    mut manager: ResMut<SnatcherManager>,
    mut rng: ResMut<MatchRng>,
) {
    manager.tick(delta.0, &mut rng.0);
}

/// The one place a host's [`ControllerMode`] is acted on.
///
/// Unpossessed hosts wander, possessed hosts give their reservation back,
/// decayed hosts leave the world. Once the match is over every non-human
/// body is stopped and wandering is frozen.
pub fn dispatch_host_controllers(
    delta: Res<FrameDelta>,
    clock: Res<MatchClock>,
    manager: Res<SnatcherManager>,
    mut wanderers: ResMut<Wanderers>,
    mut points: ResMut<WanderPoints>,
    mut world: ResMut<WorldLink>,
    mut rng: ResMut<MatchRng>,
) {
    let navigation = world.get_mut();

    if manager.is_ended() {
        if !wanderers.is_frozen() {
            wanderers.freeze(&mut points);
            let mut stopped = 0u32;
            for host in manager.hosts().iter() {
                if host.controller() != ControllerMode::Human {
                    navigation.stop(host.id());
                    stopped += 1;
                }
            }
            info!(target: "snatch::match", stopped, "controllers.frozen");
        }
        return;
    }

    let mut decayed = Vec::new();
    let (settings, controllers) = wanderers.split_mut();
    for (id, controller) in controllers.iter_mut() {
        let Some(host) = manager.host(*id) else {
            continue;
        };
        if host.is_decayed() {
            controller.disable(&mut points);
            navigation.deactivate(*id);
            decayed.push(*id);
            continue;
        }
        match host.controller() {
            ControllerMode::None => {
                controller.enable();
                let mut ctx = WanderContext {
                    navigation: &mut *navigation,
                    points: &mut *points,
                    rng: &mut rng.0,
                    settings,
                    now: clock.elapsed,
                };
                controller.tick(delta.0, &mut ctx);
            }
            mode @ (ControllerMode::Human | ControllerMode::Ai) => {
                if controller.is_enabled() {
                    debug!(
                        target: "snatch::wander",
                        host = %id,
                        mode = mode.as_str(),
                        "wander.handed_over"
                    );
                }
                controller.disable(&mut points);
            }
        }
    }

    for id in decayed {
        wanderers.remove(id);
        debug!(target: "snatch::wander", host = %id, "host.removed");
    }
}

pub fn record_events(mut manager: ResMut<SnatcherManager>, mut log: ResMut<MatchEventLog>) {
    let events = manager.drain_events();
    log.record(events);
}
