//! Match-state engine for a four-faction possession game.
//!
//! Hosts wander a shared arena, each faction's snatcher occupies one host at a
//! time and jumps between them by firing itself as a projectile. The engine
//! owns who holds which host, decay and respawn, claims and the end of the
//! match; locomotion and collision come from a [`MatchWorld`] collaborator.
//! One [`run_frame`] call advances the chained pipeline built by
//! [`build_headless_app`].

pub mod ai;
pub mod config;
pub mod events;
mod faction;
mod host;
pub mod input;
pub mod layout;
pub mod log_capture;
pub mod manager;
pub mod metrics;
pub mod projectile;
mod registry;
pub mod reservation;
pub mod resources;
pub mod sandbox;
pub mod services;
pub mod setup;
mod slot;
pub mod snapshot;
pub mod systems;
pub mod wander;

use bevy::prelude::*;

pub use ai::{AiDecision, AiPilot, AiPilots, AiSettings};
pub use config::{load_match_config_from_env, MatchConfig, MatchConfigError, MATCH_CONFIG_ENV};
pub use events::{DeathCause, MatchEvent, MatchEventLog};
pub use faction::{ControllerMode, FactionId, FACTION_COUNT};
pub use host::{Host, HostId, HostStatus};
pub use input::HumanInput;
pub use layout::{ArenaLayout, LayoutError, PlacementPoint};
pub use log_capture::{LogCapture, LogCaptureLayer, LogEnvelope};
pub use manager::{MatchPhase, MatchRules, SnatcherManager, Standing};
pub use metrics::MatchMetrics;
pub use projectile::{MissReason, Projectile, ProjectileId, ProjectileOutcome, Projectiles};
pub use registry::{HostCensus, HostRegistry};
pub use reservation::{WanderPoint, WanderPointId, WanderPoints};
pub use resources::{FrameDelta, MatchClock, MatchRng};
pub use sandbox::{SandboxTuning, SandboxWorld};
pub use services::{Contact, MatchWorld, Navigation, ProjectilePhysics, SpatialQuery, WorldLink};
pub use setup::{prepare_match, MatchSetup, SetupError};
pub use slot::{Slot, RESPAWN_ABANDONED};
pub use snapshot::{MatchSnapshot, SnapshotHistory};
pub use wander::{PickFailure, WanderController, WanderPhase, WanderSettings, Wanderers};

/// Construct a Bevy [`App`] that runs one match of `config` on `layout`
/// inside `world`.
pub fn build_headless_app(
    config: MatchConfig,
    layout: ArenaLayout,
    world: Box<dyn MatchWorld>,
) -> App {
    let mut app = App::new();

    let rng = MatchRng::from_seed(config.seed);
    let rules = MatchRules::from_config(&config);
    let wanderers = Wanderers::new(WanderSettings::from_config(&config.wander));
    let pilots = AiPilots::new(AiSettings::from_config(&config.ai));
    let projectiles = Projectiles::from_config(&config.projectile);

    app.insert_resource(SnatcherManager::new(rules))
        .insert_resource(WanderPoints::default())
        .insert_resource(wanderers)
        .insert_resource(pilots)
        .insert_resource(projectiles)
        .insert_resource(HumanInput::default())
        .insert_resource(WorldLink::new(world))
        .insert_resource(rng)
        .insert_resource(MatchClock::default())
        .insert_resource(FrameDelta::default())
        .insert_resource(MatchMetrics::default())
        .insert_resource(MatchEventLog::default())
        .insert_resource(SnapshotHistory::default())
        .insert_resource(config)
        .insert_resource(layout)
        .add_plugins(MinimalPlugins)
        .add_systems(Startup, systems::start_match)
        .add_systems(
            Update,
            (
                systems::advance_clock,
                systems::step_world,
                systems::expire_reservations,
                systems::apply_human_input,
                systems::drive_ai_pilots,
                systems::advance_projectiles,
                systems::tick_match,
                systems::dispatch_host_controllers,
                systems::record_events,
                metrics::collect_metrics,
                snapshot::capture_snapshot,
            )
                .chain(),
        );

    app
}

/// [`build_headless_app`] on a [`SandboxWorld`] with the generated quadrant
/// arena described by `config.arena`.
pub fn build_sandbox_app(config: MatchConfig) -> App {
    let layout = ArenaLayout::quadrants(
        config.arena.extent,
        config.arena.points_per_zone,
        config.arena.reservation_timeout_seconds,
        config.seed,
    );
    let world = SandboxWorld::new(layout.bounds);
    build_headless_app(config, layout, Box::new(world))
}

/// Execute a single frame.
///
/// The first call also runs match setup. Each call processes the chained
/// systems configured in [`build_headless_app`]: clock, world step,
/// reservation expiry, human input, AI pilots, projectiles, match tick,
/// controller dispatch, events, metrics, snapshot.
pub fn run_frame(app: &mut App) {
    app.update();
}
