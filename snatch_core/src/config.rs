use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::faction::{FactionId, FACTION_COUNT};

pub const BUILTIN_MATCH_CONFIG: &str = include_str!("data/match_config.json");

pub const MATCH_CONFIG_ENV: &str = "SNATCH_CONFIG_PATH";

/// Lower bound applied to the decay duration wherever it is used as a divisor.
pub const MIN_DECAY_SECONDS: f32 = 0.0001;

/// Tunables for a single match. Every section falls back to its defaults when
/// omitted from the JSON.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchConfig {
    /// RNG seed. `0` draws from entropy.
    pub seed: u64,
    pub decay: DecayConfig,
    pub respawn: RespawnConfig,
    pub zones: ZoneConfig,
    pub ai: AiConfig,
    pub projectile: ProjectileConfig,
    pub wander: WanderConfig,
    pub spawn: SpawnConfig,
    pub arena: ArenaConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            decay: DecayConfig::default(),
            respawn: RespawnConfig::default(),
            zones: ZoneConfig::default(),
            ai: AiConfig::default(),
            projectile: ProjectileConfig::default(),
            wander: WanderConfig::default(),
            spawn: SpawnConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecayConfig {
    pub enabled: bool,
    pub seconds: f32,
}

impl DecayConfig {
    pub fn duration(&self) -> f32 {
        self.seconds.max(MIN_DECAY_SECONDS)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seconds: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RespawnConfig {
    pub delay_seconds: f32,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self { delay_seconds: 3.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub names: [String; FACTION_COUNT],
    /// Zone driven by queued human input. `None` hands every zone to the AI.
    pub human_zone: Option<u8>,
}

impl ZoneConfig {
    pub fn human_faction(&self) -> Option<FactionId> {
        self.human_zone.and_then(FactionId::new)
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            names: [
                "Red".to_string(),
                "Yellow".to_string(),
                "Green".to_string(),
                "Blue".to_string(),
            ],
            human_zone: Some(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    pub shot_cooldown_seconds: f32,
    pub target_max_distance: f32,
    pub shot_min_distance: f32,
    pub shot_max_distance: f32,
    pub retarget_interval_seconds: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            shot_cooldown_seconds: 1.5,
            target_max_distance: 25.0,
            shot_min_distance: 3.0,
            shot_max_distance: 10.0,
            retarget_interval_seconds: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub lifetime_seconds: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 14.0,
            lifetime_seconds: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WanderConfig {
    pub min_destination_distance: f32,
    pub pick_attempts: u32,
    pub wait_min_seconds: f32,
    pub wait_max_seconds: f32,
    pub travel_timeout_seconds: f32,
    pub require_complete_path: bool,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_destination_distance: 6.0,
            pick_attempts: 25,
            wait_min_seconds: 0.3,
            wait_max_seconds: 1.2,
            travel_timeout_seconds: 6.0,
            require_complete_path: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub host_count: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self { host_count: 50 }
    }
}

/// Parameters for the generated quadrant arena used by the sandbox world.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub extent: f32,
    pub points_per_zone: u32,
    /// `0` disables reservation expiry.
    pub reservation_timeout_seconds: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            extent: 40.0,
            points_per_zone: 16,
            reservation_timeout_seconds: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchConfigError {
    #[error("failed to parse match config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read match config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid match config: {0}")]
    Invalid(String),
}

impl MatchConfig {
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_MATCH_CONFIG).expect("builtin match config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, MatchConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, MatchConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| MatchConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), MatchConfigError> {
        if self.respawn.delay_seconds < 0.0 {
            return Err(MatchConfigError::Invalid(
                "respawn.delay_seconds must not be negative".to_string(),
            ));
        }
        if let Some(zone) = self.zones.human_zone {
            if FactionId::new(zone).is_none() {
                return Err(MatchConfigError::Invalid(format!(
                    "zones.human_zone {zone} is outside 1..={FACTION_COUNT}"
                )));
            }
        }
        if self.wander.pick_attempts == 0 {
            return Err(MatchConfigError::Invalid(
                "wander.pick_attempts must be at least 1".to_string(),
            ));
        }
        if self.wander.wait_min_seconds > self.wander.wait_max_seconds {
            return Err(MatchConfigError::Invalid(
                "wander.wait_min_seconds exceeds wait_max_seconds".to_string(),
            ));
        }
        if self.ai.shot_min_distance > self.ai.shot_max_distance {
            return Err(MatchConfigError::Invalid(
                "ai.shot_min_distance exceeds shot_max_distance".to_string(),
            ));
        }
        if self.projectile.lifetime_seconds <= 0.0 {
            return Err(MatchConfigError::Invalid(
                "projectile.lifetime_seconds must be positive".to_string(),
            ));
        }
        if !(self.arena.extent.is_finite() && self.arena.extent > 0.0) {
            return Err(MatchConfigError::Invalid(format!(
                "arena.extent must be a positive number, got {}",
                self.arena.extent
            )));
        }
        Ok(())
    }
}

/// Loads the config named by `SNATCH_CONFIG_PATH`, falling back to the builtin
/// defaults when the variable is unset or the file is unusable.
pub fn load_match_config_from_env() -> MatchConfig {
    let Some(path) = env::var(MATCH_CONFIG_ENV).ok().map(PathBuf::from) else {
        return MatchConfig::builtin();
    };

    match MatchConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "snatch::setup",
                path = %path.display(),
                "match_config.loaded"
            );
            config
        }
        Err(err) => {
            tracing::warn!(
                target: "snatch::setup",
                path = %path.display(),
                error = %err,
                "match_config.load_failed"
            );
            MatchConfig::builtin()
        }
    }
}
