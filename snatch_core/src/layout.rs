use bevy::{
    math::{Rect, Vec2},
    prelude::Resource,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::faction::FactionId;

/// A static placement marker: somewhere a host may spawn and a wander point
/// sits.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPoint {
    pub position: Vec2,
    /// Raw zone number; checked against 1..=4 when the match is prepared.
    pub zone: u8,
    pub capacity: u32,
    pub reservation_timeout: f32,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to parse arena layout: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("arena layout has a non-positive extent {0}")]
    InvalidExtent(f32),
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    extent: f32,
    points: Vec<PointFile>,
}

#[derive(Debug, Deserialize)]
struct PointFile {
    position: [f32; 2],
    zone: u8,
    #[serde(default = "default_capacity")]
    capacity: u32,
    #[serde(default)]
    reservation_timeout_seconds: f32,
}

fn default_capacity() -> u32 {
    1
}

/// Placement data the match is built from.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ArenaLayout {
    pub bounds: Rect,
    pub points: Vec<PlacementPoint>,
}

impl ArenaLayout {
    /// Square arena of half-size `extent` split into four quadrant zones:
    /// 1 north-west, 2 north-east, 3 south-west, 4 south-east.
    pub fn quadrants(extent: f32, points_per_zone: u32, reservation_timeout: f32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
        let margin = extent * 0.1;
        let span = extent - 2.0 * margin;
        let mut points = Vec::with_capacity(points_per_zone as usize * FactionId::ALL.len());
        for faction in FactionId::ALL {
            let (sx, sy) = match faction.0 {
                1 => (-1.0, 1.0),
                2 => (1.0, 1.0),
                3 => (-1.0, -1.0),
                _ => (1.0, -1.0),
            };
            for _ in 0..points_per_zone {
                let x = margin + rng.gen::<f32>() * span;
                let y = margin + rng.gen::<f32>() * span;
                points.push(PlacementPoint {
                    position: Vec2::new(sx * x, sy * y),
                    zone: faction.0,
                    capacity: 1,
                    reservation_timeout,
                });
            }
        }
        Self {
            bounds: Rect::new(-extent, -extent, extent, extent),
            points,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile = serde_json::from_str(json)?;
        if file.extent <= 0.0 {
            return Err(LayoutError::InvalidExtent(file.extent));
        }
        Ok(Self {
            bounds: Rect::new(-file.extent, -file.extent, file.extent, file.extent),
            points: file
                .points
                .into_iter()
                .map(|point| PlacementPoint {
                    position: Vec2::from_array(point.position),
                    zone: point.zone,
                    capacity: point.capacity,
                    reservation_timeout: point.reservation_timeout_seconds,
                })
                .collect(),
        })
    }
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::quadrants(40.0, 16, 0.0, 1)
    }
}
