use bevy::{math::Vec2, prelude::Resource};

use crate::faction::FactionId;

/// Fire requests from the human player, applied at the start of the next
/// frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct HumanInput {
    pending: Vec<(FactionId, Vec2)>,
}

impl HumanInput {
    pub fn queue_fire(&mut self, faction: FactionId, direction: Vec2) {
        self.pending.push((faction, direction));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (FactionId, Vec2)> + '_ {
        self.pending.drain(..)
    }
}
