//! Food items that agents can consume for energy.
//!
//! Food is either a plant, which respawns over time, or a carcass dropped by
//! a dead agent.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometric_utils::point;
use super::locatable::Locatable;

/// Footprint radius of a food item.
pub const FOOD_RADIUS: f32 = 6.0;

/// What a food item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    /// Plant food.
    Plant,
    /// Remains of a dead agent.
    Carcass,
}

/// A food item that agents can consume for energy.
///
/// Consumption is atomic: the first claimant in id order takes all of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Energy value remaining.
    pub energy: f32,
    /// Plant or carcass.
    pub kind: FoodKind,
    /// Whether a replacement may spawn once this item is eaten.
    pub respawns: bool,
}

impl Food {
    /// Creates a plant at a position.
    pub fn plant(pos: Array1<f32>, energy: f32) -> Self {
        Self {
            pos,
            energy,
            kind: FoodKind::Plant,
            respawns: true,
        }
    }

    /// Creates a carcass at a position.
    pub fn carcass(pos: Array1<f32>, energy: f32) -> Self {
        Self {
            pos,
            energy,
            kind: FoodKind::Carcass,
            respawns: false,
        }
    }

    /// Creates a plant at a uniformly random position in the box.
    pub fn random_plant<R: Rng + ?Sized>(
        box_width: f32,
        box_height: f32,
        energy: f32,
        rng: &mut R,
    ) -> Self {
        let x = rng.random::<f32>() * box_width;
        let y = rng.random::<f32>() * box_height;
        Self::plant(point(x, y), energy)
    }

    /// Whether this item is a carcass.
    pub fn is_carcass(&self) -> bool {
        self.kind == FoodKind::Carcass
    }

    /// Checks if this food item has been fully consumed.
    pub fn is_consumed(&self) -> bool {
        self.energy <= 0.0
    }

    /// Takes all remaining energy.
    ///
    /// # Returns
    ///
    /// The energy the item held, zero if it was already consumed.
    pub fn consume(&mut self) -> f32 {
        let taken = self.energy.max(0.0);
        self.energy = 0.0;
        taken
    }
}

impl Locatable for Food {
    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn radius(&self) -> f32 {
        FOOD_RADIUS
    }
}
