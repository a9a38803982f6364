//! Trait for entities that occupy a circle in the 2D world.
//!
//! Implemented by agents, food, rocks and obstacles so the spatial index and
//! the geometry helpers can treat them uniformly.

use ndarray::Array1;

/// Entity with a position and a footprint radius.
pub trait Locatable {
    /// Returns a reference to the entity's position.
    fn pos(&self) -> &Array1<f32>;

    /// Returns a mutable reference to the entity's position.
    fn pos_mut(&mut self) -> &mut Array1<f32>;

    /// Footprint radius used for contact and containment checks.
    fn radius(&self) -> f32;

    /// Whether `point` lies strictly inside the footprint.
    fn contains_point(&self, point: &Array1<f32>) -> bool {
        super::geometric_utils::distance(self.pos(), point) < self.radius()
    }
}
