//! Spatial indexing for efficient neighbor queries.
//!
//! KD-trees over agents, food and rocks are rebuilt once per tick from the
//! committed state. Trees store indices into those vectors, never references.

use kdtree::KdTree;
use kdtree::distance::squared_euclidean;
use ndarray::Array1;

use super::agent::Agent;
use super::error::SimulationError;
use super::food::Food;
use super::locatable::Locatable;
use super::terrain::Rock;

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Result of a spatial radius query: `(distance_squared, index)` pairs,
/// nearest first.
pub type SpatialQueryResult = Vec<(f32, usize)>;

const LEAF_CAPACITY: usize = 16;

/// Spatial index containing KD-trees for all entity types.
pub struct SpatialIndex {
    agents: Tree2D,
    food: Tree2D,
    rocks: Tree2D,
}

impl SpatialIndex {
    /// Builds a spatial index from the current world entities.
    ///
    /// Dead agents and consumed food are left out so queries only return
    /// things that can still be interacted with.
    ///
    /// # Returns
    ///
    /// A spatial index or an error if tree building fails, e.g. on NaN
    /// coordinates.
    pub fn build(agents: &[Agent], food: &[Food], rocks: &[Rock]) -> Result<Self, SimulationError> {
        Ok(Self {
            agents: build_tree(agents, Agent::is_alive)?,
            food: build_tree(food, |f| !f.is_consumed())?,
            rocks: build_tree(rocks, |_| true)?,
        })
    }

    /// An index with no entries.
    pub fn empty() -> Self {
        Self {
            agents: KdTree::with_capacity(2, LEAF_CAPACITY),
            food: KdTree::with_capacity(2, LEAF_CAPACITY),
            rocks: KdTree::with_capacity(2, LEAF_CAPACITY),
        }
    }

    /// Query agents within a radius.
    ///
    /// # Arguments
    ///
    /// * `pos` - Center position for the query
    /// * `radius` - Search radius (will be squared internally)
    pub fn query_agents(&self, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        query(&self.agents, pos, radius)
    }

    /// Query food within a radius.
    pub fn query_food(&self, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        query(&self.food, pos, radius)
    }

    /// Query rocks and shelters within a radius.
    pub fn query_rocks(&self, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        query(&self.rocks, pos, radius)
    }

    /// Number of indexed agents.
    pub fn agent_count(&self) -> usize {
        self.agents.size()
    }
}

fn query(tree: &Tree2D, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
    if tree.size() == 0 || !radius.is_finite() || radius < 0.0 {
        return Vec::new();
    }
    tree.within(&pos.to_vec(), radius.powi(2), &squared_euclidean)
        .unwrap_or_default()
        .into_iter()
        .map(|(dist, &idx)| (dist, idx))
        .collect()
}

/// Helper function to build a KD-tree from the items passing `keep`.
fn build_tree<T: Locatable>(items: &[T], keep: impl Fn(&T) -> bool) -> Result<Tree2D, SimulationError> {
    let mut tree = KdTree::with_capacity(2, LEAF_CAPACITY);
    for (i, item) in items.iter().enumerate() {
        if !keep(item) {
            continue;
        }
        tree.add(item.pos().to_vec(), i)
            .map_err(|e| SimulationError::SpatialIndex(format!("{e:?}")))?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometric_utils::point;

    #[test]
    fn food_query_skips_consumed_items() {
        let mut food = vec![
            Food::plant(point(0.0, 0.0), 10.0),
            Food::plant(point(3.0, 0.0), 10.0),
            Food::plant(point(50.0, 0.0), 10.0),
        ];
        food[0].consume();
        let index = SpatialIndex::build(&[], &food, &[]).expect("valid positions");
        let hits = index.query_food(&point(0.0, 0.0), 10.0);
        assert_eq!(hits, vec![(9.0, 1)]);
    }

    #[test]
    fn nan_position_is_an_error() {
        let rocks = vec![Rock::new(point(f32::NAN, 0.0), 1.0)];
        assert!(SpatialIndex::build(&[], &[], &rocks).is_err());
    }

    #[test]
    fn empty_index_answers_nothing() {
        let index = SpatialIndex::empty();
        assert!(index.query_agents(&point(0.0, 0.0), 100.0).is_empty());
    }
}
