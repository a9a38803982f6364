//! Species behavior: what each agent wants to do this tick.
//!
//! Every species module exposes a pure `decide` and a `fitness` function.
//! `decide` only reads the committed world through a [`Context`] and its own
//! random stream, so all agents can decide in parallel. The returned
//! [`Action`] is resolved later, sequentially, by the effects queue.

pub mod apex;
pub mod grazer;
pub mod hunter;
pub mod parasite;
pub mod protector;
pub mod scavenger;
pub mod sea_hunter;

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId};
use super::food::Food;
use super::params::{FitnessWeights, Params};
use super::spatial::SpatialIndex;
use super::species::Species;
use super::terrain::{self, Rock, WaterZone};

/// How an agent moves this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    /// Stay in place.
    Hold,
    /// Keep going along a heading at base speed.
    Wander {
        /// New heading in radians.
        heading: f32,
    },
    /// Head for a point.
    Toward {
        /// Destination.
        target: [f32; 2],
        /// Multiplier on effective speed.
        speed_mult: f32,
    },
    /// Run directly away from a point.
    Away {
        /// Point to flee from.
        from: [f32; 2],
        /// Multiplier on effective speed.
        speed_mult: f32,
    },
    /// Move along a blended steering heading.
    Steer {
        /// Heading in radians.
        heading: f32,
        /// Multiplier on effective speed.
        speed_mult: f32,
    },
    /// Ride along with a host.
    Follow {
        /// Host to stick to.
        host: AgentId,
    },
}

/// How an attack resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Strike {
    /// The target dies and its energy goes to the attacker.
    Kill,
    /// The target loses `damage` energy; dies if it hits zero.
    Bite {
        /// Energy removed from the target.
        damage: f32,
    },
}

/// Effect on another entity, resolved in agent-id order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Interaction {
    /// Consume a food item (index into the food vector).
    Eat {
        /// Food index.
        food: usize,
    },
    /// Attack another agent.
    Attack {
        /// Target.
        target: AgentId,
        /// Kill or bite.
        strike: Strike,
    },
    /// Stun a predator.
    Stun {
        /// Target.
        target: AgentId,
    },
    /// Latch onto a host.
    Attach {
        /// Host.
        host: AgentId,
    },
    /// Drain the current host.
    Drain {
        /// Host.
        host: AgentId,
    },
    /// Let go of the current host.
    Detach,
    /// Convert a rock into a shelter (index into the rock vector).
    BuildShelter {
        /// Rock index.
        rock: usize,
    },
}

/// One agent's decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Movement component.
    pub movement: Movement,
    /// Optional effect on another entity.
    pub interaction: Option<Interaction>,
}

impl Action {
    /// Do nothing.
    pub const HOLD: Action = Action {
        movement: Movement::Hold,
        interaction: None,
    };

    /// Movement only.
    pub fn moving(movement: Movement) -> Self {
        Self {
            movement,
            interaction: None,
        }
    }

    /// Adds an interaction.
    pub fn with(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }
}

/// Borrowed view of the committed world shared by every decision.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    /// Agents sorted by id.
    pub agents: &'a [Agent],
    /// Food items.
    pub food: &'a [Food],
    /// Rocks and shelters.
    pub rocks: &'a [Rock],
    /// Water bands.
    pub water: &'a [WaterZone],
    /// Parameters.
    pub params: &'a Params,
}

impl<'a> WorldView<'a> {
    /// Looks an agent up by id.
    pub fn find_agent(&self, id: AgentId) -> Option<&'a Agent> {
        self.agents
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .map(|i| &self.agents[i])
    }
}

/// What one agent can perceive: neighbors within its vision radius, nearest
/// first, with real (not squared) distances.
pub struct Context<'a> {
    /// The whole committed world.
    pub world: WorldView<'a>,
    /// `(distance, index)` of live agents in vision, excluding self.
    pub nearby_agents: Vec<(f32, usize)>,
    /// `(distance, index)` of uneaten food in vision.
    pub nearby_food: Vec<(f32, usize)>,
    /// `(distance, index)` of rocks in vision.
    pub nearby_rocks: Vec<(f32, usize)>,
    /// Whether the agent stands in water.
    pub in_water: bool,
}

// Ties are broken by index so decisions never depend on tree layout.
fn to_distances(hits: Vec<(f32, usize)>) -> Vec<(f32, usize)> {
    let mut hits: Vec<(f32, usize)> = hits.into_iter().map(|(d2, i)| (d2.sqrt(), i)).collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits
}

impl<'a> Context<'a> {
    /// Gathers the local view of the agent at `idx`.
    pub fn build(idx: usize, world: WorldView<'a>, index: &SpatialIndex) -> Self {
        let agent = &world.agents[idx];
        let vision = agent.vision().max(0.0);
        let nearby_agents = to_distances(index.query_agents(&agent.pos, vision))
            .into_iter()
            .filter(|&(_, i)| i != idx)
            .collect();
        Self {
            world,
            nearby_agents,
            nearby_food: to_distances(index.query_food(&agent.pos, vision)),
            nearby_rocks: to_distances(index.query_rocks(&agent.pos, vision)),
            in_water: terrain::in_water(world.water, &agent.pos),
        }
    }

    /// Parameters.
    #[inline]
    pub fn params(&self) -> &'a Params {
        self.world.params
    }

    /// Nearest visible agent within `limit` matching `pred`.
    pub fn nearest_agent_within(
        &self,
        limit: f32,
        pred: impl Fn(&Agent) -> bool,
    ) -> Option<(f32, &'a Agent)> {
        let agents = self.world.agents;
        self.nearby_agents
            .iter()
            .take_while(|&&(d, _)| d <= limit)
            .map(|&(d, i)| (d, &agents[i]))
            .find(|(_, a)| pred(a))
    }

    /// Nearest visible agent whose species is in `species`.
    pub fn nearest_of(&self, species: &[Species], limit: f32) -> Option<(f32, &'a Agent)> {
        self.nearest_agent_within(limit, |a| species.contains(&a.species))
    }

    /// Visible agents within `limit` matching `pred`.
    pub fn agents_within<'s>(
        &'s self,
        limit: f32,
        pred: impl Fn(&Agent) -> bool + 's,
    ) -> impl Iterator<Item = (f32, &'a Agent)> + 's {
        let agents = self.world.agents;
        self.nearby_agents
            .iter()
            .take_while(move |&&(d, _)| d <= limit)
            .map(move |&(d, i)| (d, &agents[i]))
            .filter(move |(_, a)| pred(a))
    }

    /// Nearest visible food matching `pred`, as `(distance, index)`.
    pub fn nearest_food(&self, pred: impl Fn(&Food) -> bool) -> Option<(f32, usize)> {
        self.nearby_food
            .iter()
            .copied()
            .find(|&(_, i)| pred(&self.world.food[i]))
    }

    /// Nearest unconverted rock within `limit`, as `(distance, index)`.
    pub fn nearest_plain_rock(&self, limit: f32) -> Option<(f32, usize)> {
        self.nearby_rocks
            .iter()
            .copied()
            .take_while(|&(d, _)| d <= limit)
            .find(|&(_, i)| !self.world.rocks[i].is_shelter)
    }

    /// Target point for leaving the current water band.
    pub fn nearest_land(&self, pos: &Array1<f32>) -> Option<[f32; 2]> {
        terrain::nearest_land_point(self.world.water, pos).map(|p| [p[0], p[1]])
    }

    /// Target point for reaching the nearest water band.
    pub fn nearest_water(&self, pos: &Array1<f32>) -> Option<[f32; 2]> {
        terrain::nearest_water_point(self.world.water, pos).map(|p| [p[0], p[1]])
    }
}

/// Position as a plain pair.
#[inline]
pub fn xy(pos: &Array1<f32>) -> [f32; 2] {
    [pos[0], pos[1]]
}

/// Random walk with persistence: the heading occasionally turns a little.
pub fn wander<R: Rng + ?Sized>(agent: &Agent, params: &Params, rng: &mut R) -> Movement {
    let mut heading = agent.heading;
    if rng.random::<f32>() < params.wander_turn_chance {
        heading += rng.random_range(-0.6..=0.6);
    }
    Movement::Wander { heading }
}

/// Chance that an attack by `attacker` kills `prey`.
///
/// Faster and larger attackers do better; the result stays in `[0.1, 1]`.
pub fn kill_probability(attacker: &Agent, prey: &Agent) -> f32 {
    let speed_a = attacker.speed().max(1e-3);
    let size_a = attacker.size().max(1e-3);
    let p = 0.5
        + 0.25 * (speed_a - prey.speed()) / speed_a
        + 0.25 * (size_a - prey.size()) / size_a;
    p.clamp(0.1, 1.0)
}

/// Weighted linear fitness shared by all species.
pub fn linear_fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    let m = &agent.metrics;
    weights.kills * m.kills as f32
        + weights.stuns * m.stuns as f32
        + weights.attachments * m.attachments as f32
        + weights.drained_energy * m.drained_energy
        + weights.survival_ticks * m.survival_ticks as f32
        + weights.energy_gained * m.energy_gained
        + weights.final_energy * agent.energy.max(0.0)
}

/// Decides the agent's action for this tick.
///
/// Stunned agents hold still and do nothing else.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    if !agent.is_alive() || agent.status.is_stunned() {
        return Action::HOLD;
    }
    match agent.species {
        Species::Grazer => grazer::decide(agent, ctx, rng),
        Species::Hunter => hunter::decide(agent, ctx, rng),
        Species::Scavenger => scavenger::decide(agent, ctx, rng),
        Species::Protector => protector::decide(agent, ctx, rng),
        Species::Parasite => parasite::decide(agent, ctx, rng),
        Species::Apex => apex::decide(agent, ctx, rng),
        Species::SeaHunter => sea_hunter::decide(agent, ctx, rng),
    }
}

/// Fitness of an agent under its species' weights.
///
/// Non-decreasing in every accumulator.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    match agent.species {
        Species::Grazer => grazer::fitness(agent, weights),
        Species::Hunter => hunter::fitness(agent, weights),
        Species::Scavenger => scavenger::fitness(agent, weights),
        Species::Protector => protector::fitness(agent, weights),
        Species::Parasite => parasite::fitness(agent, weights),
        Species::Apex => apex::fitness(agent, weights),
        Species::SeaHunter => sea_hunter::fitness(agent, weights),
    }
}

/// Energy an agent of this species extracts from a food item.
pub fn food_value(agent: &Agent, food: &Food, params: &Params) -> f32 {
    match (agent.species, food.is_carcass()) {
        (Species::Scavenger, true) => scavenger::carcass_value(agent, food.energy),
        (Species::Scavenger, false) => params.scavenger_plant_energy.min(food.energy),
        _ => food.energy,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::simulation::dna::{Dna, Gene};
    use crate::simulation::geometric_utils::point;

    pub fn agent(id: u64, species: Species, x: f32, y: f32) -> Agent {
        let params = Params::default();
        let mut dna = Dna::default();
        dna.set(Gene::Speed, 2.0);
        dna.set(Gene::Vision, 150.0);
        dna.set(Gene::Size, 5.0);
        Agent::new(
            AgentId(id),
            species,
            0,
            point(x, y),
            0.0,
            dna,
            params.species(species),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::agent;
    use super::*;
    use crate::simulation::dna::Gene;

    #[test]
    fn kill_probability_is_clamped() {
        let mut strong = agent(1, Species::Hunter, 0.0, 0.0);
        let weak = agent(2, Species::Grazer, 0.0, 0.0);
        strong.dna.set(Gene::Speed, 100.0);
        strong.dna.set(Gene::Size, 100.0);
        assert_eq!(kill_probability(&strong, &weak), 1.0);
        assert!((kill_probability(&weak, &weak) - 0.5).abs() < 1e-6);
        let tiny = agent(3, Species::Hunter, 0.0, 0.0);
        let mut huge = agent(4, Species::Grazer, 0.0, 0.0);
        huge.dna.set(Gene::Size, 500.0);
        huge.dna.set(Gene::Speed, 500.0);
        assert_eq!(kill_probability(&tiny, &huge), 0.1);
    }

    #[test]
    fn fitness_grows_with_every_accumulator() {
        let params = Params::default();
        for species in Species::ALL {
            let weights = &params.species(species).fitness;
            let mut a = agent(1, species, 0.0, 0.0);
            let base = fitness(&a, weights);
            a.metrics.kills += 1;
            a.metrics.stuns += 1;
            a.metrics.attachments += 1;
            a.metrics.drained_energy += 1.0;
            a.metrics.survival_ticks += 1;
            a.metrics.energy_gained += 1.0;
            assert!(fitness(&a, weights) >= base, "{species}");
        }
    }
}
