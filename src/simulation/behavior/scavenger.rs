//! Scavenger: eats carcasses first, plants second, and hunts weak grazers
//! when there is nothing to eat.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, Strike, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

const FLEE_FRACTION: f32 = 0.8;
const HUNT_FRACTION: f32 = 0.5;
const HUNT_CHANCE: f32 = 0.35;

/// Energy a scavenger gets from a carcass holding `energy`.
pub fn carcass_value(agent: &Agent, energy: f32) -> f32 {
    energy * agent.dna.get(Gene::CarcassAffinity).max(0.0)
}

/// Flee, feed, hunt or wander, in that order of priority.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    let vision = agent.vision();

    if let Some((_, predator)) = ctx.nearest_of(Species::Scavenger.threats(), vision * FLEE_FRACTION) {
        return Action::moving(Movement::Away {
            from: xy(&predator.pos),
            speed_mult: 1.2,
        });
    }

    let meal = ctx
        .nearest_food(|f| f.is_carcass())
        .or_else(|| ctx.nearest_food(|f| !f.is_carcass()));
    if let Some((d, idx)) = meal {
        let action = Action::moving(Movement::Toward {
            target: xy(&ctx.world.food[idx].pos),
            speed_mult: 1.0,
        });
        if d < agent.size() + 4.0 {
            return action.with(Interaction::Eat { food: idx });
        }
        return action;
    }

    if let Some((d, prey)) = ctx.nearest_of(Species::Scavenger.prey(), vision * HUNT_FRACTION)
        && rng.random::<f32>() < HUNT_CHANCE
    {
        let action = Action::moving(Movement::Toward {
            target: xy(&prey.pos),
            speed_mult: if ctx.in_water { 0.7 } else { 1.05 },
        });
        if d < agent.size() + prey.size() {
            return action.with(Interaction::Attack {
                target: prey.id,
                strike: Strike::Kill,
            });
        }
        return action;
    }

    if ctx.in_water
        && let Some(target) = ctx.nearest_land(&agent.pos)
    {
        return Action::moving(Movement::Toward {
            target,
            speed_mult: 1.0,
        });
    }
    Action::moving(wander(agent, ctx.params(), rng))
}

/// Energy intake counts more for scavengers with a strong carcass affinity.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    let affinity = agent.dna.get(Gene::CarcassAffinity).max(0.0);
    let bonus = weights.energy_gained * agent.metrics.energy_gained * (affinity - 1.0).max(0.0);
    linear_fitness(agent, weights) + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::behavior::WorldView;
    use crate::simulation::behavior::test_support::agent;
    use crate::simulation::food::Food;
    use crate::simulation::geometric_utils::point;
    use crate::simulation::params::Params;
    use crate::simulation::rng::create_rng;
    use crate::simulation::spatial::SpatialIndex;

    #[test]
    fn carcass_is_preferred_over_a_closer_plant() {
        let params = Params::default();
        let agents = vec![agent(1, Species::Scavenger, 100.0, 100.0)];
        let food = vec![
            Food::plant(point(110.0, 100.0), 35.0),
            Food::carcass(point(160.0, 100.0), 55.0),
        ];
        let index = SpatialIndex::build(&agents, &food, &[]).expect("index");
        let world = WorldView {
            agents: &agents,
            food: &food,
            rocks: &[],
            water: &[],
            params: &params,
        };
        let ctx = Context::build(0, world, &index);
        let action = decide(&agents[0], &ctx, &mut create_rng(3));
        assert_eq!(
            action.movement,
            Movement::Toward {
                target: [160.0, 100.0],
                speed_mult: 1.0
            }
        );
    }
}
