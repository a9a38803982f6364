//! Grazer: plant eater that herds, flees and builds shelters.
//!
//! Movement is a blend of steering vectors. Threat avoidance grows as the
//! threat gets closer and as bravery drops; herd cohesion and dispersion pull
//! toward or push away from nearby grazers; hunger makes food dominate.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, linear_fitness, wander};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::geometric_utils::{point, unit_towards};
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

const HERD_FRACTION: f32 = 0.6;
const PROTECTOR_FRACTION: f32 = 0.5;
const PROTECTOR_PULL: f32 = 0.3;
const FLEE_SPEED: f32 = 1.4;

/// Picks the grazer's movement and, when in reach, food or a rock to build on.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    let params = ctx.params();
    let vision = agent.vision();
    let mut steer = [0.0_f32; 2];
    let mut add = |dir: [f32; 2], weight: f32| {
        steer[0] += dir[0] * weight;
        steer[1] += dir[1] * weight;
    };

    let threat = ctx.nearest_of(Species::Grazer.threats(), vision);
    if let Some((d, predator)) = threat {
        let bravery = agent.dna.get(Gene::Bravery);
        let urgency = 2.0 * (1.0 - d / vision.max(1e-3)) * (1.5 - bravery);
        add(unit_towards(&predator.pos, &agent.pos), urgency.max(0.0));
    }

    let herd_radius = vision * HERD_FRACTION;
    let mut count = 0usize;
    let mut centroid = [0.0_f32; 2];
    for (_, mate) in ctx.agents_within(herd_radius, |a| a.species == Species::Grazer) {
        centroid[0] += mate.pos[0];
        centroid[1] += mate.pos[1];
        count += 1;
    }
    if count > 0 {
        let center = point(centroid[0] / count as f32, centroid[1] / count as f32);
        let toward = unit_towards(&agent.pos, &center);
        let crowding = (count as f32 / 5.0).min(1.0);
        add(toward, agent.dna.get(Gene::Cohesion));
        add([-toward[0], -toward[1]], agent.dna.get(Gene::Dispersion) * crowding);
    }

    let hungry = agent.energy < params.hunger_threshold * agent.max_energy;
    let food = ctx.nearest_food(|f| !f.is_carcass());
    if let Some((_, idx)) = food {
        let weight = if hungry { 1.0 } else { 0.3 };
        add(unit_towards(&agent.pos, &ctx.world.food[idx].pos), weight);
    }

    if let Some((_, protector)) =
        ctx.nearest_of(&[Species::Protector], vision * PROTECTOR_FRACTION)
    {
        add(unit_towards(&agent.pos, &protector.pos), PROTECTOR_PULL);
    }

    let movement = if steer[0].hypot(steer[1]) <= 1e-4 {
        wander(agent, params, rng)
    } else {
        Movement::Steer {
            heading: steer[1].atan2(steer[0]),
            speed_mult: if threat.is_some() { FLEE_SPEED } else { 1.0 },
        }
    };
    let action = Action::moving(movement);

    if let Some((d, idx)) = food
        && d < agent.size() + 4.0
    {
        return action.with(Interaction::Eat { food: idx });
    }
    if let Some((_, rock)) = ctx.nearest_plain_rock(agent.size() + 8.0)
        && rng.random::<f32>() < params.shelter_build_chance
    {
        return action.with(Interaction::BuildShelter { rock });
    }
    action
}

/// Survival and foraging.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::behavior::test_support::agent;
    use crate::simulation::behavior::WorldView;
    use crate::simulation::food::Food;
    use crate::simulation::params::Params;
    use crate::simulation::rng::create_rng;
    use crate::simulation::spatial::SpatialIndex;

    #[test]
    fn grazer_runs_from_a_hunter() {
        let params = Params::default();
        let agents = vec![
            agent(1, Species::Grazer, 100.0, 100.0),
            agent(2, Species::Hunter, 130.0, 100.0),
        ];
        let index = SpatialIndex::build(&agents, &[], &[]).expect("index");
        let world = WorldView {
            agents: &agents,
            food: &[],
            rocks: &[],
            water: &[],
            params: &params,
        };
        let ctx = Context::build(0, world, &index);
        let action = decide(&agents[0], &ctx, &mut create_rng(1));
        match action.movement {
            Movement::Steer { heading, .. } => assert!(heading.cos() < 0.0),
            other => panic!("expected steering, got {other:?}"),
        }
    }

    #[test]
    fn grazer_eats_food_in_reach() {
        let params = Params::default();
        let agents = vec![agent(1, Species::Grazer, 100.0, 100.0)];
        let food = vec![Food::plant(point(103.0, 100.0), 35.0)];
        let index = SpatialIndex::build(&agents, &food, &[]).expect("index");
        let world = WorldView {
            agents: &agents,
            food: &food,
            rocks: &[],
            water: &[],
            params: &params,
        };
        let ctx = Context::build(0, world, &index);
        let action = decide(&agents[0], &ctx, &mut create_rng(1));
        assert_eq!(action.interaction, Some(Interaction::Eat { food: 0 }));
    }
}
