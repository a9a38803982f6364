//! Sea hunter: a biting predator that keeps to the water bands.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, Strike, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

/// Returns to water when on land; in water bites the nearest prey.
///
/// The water speed bonus is part of [`Agent::effective_speed`], so pursuit
/// uses a plain multiplier.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    if !ctx.in_water
        && let Some(target) = ctx.nearest_water(&agent.pos)
    {
        // Water bias trades off returning home against chasing prey on land.
        let bias = agent.dna.get(Gene::WaterBias);
        let prey_on_land = ctx.nearest_of(Species::SeaHunter.prey(), agent.vision() * (1.0 - bias));
        if prey_on_land.is_none() {
            return Action::moving(Movement::Toward {
                target,
                speed_mult: 1.1,
            });
        }
    }

    let Some((d, prey)) = ctx.nearest_of(Species::SeaHunter.prey(), agent.vision()) else {
        return Action::moving(wander(agent, ctx.params(), rng));
    };
    let action = Action::moving(Movement::Toward {
        target: xy(&prey.pos),
        speed_mult: 1.0,
    });
    if d < agent.size() + prey.size() {
        return action.with(Interaction::Attack {
            target: prey.id,
            strike: Strike::Bite {
                damage: agent.dna.get(Gene::AttackPower),
            },
        });
    }
    action
}

/// Kills and survival.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}
