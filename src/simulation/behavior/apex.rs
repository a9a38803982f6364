//! Apex: bold top predator that also hunts hunters and protectors.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, Strike, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

/// Chases the nearest prey and kills on contact. Leaves water when idle.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    if let Some((d, prey)) = ctx.nearest_of(Species::Apex.prey(), agent.vision()) {
        let action = Action::moving(Movement::Toward {
            target: xy(&prey.pos),
            speed_mult: if ctx.in_water { 0.6 } else { 1.3 },
        });
        let reach = agent.size() + prey.size() + agent.dna.get(Gene::AttackRange);
        if d < reach {
            return action.with(Interaction::Attack {
                target: prey.id,
                strike: Strike::Kill,
            });
        }
        return action;
    }

    match ctx.nearest_land(&agent.pos) {
        Some(target) if ctx.in_water => Action::moving(Movement::Toward {
            target,
            speed_mult: 1.0,
        }),
        _ => Action::moving(wander(agent, ctx.params(), rng)),
    }
}

/// Kills and survival.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}
