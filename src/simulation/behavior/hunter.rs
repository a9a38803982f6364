//! Hunter: land predator of grazers and scavengers.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, Strike, kill_probability, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

const PURSUIT_SPEED: f32 = 1.25;
const RETREAT_SPEED: f32 = 1.1;

/// Backs off from protectors about to stun it, otherwise chases and attacks
/// the nearest prey.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    let vision = agent.vision();

    let guard = ctx.nearest_of(&[Species::Protector], vision * 0.5);
    if let Some((d, protector)) = guard
        && d < protector.dna.get(Gene::StunRadius)
    {
        return Action::moving(Movement::Away {
            from: xy(&protector.pos),
            speed_mult: RETREAT_SPEED,
        });
    }

    let Some((d, prey)) = ctx.nearest_of(Species::Hunter.prey(), vision) else {
        return Action::moving(wander(agent, ctx.params(), rng));
    };
    let action = Action::moving(Movement::Toward {
        target: xy(&prey.pos),
        speed_mult: PURSUIT_SPEED,
    });
    let reach = agent.dna.get(Gene::AttackRange) + agent.size();
    if d < reach && rng.random::<f32>() < kill_probability(agent, prey) {
        return action.with(Interaction::Attack {
            target: prey.id,
            strike: Strike::Kill,
        });
    }
    action
}

/// Kills and energy intake.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}
