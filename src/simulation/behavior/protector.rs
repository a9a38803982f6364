//! Protector: escorts grazers, stuns predators and builds shelters.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

const ESCORT_SPEED: f32 = 0.9;
const BUILD_REACH: f32 = 10.0;
const BUILD_MIN_ENERGY: f32 = 40.0;

/// Follows the nearest grazer. A ready stun takes priority over building.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    let movement = match ctx.nearest_of(&[Species::Grazer], agent.vision()) {
        Some((_, grazer)) => Movement::Toward {
            target: xy(&grazer.pos),
            speed_mult: ESCORT_SPEED,
        },
        None => wander(agent, ctx.params(), rng),
    };
    let action = Action::moving(movement);

    let stun_radius = agent.dna.get(Gene::StunRadius);
    if agent.status.stun_cooldown == 0
        && let Some((_, target)) = ctx.nearest_agent_within(stun_radius, |a| {
            a.species.is_stunnable() && !a.status.is_stunned()
        })
    {
        return action.with(Interaction::Stun { target: target.id });
    }

    if agent.energy > BUILD_MIN_ENERGY
        && let Some((_, rock)) = ctx.nearest_plain_rock(agent.size() + BUILD_REACH)
    {
        return action.with(Interaction::BuildShelter { rock });
    }
    action
}

/// Stuns landed and survival.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::behavior::WorldView;
    use crate::simulation::behavior::test_support::agent;
    use crate::simulation::params::Params;
    use crate::simulation::rng::create_rng;
    use crate::simulation::spatial::SpatialIndex;

    fn stun_decision(cooldown: u32) -> Action {
        let params = Params::default();
        let mut protector = agent(1, Species::Protector, 100.0, 100.0);
        protector.dna.set(Gene::StunRadius, 40.0);
        protector.status.stun_cooldown = cooldown;
        let agents = vec![protector, agent(2, Species::Hunter, 120.0, 100.0)];
        let index = SpatialIndex::build(&agents, &[], &[]).expect("index");
        let world = WorldView {
            agents: &agents,
            food: &[],
            rocks: &[],
            water: &[],
            params: &params,
        };
        let ctx = Context::build(0, world, &index);
        decide(&agents[0], &ctx, &mut create_rng(0))
    }

    #[test]
    fn stuns_hunter_in_radius_when_ready() {
        assert_eq!(
            stun_decision(0).interaction,
            Some(Interaction::Stun {
                target: crate::simulation::agent::AgentId(2)
            })
        );
    }

    #[test]
    fn cooldown_blocks_the_stun() {
        assert_eq!(stun_decision(5).interaction, None);
    }
}
