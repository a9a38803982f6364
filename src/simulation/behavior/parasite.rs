//! Parasite: latches onto hosts and drains them.
//!
//! While attached the parasite rides along with its host. It lets go when the
//! host dies or after `attach_time` ticks, then waits out a cooldown.

use rand::Rng;

use super::{Action, Context, Interaction, Movement, linear_fitness, wander, xy};
use crate::simulation::agent::Agent;
use crate::simulation::dna::Gene;
use crate::simulation::params::FitnessWeights;
use crate::simulation::species::Species;

const SEEK_SPEED: f32 = 1.2;
const CONTACT: f32 = 4.0;

/// Maximum ticks the parasite stays on one host.
pub fn attach_limit(agent: &Agent) -> u32 {
    agent.dna.get(Gene::AttachTime).max(0.0) as u32
}

/// Stays attached while the host lives, otherwise seeks a new host.
pub fn decide<R: Rng + ?Sized>(agent: &Agent, ctx: &Context<'_>, rng: &mut R) -> Action {
    if let Some(attachment) = agent.attachment {
        let host_alive = ctx
            .world
            .find_agent(attachment.host)
            .is_some_and(Agent::is_alive);
        if host_alive && attachment.ticks < attach_limit(agent) {
            return Action::moving(Movement::Follow {
                host: attachment.host,
            })
            .with(Interaction::Drain {
                host: attachment.host,
            });
        }
        return Action::HOLD.with(Interaction::Detach);
    }

    let Some((d, host)) = ctx.nearest_of(Species::Parasite.prey(), agent.vision()) else {
        return Action::moving(wander(agent, ctx.params(), rng));
    };
    if d < agent.size() + CONTACT {
        if agent.status.attach_cooldown == 0 {
            return Action::HOLD.with(Interaction::Attach { host: host.id });
        }
        return Action::HOLD;
    }
    Action::moving(Movement::Toward {
        target: xy(&host.pos),
        speed_mult: SEEK_SPEED,
    })
}

/// Attachments, drained energy and survival.
pub fn fitness(agent: &Agent, weights: &FitnessWeights) -> f32 {
    linear_fitness(agent, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::agent::{AgentId, Attachment};
    use crate::simulation::behavior::WorldView;
    use crate::simulation::behavior::test_support::agent;
    use crate::simulation::params::Params;
    use crate::simulation::rng::create_rng;
    use crate::simulation::spatial::SpatialIndex;

    fn decide_with(parasite: Agent, host: Agent) -> Action {
        let params = Params::default();
        let agents = vec![host, parasite];
        let index = SpatialIndex::build(&agents, &[], &[]).expect("index");
        let world = WorldView {
            agents: &agents,
            food: &[],
            rocks: &[],
            water: &[],
            params: &params,
        };
        let ctx = Context::build(1, world, &index);
        decide(&agents[1], &ctx, &mut create_rng(0))
    }

    #[test]
    fn attaches_on_contact() {
        let host = agent(1, Species::Grazer, 100.0, 100.0);
        let parasite = agent(2, Species::Parasite, 103.0, 100.0);
        assert_eq!(
            decide_with(parasite, host).interaction,
            Some(Interaction::Attach { host: AgentId(1) })
        );
    }

    #[test]
    fn detaches_when_time_is_up() {
        let host = agent(1, Species::Grazer, 100.0, 100.0);
        let mut parasite = agent(2, Species::Parasite, 100.0, 100.0);
        parasite.dna.set(Gene::AttachTime, 10.0);
        parasite.attachment = Some(Attachment {
            host: AgentId(1),
            ticks: 10,
        });
        assert_eq!(
            decide_with(parasite, host).interaction,
            Some(Interaction::Detach)
        );
    }
}
