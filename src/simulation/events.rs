//! Effect queue for deterministic simulation state updates.
//!
//! Agents decide in parallel and push their [`Action`]s here. The queue is
//! then applied serially in ascending agent id: first every movement, then
//! every interaction. Contested resources go to the lowest id, and an agent
//! killed earlier in the pass no longer acts.

use std::collections::BTreeSet;
use std::f32::consts::PI;

use log::debug;

use super::agent::{Agent, AgentId, Attachment};
use super::behavior::{self, Action, Interaction, Movement, Strike};
use super::dna::Gene;
use super::food::Food;
use super::geometric_utils::{self, clamp_to_bounds, heading_towards, point, push_out_of_circle};
use super::params::Params;
use super::species::Species;
use super::terrain::{self, Obstacle, Rock, WaterZone};

/// Queue of proposed actions collected from the decide phase.
#[derive(Debug, Default)]
pub struct EffectQueue {
    actions: Vec<(AgentId, Action)>,
}

impl EffectQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one agent's action.
    pub fn push(&mut self, agent: AgentId, action: Action) {
        self.actions.push((agent, action));
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn into_sorted(mut self) -> Vec<(AgentId, Action)> {
        self.actions.sort_by_key(|&(id, _)| id);
        self.actions
    }
}

impl FromIterator<(AgentId, Action)> for EffectQueue {
    fn from_iter<I: IntoIterator<Item = (AgentId, Action)>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

/// Mutable world entities the queue writes to.
pub struct WorldMut<'w> {
    /// Agents sorted by id.
    pub agents: &'w mut [Agent],
    /// Food items.
    pub food: &'w mut [Food],
    /// Rocks and shelters.
    pub rocks: &'w mut [Rock],
    /// Active obstacles.
    pub obstacles: &'w [Obstacle],
    /// Water bands.
    pub water: &'w [WaterZone],
}

/// A kill resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillRecord {
    /// Attacker.
    pub killer: AgentId,
    /// Attacker species.
    pub killer_species: Species,
    /// Victim.
    pub victim: AgentId,
    /// Victim species.
    pub victim_species: Species,
}

/// Tally of what the apply phase did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectsReport {
    /// Kills, in resolution order.
    pub kills: Vec<KillRecord>,
    /// Food items eaten.
    pub food_eaten: usize,
    /// Stuns landed.
    pub stuns: usize,
    /// Parasite attachments made.
    pub attachments: usize,
    /// Rocks turned into shelters.
    pub shelters_built: usize,
}

fn position(agents: &[Agent], id: AgentId) -> Option<usize> {
    agents.binary_search_by_key(&id, |a| a.id).ok()
}

/// Mutable access to two distinct agents.
fn pair_mut(agents: &mut [Agent], a: usize, b: usize) -> Option<(&mut Agent, &mut Agent)> {
    if a == b || a >= agents.len() || b >= agents.len() {
        return None;
    }
    if a < b {
        let (left, right) = agents.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = agents.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}

/// Applies all queued actions to the world.
///
/// # Arguments
///
/// * `world` - Entities to update
/// * `params` - Simulation parameters
/// * `queue` - Actions from the decide phase
///
/// # Returns
///
/// What happened, for logging and statistics.
pub fn apply_effects(world: WorldMut<'_>, params: &Params, queue: EffectQueue) -> EffectsReport {
    let WorldMut {
        agents,
        food,
        rocks,
        obstacles,
        water,
    } = world;
    let actions = queue.into_sorted();
    let mut report = EffectsReport::default();

    mark_parasitized(agents);

    for (id, action) in &actions {
        if let Some(idx) = position(agents, *id) {
            move_agent(&mut agents[idx], action.movement, obstacles, water, params);
        }
    }
    for (id, action) in &actions {
        if let Movement::Follow { host } = action.movement {
            follow_host(agents, *id, host);
        }
    }

    for (id, action) in &actions {
        let Some(interaction) = action.interaction else {
            continue;
        };
        let Some(idx) = position(agents, *id) else {
            continue;
        };
        if !agents[idx].is_alive() {
            continue;
        }
        resolve(agents, food, rocks, idx, interaction, params, &mut report);
    }
    report
}

/// Flags every agent that currently carries a parasite.
fn mark_parasitized(agents: &mut [Agent]) {
    let hosts: BTreeSet<AgentId> = agents
        .iter()
        .filter(|a| a.is_alive())
        .filter_map(|a| a.attachment.map(|att| att.host))
        .collect();
    for agent in agents.iter_mut() {
        agent.status.parasitized = hosts.contains(&agent.id);
    }
}

fn move_agent(
    agent: &mut Agent,
    movement: Movement,
    obstacles: &[Obstacle],
    water: &[WaterZone],
    params: &Params,
) {
    if !agent.is_alive() {
        return;
    }
    let (heading, speed_mult, limit) = match movement {
        Movement::Hold | Movement::Follow { .. } => {
            agent.vel.fill(0.0);
            return;
        }
        Movement::Wander { heading } => (heading, 1.0, f32::INFINITY),
        Movement::Steer {
            heading,
            speed_mult,
        } => (heading, speed_mult, f32::INFINITY),
        Movement::Toward { target, speed_mult } => {
            let target = point(target[0], target[1]);
            let dist = geometric_utils::distance(&agent.pos, &target);
            if dist <= f32::EPSILON {
                agent.vel.fill(0.0);
                return;
            }
            (heading_towards(&agent.pos, &target), speed_mult, dist)
        }
        Movement::Away { from, speed_mult } => {
            let from = point(from[0], from[1]);
            let heading = if geometric_utils::distance(&agent.pos, &from) <= f32::EPSILON {
                agent.heading
            } else {
                heading_towards(&from, &agent.pos)
            };
            (heading, speed_mult, f32::INFINITY)
        }
    };

    let wet = terrain::in_water(water, &agent.pos);
    let step = (agent.effective_speed(wet, params) * speed_mult.max(0.0)).min(limit);
    agent.heading = heading;
    agent.vel[0] = heading.cos() * step;
    agent.vel[1] = heading.sin() * step;
    let vel = agent.vel.clone();
    agent.pos += &vel;

    let size = agent.size();
    for obstacle in obstacles {
        push_out_of_circle(&mut agent.pos, &obstacle.pos, obstacle.radius + size);
    }
    if clamp_to_bounds(&mut agent.pos, params.world_width, params.world_height)
        && matches!(movement, Movement::Wander { .. })
    {
        agent.heading += PI;
    }
}

fn follow_host(agents: &mut [Agent], id: AgentId, host: AgentId) {
    let (Some(idx), Some(host_idx)) = (position(agents, id), position(agents, host)) else {
        return;
    };
    if let Some((parasite, host)) = pair_mut(agents, idx, host_idx)
        && host.is_alive()
    {
        parasite.pos.assign(&host.pos);
        parasite.vel.assign(&host.vel);
        parasite.heading = host.heading;
    }
}

fn resolve(
    agents: &mut [Agent],
    food: &mut [Food],
    rocks: &mut [Rock],
    idx: usize,
    interaction: Interaction,
    params: &Params,
    report: &mut EffectsReport,
) {
    match interaction {
        Interaction::Eat { food: food_idx } => {
            let Some(item) = food.get_mut(food_idx) else {
                return;
            };
            if item.is_consumed() {
                return;
            }
            let agent = &mut agents[idx];
            let value = behavior::food_value(agent, item, params);
            item.consume();
            agent.metrics.energy_gained += agent.gain_energy(value);
            report.food_eaten += 1;
        }
        Interaction::Attack { target, strike } => {
            let Some(target_idx) = position(agents, target) else {
                return;
            };
            let Some((attacker, victim)) = pair_mut(agents, idx, target_idx) else {
                return;
            };
            if !victim.is_alive() {
                return;
            }
            let killed = match strike {
                Strike::Kill => {
                    let transfer = victim.energy.max(params.kill_energy_floor);
                    victim.kill();
                    attacker.metrics.energy_gained += attacker.gain_energy(transfer);
                    true
                }
                Strike::Bite { damage } => {
                    victim.consume_energy(damage);
                    attacker.metrics.energy_gained += attacker.gain_energy(params.bite_energy);
                    if victim.energy <= 0.0 {
                        victim.kill();
                    }
                    !victim.is_alive()
                }
            };
            if killed {
                attacker.metrics.kills += 1;
                debug!(
                    "{} {} killed {} {}",
                    attacker.species, attacker.id, victim.species, victim.id
                );
                report.kills.push(KillRecord {
                    killer: attacker.id,
                    killer_species: attacker.species,
                    victim: victim.id,
                    victim_species: victim.species,
                });
            }
        }
        Interaction::Stun { target } => {
            let Some(target_idx) = position(agents, target) else {
                return;
            };
            let Some((protector, victim)) = pair_mut(agents, idx, target_idx) else {
                return;
            };
            if !victim.is_alive() || protector.status.stun_cooldown > 0 {
                return;
            }
            victim
                .status
                .apply_stun(params.stun_duration, params.stun_slow_factor);
            protector.status.stun_cooldown = protector.dna.get(Gene::StunCooldown).max(0.0) as u32;
            protector.metrics.stuns += 1;
            report.stuns += 1;
        }
        Interaction::Attach { host } => {
            let host_alive = position(agents, host).is_some_and(|h| agents[h].is_alive());
            let parasite = &mut agents[idx];
            if !host_alive || parasite.attachment.is_some() || parasite.status.attach_cooldown > 0 {
                return;
            }
            parasite.attachment = Some(Attachment { host, ticks: 0 });
            parasite.metrics.attachments += 1;
            report.attachments += 1;
        }
        Interaction::Drain { host } => {
            let pair = match position(agents, host) {
                Some(h) => pair_mut(agents, idx, h),
                None => None,
            };
            let drained = match pair {
                Some((parasite, host)) if host.is_alive() => {
                    let drain = parasite.dna.get(Gene::DrainRate).max(0.0);
                    host.consume_energy(drain * params.host_drain_ratio);
                    if host.energy <= 0.0 {
                        host.kill();
                    }
                    parasite.gain_energy(drain);
                    parasite.metrics.drained_energy += drain;
                    if let Some(attachment) = parasite.attachment.as_mut() {
                        attachment.ticks += 1;
                    }
                    host.is_alive()
                }
                _ => false,
            };
            if !drained {
                detach(&mut agents[idx], params);
            }
        }
        Interaction::Detach => detach(&mut agents[idx], params),
        Interaction::BuildShelter { rock } => {
            let Some(rock) = rocks.get_mut(rock) else {
                return;
            };
            if !rock.convert_to_shelter(params.shelter_radius) {
                return;
            }
            let builder = &mut agents[idx];
            if builder.species == Species::Protector {
                builder.consume_energy(params.shelter_build_cost);
            }
            report.shelters_built += 1;
        }
    }
}

fn detach(parasite: &mut Agent, params: &Params) {
    if parasite.attachment.take().is_some() {
        parasite.status.attach_cooldown = params.attach_cooldown_ticks;
    }
}
