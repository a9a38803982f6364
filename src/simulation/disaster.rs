//! Disasters: earthquakes, tsunamis and meteors.
//!
//! A disaster is armed by the user, then triggered at a location, and applied
//! on the next tick boundary. Random disasters skip the arming step. Damage
//! falls off linearly from the center, shelters absorb part of it, and the
//! number of deaths per species is capped so one event never wipes out a
//! population.

use std::collections::BTreeMap;
use std::fmt;

use log::info;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId};
use super::behavior;
use super::geometric_utils::distance;
use super::params::Params;
use super::species::Species;
use super::terrain::Rock;

/// Kind of disaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Wide, moderate damage.
    Earthquake,
    /// Wide damage.
    Tsunami,
    /// Small, severe impact.
    Meteor,
}

impl EventType {
    /// Every event type.
    pub const ALL: [EventType; 3] = [EventType::Earthquake, EventType::Tsunami, EventType::Meteor];
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventType::Earthquake => "earthquake",
            EventType::Tsunami => "tsunami",
            EventType::Meteor => "meteor",
        })
    }
}

/// User-driven disaster state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DisasterState {
    /// Nothing pending.
    #[default]
    Idle,
    /// Waiting for a location.
    Armed(EventType),
    /// Will be applied at the next tick boundary.
    Triggering {
        /// Event to apply.
        event: EventType,
        /// Center x.
        x: f32,
        /// Center y.
        y: f32,
    },
}

/// Holds the disaster state between commands and ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisasterSystem {
    state: DisasterState,
}

impl DisasterSystem {
    /// Current state.
    pub fn state(&self) -> DisasterState {
        self.state
    }

    /// Arms an event type. Re-arming replaces the type; ignored while a
    /// trigger is pending.
    pub fn arm(&mut self, event: EventType) {
        if !matches!(self.state, DisasterState::Triggering { .. }) {
            self.state = DisasterState::Armed(event);
        }
    }

    /// Fires the armed event at a location.
    ///
    /// # Returns
    ///
    /// `false` when nothing was armed; the call is then a no-op.
    pub fn trigger(&mut self, x: f32, y: f32) -> bool {
        match self.state {
            DisasterState::Armed(event) if x.is_finite() && y.is_finite() => {
                self.state = DisasterState::Triggering { event, x, y };
                true
            }
            _ => false,
        }
    }

    /// Takes a pending trigger and returns to `Idle`.
    pub fn take_pending(&mut self) -> Option<(EventType, f32, f32)> {
        match self.state {
            DisasterState::Triggering { event, x, y } => {
                self.state = DisasterState::Idle;
                Some((event, x, y))
            }
            _ => None,
        }
    }
}

/// What one applied disaster did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterOutcome {
    /// Event type.
    pub event: EventType,
    /// Center of impact.
    pub center: [f32; 2],
    /// Deaths per species.
    pub casualties: BTreeMap<Species, usize>,
    /// Agents whose lethal damage was waived by the casualty cap.
    pub spared: Vec<AgentId>,
    /// Agents that took non-lethal damage.
    pub damaged: usize,
}

impl DisasterOutcome {
    /// Deaths across all species.
    pub fn total_casualties(&self) -> usize {
        self.casualties.values().sum()
    }
}

/// Damage at distance `d` before shelter mitigation.
///
/// Falls off linearly from `base_damage * severity` at the center to
/// `(1 - falloff)` of that at the rim; zero outside the radius.
pub fn raw_damage(base_damage: f32, severity: f32, falloff: f32, d: f32, radius: f32) -> f32 {
    if radius <= 0.0 || d > radius {
        return 0.0;
    }
    let t = (d / radius).clamp(0.0, 1.0);
    (base_damage * severity * (1.0 - falloff * t)).max(0.0)
}

/// Applies shelter mitigation to raw damage.
pub fn mitigated_damage(raw: f32, sheltered: bool, mitigation: f32) -> f32 {
    if sheltered {
        raw * (1.0 - mitigation.clamp(0.0, 1.0))
    } else {
        raw
    }
}

/// Most agents of one species a single disaster may kill.
pub fn casualty_cap(fraction: f32, population: usize) -> usize {
    let cap = (fraction.clamp(0.0, 1.0) * population as f32).ceil() as usize;
    cap.min(population)
}

/// Energy left to an agent spared by the casualty cap.
pub fn survivor_energy(agent: &Agent, params: &Params) -> f32 {
    let upkeep = agent.energy_cost(params.species(agent.species).base_energy_cost);
    (params.survivor_energy_floor.max(1.0) + upkeep).min(agent.max_energy)
}

/// Applies a disaster to every live agent in range.
///
/// Lethal candidates beyond the per-species cap are spared in descending
/// order of their current fitness. They keep `survivor_energy_floor` (at
/// least 1) plus one tick of their own energy cost, so the next energy charge
/// leaves them at the floor instead of starving them.
/// Killed agents are only flagged; removal and carcass drops happen during
/// the regular cleanup.
///
/// # Arguments
///
/// * `agents` - Every agent in the world
/// * `rocks` - Rocks and shelters
/// * `event` - Disaster type
/// * `center` - Impact position
/// * `params` - Damage, falloff, mitigation and cap settings
pub fn apply_disaster(
    agents: &mut [Agent],
    rocks: &[Rock],
    event: EventType,
    center: &Array1<f32>,
    params: &Params,
) -> DisasterOutcome {
    let settings = params.events.get(event);

    let mut population: BTreeMap<Species, usize> = BTreeMap::new();
    for agent in agents.iter().filter(|a| a.is_alive()) {
        *population.entry(agent.species).or_default() += 1;
    }

    let mut lethal: BTreeMap<Species, Vec<usize>> = BTreeMap::new();
    let mut damaged = 0;
    for (idx, agent) in agents.iter_mut().enumerate() {
        if !agent.is_alive() {
            continue;
        }
        let d = distance(&agent.pos, center);
        if d > settings.radius {
            continue;
        }
        let raw = raw_damage(
            settings.base_damage,
            settings.severity,
            params.disaster_falloff,
            d,
            settings.radius,
        );
        let sheltered = rocks.iter().any(|rock| rock.shelters(&agent.pos));
        let damage = mitigated_damage(raw, sheltered, params.shelter_mitigation);
        if damage >= agent.energy {
            lethal.entry(agent.species).or_default().push(idx);
        } else if damage > 0.0 {
            agent.consume_energy(damage);
            damaged += 1;
        }
    }

    let mut casualties = BTreeMap::new();
    let mut spared = Vec::new();
    for (species, mut candidates) in lethal {
        let pop = population.get(&species).copied().unwrap_or_default();
        let cap = casualty_cap(params.max_event_casualty_fraction, pop);
        let weights = &params.species(species).fitness;
        candidates.sort_by(|&a, &b| {
            let fa = behavior::fitness(&agents[a], weights);
            let fb = behavior::fitness(&agents[b], weights);
            fb.total_cmp(&fa).then(agents[a].id.cmp(&agents[b].id))
        });
        let to_spare = candidates.len().saturating_sub(cap);
        for (rank, &idx) in candidates.iter().enumerate() {
            let agent = &mut agents[idx];
            if rank < to_spare {
                agent.energy = survivor_energy(agent, params);
                spared.push(agent.id);
            } else {
                agent.kill();
            }
        }
        let dead = candidates.len() - to_spare;
        if dead > 0 {
            casualties.insert(species, dead);
        }
    }

    let outcome = DisasterOutcome {
        event,
        center: [center[0], center[1]],
        casualties,
        spared,
        damaged,
    };
    info!(
        "{event} at ({:.0}, {:.0}): {} casualties, {} spared",
        center[0],
        center[1],
        outcome.total_casualties(),
        outcome.spared.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_without_arm_is_ignored() {
        let mut system = DisasterSystem::default();
        assert!(!system.trigger(1.0, 2.0));
        assert_eq!(system.state(), DisasterState::Idle);
        assert!(system.take_pending().is_none());
    }

    #[test]
    fn arm_trigger_apply_cycle() {
        let mut system = DisasterSystem::default();
        system.arm(EventType::Meteor);
        assert_eq!(system.state(), DisasterState::Armed(EventType::Meteor));
        assert!(system.trigger(5.0, 6.0));
        assert_eq!(system.take_pending(), Some((EventType::Meteor, 5.0, 6.0)));
        assert_eq!(system.state(), DisasterState::Idle);
    }

    #[test]
    fn damage_falls_off_linearly() {
        let center = raw_damage(20.0, 1.0, 0.5, 0.0, 100.0);
        let rim = raw_damage(20.0, 1.0, 0.5, 100.0, 100.0);
        assert!((center - 20.0).abs() < 1e-5);
        assert!((rim - 10.0).abs() < 1e-5);
        assert_eq!(raw_damage(20.0, 1.0, 0.5, 101.0, 100.0), 0.0);
    }

    #[test]
    fn shelter_never_increases_damage() {
        for raw in [0.0, 1.0, 17.5, 300.0] {
            assert!(mitigated_damage(raw, true, 0.8) <= mitigated_damage(raw, false, 0.8));
        }
    }

    #[test]
    fn cap_rounds_up() {
        assert_eq!(casualty_cap(0.5, 10), 5);
        assert_eq!(casualty_cap(0.3, 7), 3);
        assert_eq!(casualty_cap(0.3, 0), 0);
    }
}
