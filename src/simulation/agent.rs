//! Agent state, status effects and fitness accumulators.
//!
//! Agents live in an arena sorted by [`AgentId`]. Everything that refers to
//! another agent (attachments, stun targets, spatial queries) stores an id or
//! an arena index, never a reference.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::dna::{Dna, Gene};
use super::geometric_utils;
use super::locatable::Locatable;
use super::params::{Params, SpeciesParams};
use super::species::Species;

/// Stable agent identifier, unique for the lifetime of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-episode counters feeding the fitness function.
///
/// All fields are non-negative and only ever grow during an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessAccumulators {
    /// Successful kills.
    pub kills: u32,
    /// Stuns landed on predators.
    pub stuns: u32,
    /// Hosts attached to.
    pub attachments: u32,
    /// Energy drained from hosts.
    pub drained_energy: f32,
    /// Ticks survived.
    pub survival_ticks: u64,
    /// Energy gained from food, carcasses, kills and bites.
    pub energy_gained: f32,
}

/// Timed status effects and cooldowns, counted in ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Remaining ticks of zero velocity.
    pub stunned: u32,
    /// Remaining ticks of reduced speed.
    pub slowed: u32,
    /// Speed multiplier while `slowed > 0`.
    pub slow_factor: f32,
    /// Whether a parasite held on to this agent at the start of the tick.
    pub parasitized: bool,
    /// Ticks until the protector can stun again.
    pub stun_cooldown: u32,
    /// Ticks until the parasite can attach again.
    pub attach_cooldown: u32,
}

impl StatusEffects {
    /// Counts every timer down by one tick.
    pub fn tick(&mut self) {
        self.stunned = self.stunned.saturating_sub(1);
        self.slowed = self.slowed.saturating_sub(1);
        self.stun_cooldown = self.stun_cooldown.saturating_sub(1);
        self.attach_cooldown = self.attach_cooldown.saturating_sub(1);
    }

    /// Whether the agent is currently stunned.
    pub fn is_stunned(&self) -> bool {
        self.stunned > 0
    }

    /// Stuns for `duration` full ticks and slows for twice as long.
    ///
    /// Stuns land during the apply phase, after movement, and the landing
    /// tick is aged like any other, so both timers carry one extra tick.
    pub fn apply_stun(&mut self, duration: u32, slow_factor: f32) {
        self.stunned = self.stunned.max(duration.saturating_add(1));
        self.slowed = self
            .slowed
            .max(duration.saturating_mul(2).saturating_add(1));
        self.slow_factor = slow_factor;
    }
}

/// A parasite's hold on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Host being drained.
    pub host: AgentId,
    /// Ticks attached so far.
    pub ticks: u32,
}

/// A simulated creature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Species tag.
    pub species: Species,
    /// Cosmetic sub-group.
    pub clan: u8,
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Displacement applied on the last tick.
    pub vel: Array1<f32>,
    /// Heading in radians.
    pub heading: f32,
    /// Current energy in `[0, max_energy]`.
    pub energy: f32,
    /// Energy cap of the species.
    pub max_energy: f32,
    /// Ticks alive.
    pub age: u64,
    /// Cleared when the agent dies; removed during cleanup.
    pub alive: bool,
    /// Heritable traits.
    pub dna: Dna,
    /// Per-episode fitness counters.
    pub metrics: FitnessAccumulators,
    /// Stun, slow and cooldown timers.
    pub status: StatusEffects,
    /// Host this parasite is attached to.
    pub attachment: Option<Attachment>,
}

impl Agent {
    /// Creates a fresh agent with species default energy.
    pub fn new(
        id: AgentId,
        species: Species,
        clan: u8,
        pos: Array1<f32>,
        heading: f32,
        dna: Dna,
        settings: &SpeciesParams,
    ) -> Self {
        Self {
            id,
            species,
            clan,
            pos,
            vel: Array1::zeros(2),
            heading,
            energy: settings.initial_energy.min(settings.max_energy),
            max_energy: settings.max_energy,
            age: 0,
            alive: true,
            dna,
            metrics: FitnessAccumulators::default(),
            status: StatusEffects::default(),
            attachment: None,
        }
    }

    /// Speed gene.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.dna.get(Gene::Speed)
    }

    /// Vision gene.
    #[inline]
    pub fn vision(&self) -> f32 {
        self.dna.get(Gene::Vision)
    }

    /// Size gene.
    #[inline]
    pub fn size(&self) -> f32 {
        self.dna.get(Gene::Size)
    }

    /// Speed after status effects, parasites and terrain.
    ///
    /// Stunned agents cannot move. Slow and parasite factors multiply.
    /// Sea hunters are faster in water and sluggish on land; everyone else
    /// swims at their `swim_factor`.
    pub fn effective_speed(&self, in_water: bool, params: &Params) -> f32 {
        if self.status.is_stunned() {
            return 0.0;
        }
        let mut speed = self.speed();
        if self.status.slowed > 0 {
            speed *= self.status.slow_factor;
        }
        if self.status.parasitized {
            speed *= params.parasite_slow_factor;
        }
        let swim = self.dna.get(Gene::SwimFactor);
        speed
            * match (self.species, in_water) {
                (Species::SeaHunter, true) => 1.0 + 0.3 * swim,
                (Species::SeaHunter, false) => 0.6,
                (_, true) => swim,
                (_, false) => 1.0,
            }
    }

    /// Checks if the agent is alive.
    pub fn is_alive(&self) -> bool {
        self.alive && self.energy > 0.0
    }

    /// Reduces energy, never below zero.
    pub fn consume_energy(&mut self, amount: f32) {
        self.energy = (self.energy - amount.max(0.0)).max(0.0);
    }

    /// Increases energy up to the species cap.
    ///
    /// # Returns
    ///
    /// The energy actually gained.
    pub fn gain_energy(&mut self, amount: f32) -> f32 {
        let before = self.energy;
        self.energy = (self.energy + amount.max(0.0)).min(self.max_energy);
        self.energy - before
    }

    /// Kills the agent by setting energy to 0.
    pub fn kill(&mut self) {
        self.energy = 0.0;
        self.alive = false;
    }

    /// Energy burned this tick.
    ///
    /// Larger and faster bodies cost more, `metabolism` scales the cost and
    /// `energy_efficiency` divides it.
    pub fn energy_cost(&self, base_cost: f32) -> f32 {
        let size_factor = 0.5 + 0.3 * (self.size() / 5.0);
        let speed_factor = 0.2 * (self.speed() / 3.0);
        let efficiency = self.dna.get(Gene::EnergyEfficiency).max(0.1);
        let metabolism = self.dna.get(Gene::Metabolism).max(0.0);
        base_cost * (size_factor + speed_factor) * metabolism / efficiency
    }

    /// Distance from this agent to a point.
    #[inline]
    pub fn distance_to(&self, point: &Array1<f32>) -> f32 {
        geometric_utils::distance(&self.pos, point)
    }

    /// Advances age, survival counter and status timers by one tick.
    pub fn age_one_tick(&mut self) {
        self.age += 1;
        self.metrics.survival_ticks += 1;
        self.status.tick();
    }
}

impl Locatable for Agent {
    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn radius(&self) -> f32 {
        self.size()
    }
}
