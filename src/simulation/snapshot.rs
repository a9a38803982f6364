//! Read-only snapshots for front ends and the full serializable world state.

use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId, FitnessAccumulators};
use super::archive::Archive;
use super::disaster::{DisasterState, DisasterSystem};
use super::dna::Dna;
use super::event_log::{EventLog, LoggedEvent};
use super::food::Food;
use super::params::Params;
use super::rng::SimRng;
use super::species::Species;
use super::stats::StatsHistory;
use super::terrain::{Obstacle, Rock, WaterZone};
use super::world::WorldState;

/// What a renderer needs to know about one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Identifier.
    pub id: AgentId,
    /// Species.
    pub species: Species,
    /// Clan.
    pub clan: u8,
    /// Position.
    pub pos: [f32; 2],
    /// Heading in radians.
    pub heading: f32,
    /// Energy.
    pub energy: f32,
    /// Energy cap.
    pub max_energy: f32,
    /// Ticks alive.
    pub age: u64,
    /// Genome.
    pub dna: Dna,
    /// Fitness accumulators.
    pub metrics: FitnessAccumulators,
    /// Whether currently stunned.
    pub stunned: bool,
    /// Host, for attached parasites.
    pub attached_to: Option<AgentId>,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            species: agent.species,
            clan: agent.clan,
            pos: [agent.pos[0], agent.pos[1]],
            heading: agent.heading,
            energy: agent.energy,
            max_energy: agent.max_energy,
            age: agent.age,
            dna: agent.dna.clone(),
            metrics: agent.metrics.clone(),
            stunned: agent.status.is_stunned(),
            attached_to: agent.attachment.map(|a| a.host),
        }
    }
}

/// Read-only copy of the world at a tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation counter.
    pub generation: u64,
    /// Ticks into the current episode.
    pub tick: u64,
    /// Ticks since the world was created.
    pub total_ticks: u64,
    /// Controller state.
    pub state: WorldState,
    /// Live agents in id order.
    pub agents: Vec<AgentSnapshot>,
    /// Food items.
    pub food: Vec<Food>,
    /// Rocks and shelters.
    pub rocks: Vec<Rock>,
    /// Active obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Water bands.
    pub water: Vec<WaterZone>,
    /// Disaster state.
    pub disaster: DisasterState,
    /// Most recent log entries, newest first.
    pub recent_events: Vec<LoggedEvent>,
}

/// Everything needed to rebuild an equivalent world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedWorld {
    /// Parameters.
    pub params: Params,
    /// Agents in id order, including status effects and attachments.
    pub agents: Vec<Agent>,
    /// Food items.
    pub food: Vec<Food>,
    /// Rocks and shelters.
    pub rocks: Vec<Rock>,
    /// Obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Whether obstacles are enabled.
    pub obstacles_enabled: bool,
    /// Archive of best genomes.
    pub archive: Archive,
    /// Disaster state machine.
    pub disasters: DisasterSystem,
    /// Event log.
    pub event_log: EventLog,
    /// Generation records.
    pub stats: StatsHistory,
    /// Controller state.
    pub state: WorldState,
    /// Generation counter.
    pub generation: u64,
    /// Ticks into the current episode.
    pub tick: u64,
    /// Ticks since creation.
    pub total_ticks: u64,
    /// Next agent id to hand out.
    pub next_id: u64,
    /// Sequential random stream, mid-sequence.
    pub rng: SimRng,
}
