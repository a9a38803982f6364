//! World and episode controller.
//!
//! The world owns every entity and runs the two-phase tick:
//! - Commands are drained at the tick boundary
//! - A pending user disaster is applied
//! - The spatial index is rebuilt from the committed state
//! - Every live agent decides in parallel using rayon
//! - Effects are applied sequentially in ascending agent id
//! - Energy costs are charged, dead agents removed (maybe leaving carcasses)
//!   and survivors aged
//! - Food and rocks respawn, random disasters roll, extinct species recover
//!
//! When the episode runs out, or every agent is dead, the evolution engine
//! breeds the next generation.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId};
use super::behavior::{self, Context, WorldView};
use super::command::{Command, CommandQueue};
use super::disaster::{self, DisasterOutcome, DisasterState, DisasterSystem, EventType};
use super::dna::Dna;
use super::error::{ConfigError, PersistError};
use super::event_log::{EventKind, EventLog};
use super::events::{self, EffectQueue, EffectsReport, WorldMut};
use super::evolution::{Candidate, EvolutionEngine, Offspring};
use super::food::Food;
use super::geometric_utils::point;
use super::params::Params;
use super::rng::{SimRng, create_rng, derive_agent_rng};
use super::snapshot::{AgentSnapshot, SavedWorld, Snapshot};
use super::spatial::SpatialIndex;
use super::species::Species;
use super::stats::{GenerationStats, StatsHistory};
use super::terrain::{Obstacle, Rock, WaterZone};

const SNAPSHOT_EVENTS: usize = 10;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorldState {
    /// Ticking.
    #[default]
    Running,
    /// Ticks are no-ops until resumed.
    Paused,
    /// Breeding the next generation.
    EpisodeEnding,
    /// Rebuilding the world from parameters.
    Resetting,
}

/// What one call to [`World::step`] did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Episode tick after the step.
    pub tick: u64,
    /// Generation after the step.
    pub generation: u64,
    /// The world was paused and nothing happened.
    pub paused: bool,
    /// Kills, feeding, stuns and the rest of the apply phase.
    pub effects: EffectsReport,
    /// Agents removed this tick.
    pub deaths: usize,
    /// Carcasses dropped this tick.
    pub carcasses: usize,
    /// Disasters applied this tick.
    pub disasters: Vec<DisasterOutcome>,
    /// Species restarted from the archive.
    pub recovered: Vec<Species>,
    /// The episode ended and a new generation was bred.
    pub episode_ended: bool,
    /// The spatial index failed to build and agents decided blind.
    pub index_fallback: bool,
}

/// The simulated ecosystem.
pub struct World {
    /// Agents, sorted by id.
    pub agents: Vec<Agent>,
    /// Plants and carcasses.
    pub food: Vec<Food>,
    /// Rocks and shelters.
    pub rocks: Vec<Rock>,
    /// Obstacles, empty while disabled.
    pub obstacles: Vec<Obstacle>,
    water: Vec<WaterZone>,
    obstacles_enabled: bool,
    params: Params,
    state: WorldState,
    evolution: EvolutionEngine,
    disasters: DisasterSystem,
    commands: CommandQueue,
    event_log: EventLog,
    stats: StatsHistory,
    rng: SimRng,
    generation: u64,
    tick: u64,
    total_ticks: u64,
    next_id: u64,
    /// Species whose extinction has been reported and not yet recovered.
    extinct: BTreeSet<Species>,
}

impl World {
    /// Creates a populated world.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `params`.
    pub fn new(params: Params) -> Result<Self, ConfigError> {
        params.validate()?;
        let mut world = Self {
            agents: Vec::new(),
            food: Vec::new(),
            rocks: Vec::new(),
            obstacles: Vec::new(),
            water: Vec::new(),
            obstacles_enabled: params.obstacles_enabled,
            state: WorldState::Running,
            evolution: EvolutionEngine::new(params.archive_size),
            disasters: DisasterSystem::default(),
            commands: CommandQueue::default(),
            event_log: EventLog::new(params.event_log_size),
            stats: StatsHistory::default(),
            rng: create_rng(params.seed),
            generation: 0,
            tick: 0,
            total_ticks: 0,
            next_id: 0,
            extinct: BTreeSet::new(),
            params,
        };
        world.populate();
        info!(
            "world created: {} agents, {} food, {} rocks",
            world.agents.len(),
            world.food.len(),
            world.rocks.len()
        );
        Ok(world)
    }

    fn populate(&mut self) {
        let (w, h) = (self.params.world_width, self.params.world_height);
        self.water = WaterZone::layout(self.params.water_zone_count, self.params.water_zone_width, w);
        for species in Species::ALL {
            for _ in 0..self.params.species(species).initial_count {
                let dna = Dna::random(self.params.dna_ranges(species), &mut self.rng);
                let clan = self.random_clan();
                self.spawn(species, dna, clan);
            }
        }
        for _ in 0..self.params.food_count {
            let plant = Food::random_plant(w, h, self.params.food_energy, &mut self.rng);
            self.food.push(plant);
        }
        for _ in 0..self.params.rock_count {
            let rock = Rock::random(w, h, self.params.rock_radius, &mut self.rng);
            self.rocks.push(rock);
        }
        if self.obstacles_enabled {
            self.place_obstacles();
        }
    }

    fn place_obstacles(&mut self) {
        let (w, h) = (self.params.world_width, self.params.world_height);
        self.obstacles = (0..self.params.obstacle_count)
            .map(|_| Obstacle::random(w, h, self.params.obstacle_radius, &mut self.rng))
            .collect();
    }

    fn random_clan(&mut self) -> u8 {
        self.rng.random_range(0..self.params.clan_count.max(1))
    }

    /// Adds an agent with the next id at a species-appropriate random spot.
    fn spawn(&mut self, species: Species, dna: Dna, clan: u8) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        let (w, h) = (self.params.world_width, self.params.world_height);
        let x = match (species, self.water.as_slice()) {
            (Species::SeaHunter, zones) if !zones.is_empty() => {
                let zone = zones[self.rng.random_range(0..zones.len())];
                zone.x_min + self.rng.random::<f32>() * (zone.x_max - zone.x_min)
            }
            _ => self.rng.random::<f32>() * w,
        };
        let y = self.rng.random::<f32>() * h;
        let heading = self.rng.random::<f32>() * TAU;
        let agent = Agent::new(
            id,
            species,
            clan,
            point(x, y),
            heading,
            dna,
            self.params.species(species),
        );
        self.agents.push(agent);
        id
    }

    /// Queues a command for the next tick boundary.
    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Advances the simulation by one tick.
    ///
    /// Pending commands are handled first. While paused nothing else happens.
    pub fn step(&mut self) -> TickReport {
        self.process_commands();
        if self.state == WorldState::Paused {
            return TickReport {
                tick: self.tick,
                generation: self.generation,
                paused: true,
                ..TickReport::default()
            };
        }

        let mut report = TickReport::default();

        if let Some((event, x, y)) = self.disasters.take_pending() {
            let outcome = self.strike(event, x, y);
            report.disasters.push(outcome);
        }

        let index = match SpatialIndex::build(&self.agents, &self.food, &self.rocks) {
            Ok(index) => index,
            Err(e) => {
                warn!("{e}; agents decide without neighbors this tick");
                report.index_fallback = true;
                SpatialIndex::empty()
            }
        };

        let queue = self.decide_all(&index);
        drop(index);

        report.effects = events::apply_effects(
            WorldMut {
                agents: &mut self.agents,
                food: &mut self.food,
                rocks: &mut self.rocks,
                obstacles: &self.obstacles,
                water: &self.water,
            },
            &self.params,
            queue,
        );
        if report.effects.shelters_built > 0 {
            self.log(
                EventKind::Shelter,
                format!("{} shelter(s) built", report.effects.shelters_built),
            );
        }

        self.charge_energy();
        let (deaths, carcasses) = self.remove_dead();
        report.deaths = deaths;
        report.carcasses = carcasses;

        for agent in &mut self.agents {
            agent.age_one_tick();
        }

        self.respawn_resources();

        for event in EventType::ALL {
            if self.rng.random::<f32>() < self.params.events.get(event).probability {
                let x = self.rng.random::<f32>() * self.params.world_width;
                let y = self.rng.random::<f32>() * self.params.world_height;
                let outcome = self.strike(event, x, y);
                report.disasters.push(outcome);
            }
        }
        if !report.disasters.is_empty() {
            let (d, c) = self.remove_dead();
            report.deaths += d;
            report.carcasses += c;
        }

        report.recovered = self.recover_extinct_species();

        self.tick += 1;
        self.total_ticks += 1;
        if self.tick >= self.params.episode_length || self.agents.is_empty() {
            if self.agents.is_empty() {
                warn!("ecosystem collapsed at tick {}", self.tick);
            }
            self.end_episode();
            report.episode_ended = true;
        }

        report.tick = self.tick;
        report.generation = self.generation;
        report
    }

    /// Runs until the current episode ends.
    ///
    /// # Returns
    ///
    /// The stats of the finished generation, or `None` when the world is
    /// paused.
    pub fn run_episode(&mut self) -> Option<&GenerationStats> {
        loop {
            let report = self.step();
            if report.paused {
                return None;
            }
            if report.episode_ended {
                return self.stats.latest();
            }
        }
    }

    fn decide_all(&self, index: &SpatialIndex) -> EffectQueue {
        let view = WorldView {
            agents: &self.agents,
            food: &self.food,
            rocks: &self.rocks,
            water: &self.water,
            params: &self.params,
        };
        let seed = self.params.seed;
        let tick = self.total_ticks;
        let decisions: Vec<_> = (0..self.agents.len())
            .into_par_iter()
            .filter(|&i| self.agents[i].is_alive())
            .map(|i| {
                let agent = &self.agents[i];
                let ctx = Context::build(i, view, index);
                let mut rng = derive_agent_rng(seed, tick, agent.id.0);
                (agent.id, behavior::decide(agent, &ctx, &mut rng))
            })
            .collect();
        decisions.into_iter().collect()
    }

    fn charge_energy(&mut self) {
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            let base = self.params.species(agent.species).base_energy_cost;
            agent.consume_energy(agent.energy_cost(base));
            if agent.energy <= 0.0 {
                agent.kill();
            }
        }
    }

    /// Removes dead agents, dropping carcasses in id order.
    fn remove_dead(&mut self) -> (usize, usize) {
        let mut deaths = 0;
        let mut carcasses = 0;
        for agent in self.agents.iter().filter(|a| !a.is_alive()) {
            deaths += 1;
            if self.rng.random::<f32>() < self.params.carcass_drop_chance {
                self.food
                    .push(Food::carcass(agent.pos.clone(), self.params.carcass_energy));
                carcasses += 1;
            }
        }
        if deaths > 0 {
            self.agents.retain(Agent::is_alive);
        }
        (deaths, carcasses)
    }

    fn respawn_resources(&mut self) {
        self.food.retain(|f| !f.is_consumed());
        let plants = self.food.iter().filter(|f| !f.is_carcass()).count();
        if plants < self.params.food_count && self.rng.random::<f32>() < self.params.food_respawn_rate {
            let plant = Food::random_plant(
                self.params.world_width,
                self.params.world_height,
                self.params.food_energy,
                &mut self.rng,
            );
            self.food.push(plant);
        }

        let rocks = self.rocks.iter().filter(|r| !r.is_shelter).count();
        if rocks < self.params.rock_count && self.rng.random::<f32>() < self.params.rock_respawn_rate {
            let rock = Rock::random(
                self.params.world_width,
                self.params.world_height,
                self.params.rock_radius,
                &mut self.rng,
            );
            self.rocks.push(rock);
        }
    }

    fn strike(&mut self, event: EventType, x: f32, y: f32) -> DisasterOutcome {
        let outcome =
            disaster::apply_disaster(&mut self.agents, &self.rocks, event, &point(x, y), &self.params);
        self.log(
            EventKind::Disaster,
            format!(
                "{event} at ({x:.0}, {y:.0}) killed {} and spared {}",
                outcome.total_casualties(),
                outcome.spared.len()
            ),
        );
        outcome
    }

    /// Restarts every configured species with no live agents.
    ///
    /// # Returns
    ///
    /// The species that were restarted.
    pub fn recover_extinct_species(&mut self) -> Vec<Species> {
        let mut recovered = Vec::new();
        for species in Species::ALL {
            if self.params.species(species).initial_count == 0 {
                continue;
            }
            if self.population(species) > 0 {
                self.extinct.remove(&species);
                continue;
            }
            let count = self.params.recovery_spawn_count;
            if self.extinct.insert(species) {
                warn!("{species} went extinct at tick {}; spawning {count} from archive", self.tick);
                self.log(EventKind::Extinction, format!("{species} went extinct"));
            }
            if count == 0 {
                continue;
            }
            let offspring = self.evolution.recover(species, count, &self.params, &mut self.rng);
            self.spawn_all(species, offspring);
            self.log(
                EventKind::Recovery,
                format!("{species} recovered with {count} agents"),
            );
            self.extinct.remove(&species);
            recovered.push(species);
        }
        recovered
    }

    fn spawn_all(&mut self, species: Species, offspring: Vec<Offspring>) {
        for child in offspring {
            self.spawn(species, child.dna, child.clan);
        }
    }

    /// Ends the episode: records stats, breeds every species and restarts
    /// the episode clock.
    pub fn end_episode(&mut self) {
        let resume = match self.state {
            WorldState::Paused => WorldState::Paused,
            _ => WorldState::Running,
        };
        self.state = WorldState::EpisodeEnding;

        let shelters = self.rocks.iter().filter(|r| r.is_shelter).count();
        let stats = GenerationStats::collect(
            self.generation,
            &self.agents,
            self.food.len(),
            shelters,
            &self.params,
        );

        let mut pools: BTreeMap<Species, Vec<Candidate>> = BTreeMap::new();
        for agent in self.agents.iter().filter(|a| a.is_alive()) {
            let weights = &self.params.species(agent.species).fitness;
            pools.entry(agent.species).or_default().push(Candidate {
                fitness: behavior::fitness(agent, weights),
                dna: agent.dna.clone(),
                clan: agent.clan,
            });
        }

        let mut plans = Vec::with_capacity(Species::ALL.len());
        for species in Species::ALL {
            let pool = pools.remove(&species).unwrap_or_default();
            let plan = self
                .evolution
                .next_generation(species, &pool, &self.params, &mut self.rng);
            if plan.degenerate && !plan.offspring.is_empty() {
                self.log(
                    EventKind::Recovery,
                    format!("{species}: too few survivors, restarted from archive"),
                );
            }
            plans.push(plan);
        }

        self.agents.clear();
        self.extinct.clear();
        for plan in plans {
            self.spawn_all(plan.species, plan.offspring);
        }

        info!(
            "generation {} ended after {} ticks: {}",
            self.generation,
            self.tick,
            Species::ALL
                .iter()
                .map(|s| format!("{s}={}", stats.population(*s)))
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.log(
            EventKind::Generation,
            format!("generation {} complete", self.generation),
        );
        self.stats.push(stats);
        self.generation += 1;
        self.tick = 0;
        self.state = resume;
    }

    /// Rebuilds the world from fresh or overriding parameters.
    ///
    /// # Errors
    ///
    /// Invalid parameters are rejected and the current world is left as is.
    pub fn reset_all(&mut self, params: Option<Params>) -> Result<(), ConfigError> {
        let params = params.unwrap_or_else(|| self.params.clone());
        if let Err(e) = params.validate() {
            warn!("reset rejected: {e}");
            self.log(EventKind::Control, format!("reset rejected: {e}"));
            return Err(e);
        }
        self.state = WorldState::Resetting;
        self.agents.clear();
        self.food.clear();
        self.rocks.clear();
        self.obstacles.clear();
        self.obstacles_enabled = params.obstacles_enabled;
        self.evolution = EvolutionEngine::new(params.archive_size);
        self.disasters = DisasterSystem::default();
        self.event_log = EventLog::new(params.event_log_size);
        self.stats.clear();
        self.rng = create_rng(params.seed);
        self.generation = 0;
        self.tick = 0;
        self.total_ticks = 0;
        self.next_id = 0;
        self.extinct.clear();
        self.params = params;
        self.populate();
        self.log(EventKind::Control, "world reset".to_string());
        info!("world reset with {} agents", self.agents.len());
        self.state = WorldState::Running;
        Ok(())
    }

    fn process_commands(&mut self) {
        let commands: Vec<Command> = self.commands.drain().collect();
        for command in commands {
            debug!("command {command:?}");
            match command {
                Command::Pause => {
                    if self.state == WorldState::Running {
                        self.state = WorldState::Paused;
                        self.log(EventKind::Control, "paused".to_string());
                    }
                }
                Command::Resume => {
                    if self.state == WorldState::Paused {
                        self.state = WorldState::Running;
                        self.log(EventKind::Control, "resumed".to_string());
                    }
                }
                Command::ResetEpisode => self.end_episode(),
                Command::ResetAll(params) => {
                    // Rejection is already logged; the world carries on.
                    let _ = self.reset_all(params.map(|p| *p));
                }
                Command::ArmEvent(event) => self.disasters.arm(event),
                Command::TriggerEvent { x, y } => {
                    self.disasters.trigger(x, y);
                }
                Command::ToggleObstacles => self.toggle_obstacles(),
            }
        }
    }

    fn toggle_obstacles(&mut self) {
        self.obstacles_enabled = !self.obstacles_enabled;
        if self.obstacles_enabled {
            self.place_obstacles();
        } else {
            self.obstacles.clear();
        }
        self.log(
            EventKind::Control,
            format!(
                "obstacles {}",
                if self.obstacles_enabled { "on" } else { "off" }
            ),
        );
    }

    fn log(&mut self, kind: EventKind, description: String) {
        self.event_log
            .log(self.tick, self.generation, kind, description);
    }

    /// Live agents of one species.
    pub fn population(&self, species: Species) -> usize {
        self.agents
            .iter()
            .filter(|a| a.species == species && a.is_alive())
            .count()
    }

    /// Live agents per species.
    pub fn populations(&self) -> BTreeMap<Species, usize> {
        Species::ALL
            .iter()
            .map(|&s| (s, self.population(s)))
            .collect()
    }

    /// Looks an agent up by id.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .map(|i| &self.agents[i])
    }

    /// Parameters in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Controller state.
    pub fn state(&self) -> WorldState {
        self.state
    }

    /// Disaster state machine.
    pub fn disaster_state(&self) -> DisasterState {
        self.disasters.state()
    }

    /// Completed generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticks into the current episode.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Water bands.
    pub fn water(&self) -> &[WaterZone] {
        &self.water
    }

    /// Whether obstacles are enabled.
    pub fn obstacles_enabled(&self) -> bool {
        self.obstacles_enabled
    }

    /// Archive and breeding engine.
    pub fn evolution(&self) -> &EvolutionEngine {
        &self.evolution
    }

    /// Recent notable events.
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Generation records.
    pub fn stats(&self) -> &StatsHistory {
        &self.stats
    }

    /// Read-only copy of the world for front ends.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            tick: self.tick,
            total_ticks: self.total_ticks,
            state: self.state,
            agents: self.agents.iter().map(AgentSnapshot::from).collect(),
            food: self.food.clone(),
            rocks: self.rocks.clone(),
            obstacles: self.obstacles.clone(),
            water: self.water.clone(),
            disaster: self.disasters.state(),
            recent_events: self.event_log.recent(SNAPSHOT_EVENTS),
        }
    }

    /// Full state for persistence.
    pub fn save_state(&self) -> SavedWorld {
        SavedWorld {
            params: self.params.clone(),
            agents: self.agents.clone(),
            food: self.food.clone(),
            rocks: self.rocks.clone(),
            obstacles: self.obstacles.clone(),
            obstacles_enabled: self.obstacles_enabled,
            archive: self.evolution.archive().clone(),
            disasters: self.disasters.clone(),
            event_log: self.event_log.clone(),
            stats: self.stats.clone(),
            state: self.state,
            generation: self.generation,
            tick: self.tick,
            total_ticks: self.total_ticks,
            next_id: self.next_id,
            rng: self.rng.clone(),
        }
    }

    /// Rebuilds a world from saved state.
    ///
    /// # Errors
    ///
    /// The stored parameters must still validate.
    pub fn from_saved(saved: SavedWorld) -> Result<Self, ConfigError> {
        saved.params.validate()?;
        let mut agents = saved.agents;
        agents.sort_by_key(|a| a.id);
        let next_id = agents
            .last()
            .map_or(0, |a| a.id.0 + 1)
            .max(saved.next_id);
        let state = match saved.state {
            WorldState::Paused => WorldState::Paused,
            _ => WorldState::Running,
        };
        let extinct = Species::ALL
            .into_iter()
            .filter(|&s| {
                saved.params.species(s).initial_count > 0
                    && !agents.iter().any(|a| a.species == s && a.is_alive())
            })
            .collect();
        Ok(Self {
            agents,
            food: saved.food,
            rocks: saved.rocks,
            obstacles: saved.obstacles,
            water: WaterZone::layout(
                saved.params.water_zone_count,
                saved.params.water_zone_width,
                saved.params.world_width,
            ),
            obstacles_enabled: saved.obstacles_enabled,
            state,
            evolution: EvolutionEngine::with_archive(saved.archive),
            disasters: saved.disasters,
            commands: CommandQueue::default(),
            event_log: saved.event_log,
            stats: saved.stats,
            rng: saved.rng,
            generation: saved.generation,
            tick: saved.tick,
            total_ticks: saved.total_ticks,
            next_id,
            extinct,
            params: saved.params,
        })
    }

    /// Writes the full state as JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let json = serde_json::to_string(&self.save_state())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads a world written by [`World::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let json = fs::read_to_string(path)?;
        let saved: SavedWorld = serde_json::from_str(&json)?;
        Ok(Self::from_saved(saved)?)
    }
}
