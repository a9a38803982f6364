//! Per-generation statistics and the JSON export hook.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::behavior;
use super::dna::Gene;
use super::error::PersistError;
use super::params::Params;
use super::species::Species;

/// Summary of one species at the end of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    /// Live agents.
    pub population: usize,
    /// Mean value of every carried gene.
    pub mean_traits: BTreeMap<Gene, f32>,
    /// Highest fitness in the population.
    pub best_fitness: f32,
    /// Mean fitness.
    pub mean_fitness: f32,
    /// Mean energy.
    pub mean_energy: f32,
}

/// Record written at every episode end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation that just ended.
    pub generation: u64,
    /// Wall-clock time of the turnover.
    pub timestamp: DateTime<Utc>,
    /// Per-species summaries of the outgoing population.
    pub species: BTreeMap<Species, SpeciesStats>,
    /// Configured species with no live agents.
    pub extinct: Vec<Species>,
    /// Uneaten food items.
    pub food_available: usize,
    /// Rocks converted into shelters.
    pub shelters: usize,
}

impl GenerationStats {
    /// Summarizes the live agents of a world.
    pub fn collect(
        generation: u64,
        agents: &[Agent],
        food_available: usize,
        shelters: usize,
        params: &Params,
    ) -> Self {
        let mut species = BTreeMap::new();
        let mut extinct = Vec::new();
        for s in Species::ALL {
            let members: Vec<&Agent> = agents
                .iter()
                .filter(|a| a.species == s && a.is_alive())
                .collect();
            if members.is_empty() {
                if params.species(s).initial_count > 0 {
                    extinct.push(s);
                }
                continue;
            }
            species.insert(s, summarize(&members, params));
        }
        Self {
            generation,
            timestamp: Utc::now(),
            species,
            extinct,
            food_available,
            shelters,
        }
    }

    /// Live agents of one species, zero when absent.
    pub fn population(&self, species: Species) -> usize {
        self.species.get(&species).map_or(0, |s| s.population)
    }
}

fn summarize(members: &[&Agent], params: &Params) -> SpeciesStats {
    let n = members.len() as f32;
    let weights = &params.species(members[0].species).fitness;

    let mut sums: BTreeMap<Gene, f32> = BTreeMap::new();
    for agent in members {
        for (gene, value) in agent.dna.genes() {
            *sums.entry(gene).or_default() += value;
        }
    }
    let mean_traits = sums.into_iter().map(|(g, total)| (g, total / n)).collect();

    let scores: Vec<f32> = members
        .iter()
        .map(|a| behavior::fitness(a, weights))
        .collect();
    SpeciesStats {
        population: members.len(),
        mean_traits,
        best_fitness: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        mean_fitness: scores.iter().sum::<f32>() / n,
        mean_energy: members.iter().map(|a| a.energy).sum::<f32>() / n,
    }
}

/// All generation records of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsHistory {
    records: Vec<GenerationStats>,
}

impl StatsHistory {
    /// Appends a record.
    pub fn push(&mut self, stats: GenerationStats) {
        self.records.push(stats);
    }

    /// Every record, oldest first.
    pub fn records(&self) -> &[GenerationStats] {
        &self.records
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&GenerationStats> {
        self.records.last()
    }

    /// Drops all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Pretty-printed JSON of every record.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }

    /// Writes every record as JSON.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
