//! Generational turnover and extinction recovery.
//!
//! At the end of every episode each species is replaced by `initial_count`
//! children bred from the episode's population: tournament selection picks
//! two parents, blended crossover mixes them and Gaussian mutation perturbs
//! the result. The fittest genomes are archived first so a species that dies
//! out can be restarted from its best ancestors.

use log::warn;
use rand::Rng;
use rand::seq::index;

use super::archive::Archive;
use super::dna::{self, Dna};
use super::params::Params;
use super::species::Species;

/// A scored member of the outgoing population.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Fitness at episode end.
    pub fitness: f32,
    /// Genome.
    pub dna: Dna,
    /// Clan, inherited by children of this parent.
    pub clan: u8,
}

/// Genome and clan of an agent to be spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct Offspring {
    /// Child genome, inside the species ranges.
    pub dna: Dna,
    /// Child clan.
    pub clan: u8,
}

/// Children for one species plus how they were produced.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// Species being replaced.
    pub species: Species,
    /// New population.
    pub offspring: Vec<Offspring>,
    /// Whether the population was too small to breed and recovery was used.
    pub degenerate: bool,
}

/// Tournament selection.
///
/// Samples `min(size, pool.len())` distinct candidates and returns the
/// fittest; ties go to the earlier candidate in `pool`.
///
/// # Returns
///
/// `None` only for an empty pool.
pub fn tournament_select<'a, R: Rng + ?Sized>(
    pool: &'a [Candidate],
    size: usize,
    rng: &mut R,
) -> Option<&'a Candidate> {
    if pool.is_empty() {
        return None;
    }
    let k = size.clamp(1, pool.len());
    index::sample(rng, pool.len(), k)
        .into_iter()
        .min_by(|&a, &b| pool[b].fitness.total_cmp(&pool[a].fitness).then(a.cmp(&b)))
        .map(|i| &pool[i])
}

/// Owns the archive and produces new generations.
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    archive: Archive,
}

impl EvolutionEngine {
    /// Creates an engine with an empty archive of per-species capacity `k`.
    pub fn new(archive_size: usize) -> Self {
        Self {
            archive: Archive::new(archive_size),
        }
    }

    /// Wraps an existing archive, e.g. after loading a saved world.
    pub fn with_archive(archive: Archive) -> Self {
        Self { archive }
    }

    /// The archive.
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Breeds one child from a pool of at least one candidate.
    pub fn breed<R: Rng + ?Sized>(
        &self,
        species: Species,
        pool: &[Candidate],
        params: &Params,
        rng: &mut R,
    ) -> Option<Offspring> {
        let a = tournament_select(pool, params.tournament_size, rng)?;
        let b = tournament_select(pool, params.tournament_size, rng)?;
        let ranges = params.dna_ranges(species);
        let mixed = dna::crossover(&a.dna, &b.dna, ranges, rng);
        let child = dna::mutate(
            &mixed,
            ranges,
            params.mutation_sigma,
            params.mutation_rate,
            rng,
        );
        let clan = if a.fitness >= b.fitness { a.clan } else { b.clan };
        Some(Offspring { dna: child, clan })
    }

    /// Genomes for agents restarting an extinct species.
    ///
    /// Each genome is sampled uniformly from the archive, or drawn fresh
    /// from the species ranges when the archive is empty, then mutated with
    /// a boosted sigma.
    pub fn recover<R: Rng + ?Sized>(
        &self,
        species: Species,
        count: usize,
        params: &Params,
        rng: &mut R,
    ) -> Vec<Offspring> {
        let ranges = params.dna_ranges(species);
        let sigma = params.mutation_sigma * params.recovery_sigma_boost;
        (0..count)
            .map(|_| {
                let base = match self.archive.sample(species, rng) {
                    Some(dna) => dna.clone(),
                    None => Dna::random(ranges, rng),
                };
                let dna = dna::mutate(&base, ranges, sigma, params.mutation_rate, rng);
                let clan = rng.random_range(0..params.clan_count.max(1));
                Offspring { dna, clan }
            })
            .collect()
    }

    /// Replaces one species' population.
    ///
    /// The pool's best genomes go into the archive before breeding. Pools
    /// with fewer than two members fall back to the recovery path.
    pub fn next_generation<R: Rng + ?Sized>(
        &mut self,
        species: Species,
        pool: &[Candidate],
        params: &Params,
        rng: &mut R,
    ) -> GenerationPlan {
        self.archive
            .record_top_k(species, pool.iter().map(|c| (c.fitness, &c.dna)));

        let target = params.species(species).initial_count;
        if pool.len() < 2 {
            if target > 0 {
                warn!(
                    "degenerate selection for {species}: {} survivor(s), recovering {target} from archive",
                    pool.len()
                );
            }
            return GenerationPlan {
                species,
                offspring: self.recover(species, target, params, rng),
                degenerate: true,
            };
        }

        let offspring = (0..target)
            .filter_map(|_| self.breed(species, pool, params, rng))
            .collect();
        GenerationPlan {
            species,
            offspring,
            degenerate: false,
        }
    }
}
