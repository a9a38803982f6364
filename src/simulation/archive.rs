//! Per-species hall of fame of the fittest DNA seen so far.
//!
//! The archive feeds extinction recovery. It keeps at most `capacity`
//! entries per species, sorted by descending fitness.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::dna::Dna;
use super::species::Species;

/// One archived genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Fitness the genome scored.
    pub fitness: f32,
    /// The genome.
    pub dna: Dna,
}

/// Bounded top-K list for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesArchive {
    capacity: usize,
    entries: Vec<ArchiveEntry>,
}

impl SpeciesArchive {
    /// Creates an empty archive holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts a genome if there is room or it beats the current minimum.
    ///
    /// # Returns
    ///
    /// `true` when the entry was stored.
    pub fn insert(&mut self, fitness: f32, dna: Dna) -> bool {
        if self.capacity == 0 || fitness.is_nan() {
            return false;
        }
        if self.entries.len() >= self.capacity {
            match self.entries.last() {
                Some(worst) if fitness > worst.fitness => {
                    self.entries.pop();
                }
                _ => return false,
            }
        }
        let at = self
            .entries
            .partition_point(|e| e.fitness.total_cmp(&fitness).is_ge());
        self.entries.insert(at, ArchiveEntry { fitness, dna });
        true
    }

    /// Entries, best first.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Highest archived fitness.
    pub fn best(&self) -> Option<&ArchiveEntry> {
        self.entries.first()
    }

    /// Uniformly random archived genome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Dna> {
        if self.entries.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.entries.len());
        Some(&self.entries[i].dna)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is archived.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Archives for every species that has contributed a genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    capacity: usize,
    per_species: BTreeMap<Species, SpeciesArchive>,
}

impl Archive {
    /// Creates an empty archive with per-species capacity `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            per_species: BTreeMap::new(),
        }
    }

    /// Per-species capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts one genome.
    pub fn insert(&mut self, species: Species, fitness: f32, dna: Dna) -> bool {
        let capacity = self.capacity;
        self.per_species
            .entry(species)
            .or_insert_with(|| SpeciesArchive::new(capacity))
            .insert(fitness, dna)
    }

    /// Records the best `capacity` members of a scored population.
    pub fn record_top_k<'a>(
        &mut self,
        species: Species,
        scored: impl IntoIterator<Item = (f32, &'a Dna)>,
    ) {
        let mut scored: Vec<_> = scored.into_iter().collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (fitness, dna) in scored.into_iter().take(self.capacity) {
            self.insert(species, fitness, dna.clone());
        }
    }

    /// Archive for one species.
    pub fn get(&self, species: Species) -> Option<&SpeciesArchive> {
        self.per_species.get(&species)
    }

    /// Uniformly random archived genome of one species.
    pub fn sample<R: Rng + ?Sized>(&self, species: Species, rng: &mut R) -> Option<&Dna> {
        self.per_species.get(&species)?.sample(rng)
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.per_species.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::dna::Gene;

    fn dna(v: f32) -> Dna {
        let mut dna = Dna::default();
        dna.set(Gene::Speed, v);
        dna
    }

    #[test]
    fn keeps_best_k_sorted() {
        let mut archive = SpeciesArchive::new(3);
        for f in [5.0, 1.0, 9.0, 3.0, 7.0] {
            archive.insert(f, dna(f));
        }
        let fitness: Vec<f32> = archive.entries().iter().map(|e| e.fitness).collect();
        assert_eq!(fitness, vec![9.0, 7.0, 5.0]);
    }

    #[test]
    fn worse_candidate_is_rejected_when_full() {
        let mut archive = SpeciesArchive::new(2);
        archive.insert(4.0, dna(4.0));
        archive.insert(6.0, dna(6.0));
        assert!(!archive.insert(4.0, dna(1.0)));
        assert!(!archive.insert(2.0, dna(2.0)));
        assert_eq!(archive.len(), 2);
        assert!(archive.insert(5.0, dna(5.0)));
        assert_eq!(archive.entries()[1].fitness, 5.0);
    }

    #[test]
    fn record_top_k_bounds_per_species() {
        let mut archive = Archive::new(2);
        let genomes: Vec<Dna> = (0..6).map(|i| dna(i as f32)).collect();
        archive.record_top_k(
            Species::Hunter,
            genomes.iter().enumerate().map(|(i, d)| (i as f32, d)),
        );
        let hunters = archive.get(Species::Hunter).expect("recorded");
        assert_eq!(hunters.len(), 2);
        assert_eq!(hunters.best().map(|e| e.fitness), Some(5.0));
        assert!(archive.get(Species::Grazer).is_none());
    }
}
