#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ecosim::simulation::archive::Archive;
use ecosim::simulation::dna::{Dna, Gene, GeneRange};
use ecosim::simulation::evolution::{Candidate, EvolutionEngine};
use ecosim::simulation::params::Params;
use ecosim::simulation::rng::create_rng;
use ecosim::simulation::species::Species;

fn create_test_params() -> Params {
    let mut params = Params {
        tournament_size: 4,
        archive_size: 5,
        ..Params::default()
    };
    params.species.grazer.initial_count = 40;
    params
        .species
        .grazer
        .dna_ranges
        .insert(Gene::Speed, GeneRange::new(1.0, 4.0));
    params
}

fn grazer_pool(params: &Params, size: usize, seed: u64) -> Vec<Candidate> {
    let mut rng = create_rng(seed);
    (0..size)
        .map(|i| Candidate {
            fitness: i as f32,
            dna: Dna::random(params.dna_ranges(Species::Grazer), &mut rng),
            clan: (i % 3) as u8,
        })
        .collect()
}

#[test]
fn test_full_generation_stays_in_range() {
    let params = create_test_params();
    let pool = grazer_pool(&params, 40, 1);
    let mut engine = EvolutionEngine::new(params.archive_size);
    let mut rng = create_rng(2);

    let plan = engine.next_generation(Species::Grazer, &pool, &params, &mut rng);

    assert!(!plan.degenerate);
    assert_eq!(plan.offspring.len(), 40);
    for child in &plan.offspring {
        let speed = child.dna.get(Gene::Speed);
        assert!((1.0..=4.0).contains(&speed), "speed {speed} out of range");
        assert!(child.dna.is_within(params.dna_ranges(Species::Grazer)));
    }
}

#[test]
fn test_reproduction_is_deterministic() {
    let params = create_test_params();
    let pool = grazer_pool(&params, 40, 1);

    let run = || {
        let mut engine = EvolutionEngine::new(params.archive_size);
        let mut rng = create_rng(99);
        engine.next_generation(Species::Grazer, &pool, &params, &mut rng)
    };

    assert_eq!(run().offspring, run().offspring);
}

#[test]
fn test_archive_keeps_top_k() {
    let params = create_test_params();
    let pool = grazer_pool(&params, 40, 3);
    let mut engine = EvolutionEngine::new(params.archive_size);
    let mut rng = create_rng(4);

    engine.next_generation(Species::Grazer, &pool, &params, &mut rng);

    let archive = engine
        .archive()
        .get(Species::Grazer)
        .expect("grazers archived");
    assert_eq!(archive.len(), params.archive_size);
    let fitness: Vec<f32> = archive.entries().iter().map(|e| e.fitness).collect();
    assert_eq!(fitness, vec![39.0, 38.0, 37.0, 36.0, 35.0]);
}

#[test]
fn test_archive_evicts_minimum() {
    let mut archive = Archive::new(3);
    for fitness in [5.0, 1.0, 3.0] {
        archive.insert(Species::Hunter, fitness, Dna::default());
    }

    assert!(archive.insert(Species::Hunter, 4.0, Dna::default()));
    assert!(!archive.insert(Species::Hunter, 0.5, Dna::default()));

    let entries = archive.get(Species::Hunter).expect("hunters archived");
    let fitness: Vec<f32> = entries.entries().iter().map(|e| e.fitness).collect();
    assert_eq!(fitness, vec![5.0, 4.0, 3.0]);
}

#[test]
fn test_empty_pool_recovers_from_archive() {
    let params = create_test_params();
    let mut archive = Archive::new(params.archive_size);
    let mut seed = Dna::random(params.dna_ranges(Species::Grazer), &mut create_rng(5));
    seed.set(Gene::Speed, 2.5);
    archive.insert(Species::Grazer, 10.0, seed);

    let mut engine = EvolutionEngine::with_archive(archive);
    let mut rng = create_rng(6);
    let plan = engine.next_generation(Species::Grazer, &[], &params, &mut rng);

    assert!(plan.degenerate);
    assert_eq!(plan.offspring.len(), 40);
    for child in &plan.offspring {
        assert!(child.dna.is_within(params.dna_ranges(Species::Grazer)));
    }
}

#[test]
fn test_recovery_without_archive_uses_random_dna() {
    let params = create_test_params();
    let engine = EvolutionEngine::new(params.archive_size);
    let mut rng = create_rng(7);

    let offspring = engine.recover(Species::Apex, 6, &params, &mut rng);

    assert_eq!(offspring.len(), 6);
    for child in &offspring {
        assert!(child.dna.is_within(params.dna_ranges(Species::Apex)));
        assert!(child.clan < params.clan_count);
    }
}
