#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ecosim::simulation::command::Command;
use ecosim::simulation::disaster::EventType;
use ecosim::simulation::params::Params;
use ecosim::simulation::species::Species;
use ecosim::simulation::world::{World, WorldState};
use std::fs;

fn create_test_params() -> Params {
    let mut params = Params {
        seed: 11,
        world_width: 800.0,
        world_height: 600.0,
        episode_length: 25,
        food_count: 40,
        rock_count: 8,
        water_zone_count: 1,
        ..Params::default()
    };
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 3;
    }
    params.species.grazer.initial_count = 10;
    params
}

#[test]
fn test_save_and_load() {
    let mut world = World::new(create_test_params()).expect("valid params");

    // Run past one turnover so the archive and stats are populated
    for _ in 0..30 {
        world.step();
    }

    let save_path = std::env::temp_dir().join("ecosim_test_save.json");
    world.save_to_file(&save_path).expect("Failed to save world");
    let loaded = World::load_from_file(&save_path).expect("Failed to load world");
    fs::remove_file(&save_path).ok();

    assert_eq!(loaded.generation(), world.generation());
    assert_eq!(loaded.tick(), world.tick());
    assert_eq!(loaded.params(), world.params());
    assert_eq!(loaded.food.len(), world.food.len());
    assert_eq!(loaded.rocks.len(), world.rocks.len());
    assert_eq!(loaded.evolution().archive(), world.evolution().archive());
    assert_eq!(loaded.stats(), world.stats());
    assert_eq!(loaded.snapshot().agents, world.snapshot().agents);
}

#[test]
fn test_loaded_world_continues_identically() {
    let mut world = World::new(create_test_params()).expect("valid params");
    for _ in 0..10 {
        world.step();
    }

    let json = serde_json::to_string(&world.save_state()).expect("serialize");
    let saved = serde_json::from_str(&json).expect("deserialize");
    let mut loaded = World::from_saved(saved).expect("valid saved state");

    for _ in 0..10 {
        world.step();
        loaded.step();
    }

    assert_eq!(loaded.snapshot().agents, world.snapshot().agents);
    assert_eq!(loaded.food.len(), world.food.len());
}

#[test]
fn test_saved_state_keeps_pause_and_armed_event() {
    let mut world = World::new(create_test_params()).expect("valid params");
    world.push_command(Command::ArmEvent(EventType::Earthquake));
    world.push_command(Command::Pause);
    world.step();

    let loaded = World::from_saved(world.save_state()).expect("valid saved state");

    assert_eq!(loaded.state(), WorldState::Paused);
    assert_eq!(loaded.disaster_state(), world.disaster_state());
}

#[test]
fn test_load_missing_file_fails() {
    let path = std::env::temp_dir().join("ecosim_missing_save.json");
    assert!(World::load_from_file(path).is_err());
}
