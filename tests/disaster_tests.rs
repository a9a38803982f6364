#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ecosim::simulation::agent::{Agent, AgentId};
use ecosim::simulation::command::Command;
use ecosim::simulation::disaster::{
    DisasterState, DisasterSystem, EventType, apply_disaster, casualty_cap, mitigated_damage,
    raw_damage, survivor_energy,
};
use ecosim::simulation::dna::{Dna, Gene};
use ecosim::simulation::geometric_utils::point;
use ecosim::simulation::params::{EventParams, Params};
use ecosim::simulation::rng::create_rng;
use ecosim::simulation::species::Species;
use ecosim::simulation::terrain::Rock;
use ecosim::simulation::world::World;

fn create_test_params() -> Params {
    let mut params = Params {
        world_width: 1000.0,
        world_height: 1000.0,
        max_event_casualty_fraction: 0.5,
        disaster_falloff: 0.0,
        survivor_energy_floor: 1.0,
        food_count: 0,
        rock_count: 0,
        water_zone_count: 0,
        ..Params::default()
    };
    params.events.meteor = EventParams {
        radius: 100.0,
        severity: 1.0,
        base_damage: 25.0,
        probability: 0.0,
    };
    params.events.earthquake.probability = 0.0;
    params.events.tsunami.probability = 0.0;
    params
}

fn grazer(params: &Params, id: u64, x: f32, y: f32, energy: f32) -> Agent {
    let dna = Dna::random(params.dna_ranges(Species::Grazer), &mut create_rng(id));
    let mut agent = Agent::new(
        AgentId(id),
        Species::Grazer,
        0,
        point(x, y),
        0.0,
        dna,
        params.species(Species::Grazer),
    );
    agent.energy = energy;
    agent
}

#[test]
fn test_meteor_respects_casualty_cap() {
    let params = create_test_params();
    // Six grazers would die outright, four shrug the hit off.
    let mut agents: Vec<Agent> = (0..10)
        .map(|i| {
            let energy = if i < 6 { 10.0 } else { 100.0 };
            let mut agent = grazer(&params, i, 500.0 + i as f32, 500.0, energy);
            agent.metrics.survival_ticks = i * 10;
            agent
        })
        .collect();

    let outcome = apply_disaster(
        &mut agents,
        &[],
        EventType::Meteor,
        &point(500.0, 500.0),
        &params,
    );

    assert_eq!(outcome.total_casualties(), 5);
    assert_eq!(agents.iter().filter(|a| !a.is_alive()).count(), 5);
    // The fittest lethal candidate is the one spared.
    assert_eq!(outcome.spared, vec![AgentId(5)]);
    let spared = &agents[5];
    assert!(spared.is_alive());
    assert_eq!(spared.energy, survivor_energy(spared, &params));
    let upkeep = spared.energy_cost(params.species(Species::Grazer).base_energy_cost);
    assert!((spared.energy - upkeep - 1.0).abs() < 1e-4);
    assert_eq!(outcome.damaged, 4);
    for agent in &agents[6..] {
        assert_eq!(agent.energy, 75.0);
    }
}

#[test]
fn test_agents_outside_radius_are_untouched() {
    let params = create_test_params();
    let mut agents = vec![grazer(&params, 0, 900.0, 900.0, 10.0)];

    let outcome = apply_disaster(
        &mut agents,
        &[],
        EventType::Meteor,
        &point(100.0, 100.0),
        &params,
    );

    assert_eq!(outcome.total_casualties(), 0);
    assert_eq!(agents[0].energy, 10.0);
}

#[test]
fn test_shelter_mitigates_damage() {
    let params = create_test_params();
    let mut rock = Rock::new(point(500.0, 500.0), params.rock_radius);
    assert!(rock.convert_to_shelter(params.shelter_radius));

    let mut agents = vec![
        grazer(&params, 0, 505.0, 500.0, 100.0),
        grazer(&params, 1, 495.0, 560.0, 100.0),
    ];
    apply_disaster(
        &mut agents,
        &[rock],
        EventType::Meteor,
        &point(500.0, 500.0),
        &params,
    );

    let sheltered_loss = 100.0 - agents[0].energy;
    let exposed_loss = 100.0 - agents[1].energy;
    assert!(sheltered_loss < exposed_loss);
    assert!((sheltered_loss - 25.0 * (1.0 - params.shelter_mitigation)).abs() < 1e-4);
}

#[test]
fn test_damage_model() {
    assert_eq!(raw_damage(20.0, 1.0, 0.5, 0.0, 100.0), 20.0);
    assert_eq!(raw_damage(20.0, 1.0, 0.5, 100.0, 100.0), 10.0);
    assert_eq!(raw_damage(20.0, 1.0, 0.5, 100.1, 100.0), 0.0);
    for d in [0.0, 25.0, 50.0, 99.0] {
        let raw = raw_damage(20.0, 1.5, 0.5, d, 100.0);
        assert!(mitigated_damage(raw, true, 0.8) <= mitigated_damage(raw, false, 0.8));
    }
    assert_eq!(casualty_cap(0.5, 10), 5);
    assert_eq!(casualty_cap(0.3, 7), 3);
    assert_eq!(casualty_cap(1.0, 0), 0);
}

#[test]
fn test_state_machine_transitions() {
    let mut system = DisasterSystem::default();
    assert_eq!(system.state(), DisasterState::Idle);

    assert!(!system.trigger(10.0, 10.0));
    assert_eq!(system.state(), DisasterState::Idle);

    system.arm(EventType::Earthquake);
    system.arm(EventType::Tsunami);
    assert_eq!(system.state(), DisasterState::Armed(EventType::Tsunami));

    assert!(system.trigger(10.0, 20.0));
    system.arm(EventType::Meteor);
    assert_eq!(
        system.take_pending(),
        Some((EventType::Tsunami, 10.0, 20.0))
    );
    assert_eq!(system.state(), DisasterState::Idle);
    assert_eq!(system.take_pending(), None);
}

#[test]
fn test_triggered_event_applies_on_next_tick() {
    let mut params = create_test_params();
    params.events.meteor.radius = 2000.0;
    params.events.meteor.base_damage = 1000.0;
    let mut world = World::new(params).expect("valid params");
    let before = world.agents.len();

    world.push_command(Command::ArmEvent(EventType::Meteor));
    world.push_command(Command::TriggerEvent { x: 500.0, y: 500.0 });
    let report = world.step();

    assert_eq!(report.disasters.len(), 1);
    let outcome = &report.disasters[0];
    assert_eq!(outcome.event, EventType::Meteor);
    assert!(outcome.total_casualties() > 0);
    for (&species, &dead) in &outcome.casualties {
        let pop = world.params().species(species).initial_count;
        assert!(dead <= casualty_cap(0.5, pop));
    }
    assert!(report.deaths >= outcome.total_casualties());
    assert!(world.agents.len() < before || !report.recovered.is_empty());
    assert_eq!(world.disaster_state(), DisasterState::Idle);
}

#[test]
fn test_trigger_without_arm_is_ignored() {
    let mut world = World::new(create_test_params()).expect("valid params");

    world.push_command(Command::TriggerEvent { x: 500.0, y: 500.0 });
    let report = world.step();

    assert!(report.disasters.is_empty());
    assert_eq!(world.disaster_state(), DisasterState::Idle);
}

#[test]
fn test_spared_agents_survive_the_same_tick() {
    let mut params = create_test_params();
    params.recovery_spawn_count = 0;
    params.max_event_casualty_fraction = 0.3;
    params.events.meteor.radius = 200.0;
    params.events.meteor.base_damage = 10_000.0;
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params.species.hunter.initial_count = 10;
    params.species.hunter.base_energy_cost = 1.0;
    params.species.grazer.initial_count = 1;
    let mut world = World::new(params).expect("valid params");

    for (i, agent) in world.agents.iter_mut().enumerate() {
        if agent.species == Species::Hunter {
            // Expensive upkeep: more than one energy per tick.
            agent.dna.set(Gene::Metabolism, 1.6);
            agent.dna.set(Gene::EnergyEfficiency, 0.5);
            agent.pos = point(100.0 + i as f32 * 5.0, 100.0);
        } else {
            agent.pos = point(900.0, 900.0);
        }
    }
    for agent in world.agents.iter().filter(|a| a.species == Species::Hunter) {
        assert!(agent.energy_cost(1.0) > 1.0);
    }

    world.push_command(Command::ArmEvent(EventType::Meteor));
    world.push_command(Command::TriggerEvent { x: 120.0, y: 100.0 });
    let report = world.step();

    assert_eq!(report.disasters[0].total_casualties(), 3);
    assert_eq!(report.disasters[0].spared.len(), 7);
    assert!(!report.episode_ended);
    assert_eq!(world.population(Species::Hunter), 7);
    for agent in world.agents.iter().filter(|a| a.species == Species::Hunter) {
        assert!(agent.is_alive());
        assert!(agent.energy >= 1.0 - 1e-4);
    }
}
