#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ecosim::simulation::agent::{Agent, AgentId};
use ecosim::simulation::behavior::{self, Action, Context, Interaction, Movement, Strike, WorldView};
use ecosim::simulation::dna::{Dna, Gene};
use ecosim::simulation::events::{EffectQueue, WorldMut, apply_effects};
use ecosim::simulation::geometric_utils::point;
use ecosim::simulation::params::Params;
use ecosim::simulation::rng::create_rng;
use ecosim::simulation::spatial::SpatialIndex;
use ecosim::simulation::species::Species;
use ecosim::simulation::world::World;

fn create_test_params() -> Params {
    let mut params = Params {
        world_width: 1000.0,
        world_height: 1000.0,
        episode_length: 500,
        food_count: 0,
        rock_count: 0,
        water_zone_count: 0,
        ..Params::default()
    };
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params.events.earthquake.probability = 0.0;
    params.events.tsunami.probability = 0.0;
    params.events.meteor.probability = 0.0;
    params
}

fn make_agent(params: &Params, id: u64, species: Species, x: f32, y: f32) -> Agent {
    let dna = Dna::random(params.dna_ranges(species), &mut create_rng(id));
    Agent::new(
        AgentId(id),
        species,
        0,
        point(x, y),
        0.0,
        dna,
        params.species(species),
    )
}

fn decide_for(params: &Params, agents: &[Agent], idx: usize) -> Action {
    decide_seeded(params, agents, idx, 0)
}

fn decide_seeded(params: &Params, agents: &[Agent], idx: usize, seed: u64) -> Action {
    let index = SpatialIndex::build(agents, &[], &[]).expect("index");
    let view = WorldView {
        agents,
        food: &[],
        rocks: &[],
        water: &[],
        params,
    };
    let ctx = Context::build(idx, view, &index);
    behavior::decide(&agents[idx], &ctx, &mut create_rng(seed))
}

#[test]
fn test_parasite_slows_and_drains_host() {
    let mut params = create_test_params();
    params.species.grazer.initial_count = 1;
    params.species.parasite.initial_count = 1;
    let mut world = World::new(params).expect("valid params");

    let host_id = world.agents[0].id;
    let parasite_id = world.agents[1].id;
    assert_eq!(world.agents[0].species, Species::Grazer);
    assert_eq!(world.agents[1].species, Species::Parasite);
    world.agents[0].pos = point(500.0, 500.0);
    world.agents[1].pos = point(500.0, 500.0);
    world.agents[1].dna.set(Gene::AttachTime, 100.0);
    world.agents[1].dna.set(Gene::DrainRate, 1.0);

    world.step();
    let parasite = world.agent(parasite_id).expect("parasite alive");
    assert_eq!(parasite.attachment.map(|a| a.host), Some(host_id));
    assert_eq!(parasite.metrics.attachments, 1);

    let mut drained = parasite.metrics.drained_energy;
    for _ in 0..5 {
        world.step();
        let parasite = world.agent(parasite_id).expect("parasite alive");
        assert!(parasite.metrics.drained_energy > drained);
        drained = parasite.metrics.drained_energy;

        let host = world.agent(host_id).expect("host alive");
        assert!(host.status.parasitized);
        let mut free = host.clone();
        free.status.parasitized = false;
        let params = world.params();
        assert!(host.effective_speed(false, params) < free.effective_speed(false, params));
    }
}

#[test]
fn test_hunter_kills_adjacent_grazer() {
    let params = create_test_params();
    let mut hunter = make_agent(&params, 1, Species::Hunter, 100.0, 100.0);
    hunter.dna.set(Gene::AttackRange, 10.0);
    hunter.dna.set(Gene::Speed, 100.0);
    hunter.dna.set(Gene::Size, 100.0);
    let grazer = make_agent(&params, 2, Species::Grazer, 102.0, 100.0);
    let agents = vec![hunter, grazer];

    let action = decide_for(&params, &agents, 0);
    assert!(matches!(
        action.interaction,
        Some(Interaction::Attack { target: AgentId(2), .. })
    ));
}

#[test]
fn test_stunned_agents_hold() {
    let params = create_test_params();
    let mut hunter = make_agent(&params, 1, Species::Hunter, 100.0, 100.0);
    hunter.status.apply_stun(5, 0.5);
    let grazer = make_agent(&params, 2, Species::Grazer, 102.0, 100.0);
    let agents = vec![hunter, grazer];

    assert_eq!(decide_for(&params, &agents, 0), Action::HOLD);
}

#[test]
fn test_fitness_grows_with_every_accumulator() {
    let params = create_test_params();
    for species in Species::ALL {
        let weights = &params.species(species).fitness;
        let base = make_agent(&params, 1, species, 0.0, 0.0);
        let f0 = behavior::fitness(&base, weights);

        let bumps: [fn(&mut Agent); 6] = [
            |a| a.metrics.kills += 1,
            |a| a.metrics.stuns += 1,
            |a| a.metrics.attachments += 1,
            |a| a.metrics.drained_energy += 5.0,
            |a| a.metrics.survival_ticks += 10,
            |a| a.metrics.energy_gained += 5.0,
        ];
        for bump in bumps {
            let mut agent = base.clone();
            bump(&mut agent);
            assert!(behavior::fitness(&agent, weights) >= f0, "{species}");
        }
    }
}

fn bite(params: &Params, agents: &mut [Agent], damage: f32) -> usize {
    let action = Action::HOLD.with(Interaction::Attack {
        target: agents[1].id,
        strike: Strike::Bite { damage },
    });
    let queue: EffectQueue = [(agents[0].id, action)].into_iter().collect();
    let world = WorldMut {
        agents,
        food: &mut [],
        rocks: &mut [],
        obstacles: &[],
        water: &[],
    };
    apply_effects(world, params, queue).kills.len()
}

#[test]
fn test_sea_hunter_bites_adjacent_prey() {
    let params = create_test_params();
    let mut sea_hunter = make_agent(&params, 1, Species::SeaHunter, 100.0, 100.0);
    sea_hunter.dna.set(Gene::Size, 10.0);
    sea_hunter.dna.set(Gene::AttackPower, 40.0);
    let grazer = make_agent(&params, 2, Species::Grazer, 103.0, 100.0);
    let agents = vec![sea_hunter, grazer];

    let action = decide_for(&params, &agents, 0);
    assert_eq!(
        action.interaction,
        Some(Interaction::Attack {
            target: AgentId(2),
            strike: Strike::Bite { damage: 40.0 },
        })
    );
}

#[test]
fn test_bite_wounds_without_killing() {
    let params = create_test_params();
    let mut agents = vec![
        make_agent(&params, 1, Species::SeaHunter, 100.0, 100.0),
        make_agent(&params, 2, Species::Grazer, 103.0, 100.0),
    ];
    agents[0].energy = 10.0;
    agents[1].energy = 100.0;

    let kills = bite(&params, &mut agents, 30.0);

    assert_eq!(kills, 0);
    assert!(agents[1].is_alive());
    assert!((agents[1].energy - 70.0).abs() < 1e-4);
    assert!((agents[0].energy - (10.0 + params.bite_energy)).abs() < 1e-4);
    assert_eq!(agents[0].metrics.kills, 0);
}

#[test]
fn test_bite_kills_when_energy_runs_out() {
    let params = create_test_params();
    let mut agents = vec![
        make_agent(&params, 1, Species::SeaHunter, 100.0, 100.0),
        make_agent(&params, 2, Species::Grazer, 103.0, 100.0),
    ];
    agents[0].energy = 10.0;
    agents[1].energy = 10.0;

    let kills = bite(&params, &mut agents, 30.0);

    assert_eq!(kills, 1);
    assert!(!agents[1].is_alive());
    assert_eq!(agents[1].energy, 0.0);
    assert_eq!(agents[0].metrics.kills, 1);
}

#[test]
fn test_apex_reach_includes_attack_range() {
    let params = create_test_params();
    let mut apex = make_agent(&params, 1, Species::Apex, 100.0, 100.0);
    apex.dna.set(Gene::Size, 10.0);
    apex.dna.set(Gene::AttackRange, 5.0);
    apex.dna.set(Gene::Vision, 200.0);
    let mut hunter = make_agent(&params, 2, Species::Hunter, 120.0, 100.0);
    hunter.dna.set(Gene::Size, 8.0);

    // Reach is 10 + 8 + 5.
    let mut agents = vec![apex, hunter];
    let action = decide_for(&params, &agents, 0);
    assert_eq!(
        action.interaction,
        Some(Interaction::Attack {
            target: AgentId(2),
            strike: Strike::Kill,
        })
    );

    agents[1].pos = point(130.0, 100.0);
    let action = decide_for(&params, &agents, 0);
    assert_eq!(action.interaction, None);
    assert_eq!(
        action.movement,
        Movement::Toward {
            target: [130.0, 100.0],
            speed_mult: 1.3,
        }
    );
}

#[test]
fn test_scavenger_hunts_only_close_grazers() {
    let params = create_test_params();
    let mut scavenger = make_agent(&params, 1, Species::Scavenger, 100.0, 100.0);
    scavenger.dna.set(Gene::Size, 6.0);
    scavenger.dna.set(Gene::Vision, 200.0);
    let mut grazer = make_agent(&params, 2, Species::Grazer, 105.0, 100.0);
    grazer.dna.set(Gene::Size, 4.0);
    let mut agents = vec![scavenger, grazer];

    let attacks = (0..64)
        .filter(|&seed| {
            let action = decide_seeded(&params, &agents, 0, seed);
            matches!(
                action.interaction,
                Some(Interaction::Attack { target: AgentId(2), strike: Strike::Kill })
            )
        })
        .count();
    // The hunt is a gamble, so some seeds pass on it.
    assert!(attacks > 0);
    assert!(attacks < 64);

    // Beyond half the vision radius the grazer is ignored.
    agents[1].pos = point(250.0, 100.0);
    for seed in 0..64 {
        let action = decide_seeded(&params, &agents, 0, seed);
        assert_eq!(action.interaction, None);
        assert_ne!(
            action.movement,
            Movement::Toward {
                target: [250.0, 100.0],
                speed_mult: 1.05,
            }
        );
    }
}
