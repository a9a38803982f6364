//! Headless ecosystem runner.

use std::fs;
use std::time::Instant;

use ecosim::simulation::params::Params;
use ecosim::simulation::species::Species;
use ecosim::simulation::world::World;

const DEFAULT_EPISODES: u64 = 10;
const STATS_PATH: &str = "stats.json";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).is_some_and(|a| a == "--example") {
        match serde_json::to_string_pretty(&Params::default()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing default config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    if args.get(1).is_some_and(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [config.json] [episodes]", args[0]);
        eprintln!();
        eprintln!("Run the ecosystem headless and write per-generation stats to {STATS_PATH}.");
        eprintln!("Print the default configuration with --example.");
        return;
    }

    let params = match args.get(1) {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {e}");
                std::process::exit(1);
            });
            Params::from_json(&json).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {e}");
                std::process::exit(1);
            })
        }
        None => Params::default(),
    };
    let episodes: u64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_EPISODES);

    let mut world = World::new(params).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    });

    println!("Ecosystem Simulation");
    println!("====================");
    println!(
        "World: {}x{}, {} ticks per episode, seed {}",
        world.params().world_width,
        world.params().world_height,
        world.params().episode_length,
        world.params().seed
    );
    println!("Agents: {}", world.agents.len());
    println!();

    let start = Instant::now();
    for _ in 0..episodes {
        let Some(stats) = world.run_episode() else {
            break;
        };
        let populations = Species::ALL
            .iter()
            .map(|&s| format!("{}={}", s.name(), stats.population(s)))
            .collect::<Vec<_>>()
            .join(" ");
        println!("gen {:>4}  {populations}", stats.generation);
        if !stats.extinct.is_empty() {
            let names: Vec<&str> = stats.extinct.iter().map(|s| s.name()).collect();
            println!("          extinct: {}", names.join(", "));
        }
    }
    println!();
    println!(
        "Ran {} generation(s) in {:.2}s",
        world.stats().records().len(),
        start.elapsed().as_secs_f64()
    );

    match world.stats().export_json(STATS_PATH) {
        Ok(()) => println!("Stats written to {STATS_PATH}"),
        Err(e) => eprintln!("Error writing stats: {e}"),
    }
}
