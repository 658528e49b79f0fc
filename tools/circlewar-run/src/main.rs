//! circlewar-run: headless scenario runner.
//!
//! Usage:
//!   circlewar-run run --scenario twin --ticks 600
//!   circlewar-run run --config sim.json --scenario boss --ticks 1800 --snapshot
//!   circlewar-run scenarios

use std::path::PathBuf;
use std::process;

use circlewar_core::enums::EntityRole;
use circlewar_core::events::SimEvent;
use circlewar_sim::scenario::{build_scenario, ScenarioId};
use circlewar_sim::{SimConfig, SimulationEngine};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "scenarios" => {
            for id in ScenarioId::ALL {
                println!("{id}");
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "circlewar-run: headless CIRCLEWAR simulation runner\n\
         \n\
         Commands:\n\
         \n\
         run        Build a scenario and advance it a fixed number of ticks\n\
         \n\
           --scenario <name>  Scenario to build (see `scenarios`)\n\
           --config <path>    JSON sim config (optional, defaults otherwise)\n\
           --ticks <N>        Ticks to run (default: 600)\n\
           --seed <N>         Override the config seed\n\
           --save <dir>       Write a save slot named after the scenario\n\
           --snapshot         Print the final snapshot as JSON to stdout\n\
         \n\
         scenarios  List scenario names\n\
         \n\
         Set RUST_LOG=debug for per-entity logging.\n"
    );
}

fn parse_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

// --- Run command ---

fn cmd_run(args: &[String]) {
    let scenario: ScenarioId = match parse_value(args, "--scenario") {
        Some(name) => name.parse().unwrap_or_else(|e| fail(e)),
        None => fail("--scenario <name> is required"),
    };

    let mut config = match parse_value(args, "--config") {
        Some(path) => SimConfig::load(&PathBuf::from(path)).unwrap_or_else(|e| fail(e)),
        None => SimConfig::default(),
    };
    if let Some(seed) = parse_value(args, "--seed") {
        config.seed = seed
            .parse()
            .unwrap_or_else(|_| fail(format!("invalid --seed {seed:?}")));
    }
    let ticks: u64 = match parse_value(args, "--ticks") {
        Some(n) => n
            .parse()
            .unwrap_or_else(|_| fail(format!("invalid --ticks {n:?}"))),
        None => 600,
    };

    let mut engine = SimulationEngine::new(config);
    if let Err(e) = build_scenario(&mut engine, scenario) {
        fail(e);
    }
    log::info!("running {scenario} for {ticks} ticks (seed {})", engine.config().seed);

    let mut hits = 0usize;
    let mut destroyed = 0usize;
    let mut splits = 0usize;
    let mut last = engine.snapshot();
    for _ in 0..ticks {
        last = engine.tick();
        for event in &last.events {
            match event {
                SimEvent::BulletHit { .. } => hits += 1,
                SimEvent::EntityDestroyed { role, .. } => {
                    destroyed += 1;
                    if *role == EntityRole::Player {
                        log::warn!("player destroyed at tick {}", last.time.tick);
                    }
                }
                SimEvent::EntitySplit { .. } => splits += 1,
                _ => {}
            }
        }
        if engine.player().is_none() {
            break;
        }
    }

    if let Some(dir) = parse_value(args, "--save") {
        if let Err(e) = engine.save_to_file(&PathBuf::from(dir), scenario.name()) {
            fail(e);
        }
    }

    if has_flag(args, "--snapshot") {
        match serde_json::to_string_pretty(&last) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        }
    }

    eprintln!(
        "{scenario}: {} ticks, {:.1}s simulated",
        last.time.tick, last.time.elapsed_secs
    );
    eprintln!(
        "  player alive: {}, enemies: {}, bullets: {}",
        engine.player().is_some(),
        last.count_role(EntityRole::Enemy),
        last.count_role(EntityRole::PlayerBullet) + last.count_role(EntityRole::EnemyBullet),
    );
    eprintln!("  hits: {hits}, destroyed: {destroyed}, splits: {splits}");
}
