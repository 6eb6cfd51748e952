// Standalone replay tool for pellet pursuit debug logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --turns <turn1,turn2>  Replay specific turns (comma-separated, default: all)
//   --depth <plies>        Fixed search depth (default: 4)
//   --verbose              Show detailed output for each turn
//   --config <path>        Path to Bot.toml (default: Bot.toml)

use std::env;
use std::process;

use pellet_pursuit::config::Config;
use pellet_pursuit::replay::ReplayEngine;
use pellet_pursuit::simple_profiler;

const DEFAULT_DEPTH: u32 = 4;

fn print_usage() {
    eprintln!("Pellet Pursuit Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --turns <T1,T2,...>     Replay specific turns (comma-separated)");
    eprintln!("  --depth <N>             Fixed search depth (default: {})", DEFAULT_DEPTH);
    eprintln!("  --verbose               Show detailed output for each turn");
    eprintln!("  --config <path>         Path to Bot.toml (default: Bot.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Replay all turns");
    eprintln!("  replay pellet_debug.jsonl");
    eprintln!();
    eprintln!("  # Replay specific turns deeper");
    eprintln!("  replay pellet_debug.jsonl --turns 5,10,15 --depth 6 --verbose");
}

fn parse_turns(s: &str) -> Result<Vec<u32>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<u32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

fn option_value<'a>(args: &'a [String], i: usize, name: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires an argument", name);
            process::exit(1);
        }
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let log_file = &args[1];
    let mut config_path = "Bot.toml".to_string();
    let mut verbose = false;
    let mut depth = DEFAULT_DEPTH;
    let mut turns: Option<Vec<u32>> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--turns" => {
                let value = option_value(&args, i, "--turns");
                turns = Some(parse_turns(value).unwrap_or_else(|e| {
                    eprintln!("Error parsing turns: {}", e);
                    process::exit(1);
                }));
                i += 1;
            }
            "--depth" => {
                let value = option_value(&args, i, "--depth");
                depth = match value.parse::<u32>() {
                    Ok(d) if d >= 1 => d,
                    _ => {
                        eprintln!("Error: --depth must be a positive integer, got '{}'", value);
                        process::exit(1);
                    }
                };
                i += 1;
            }
            "--config" => {
                config_path = option_value(&args, i, "--config").to_string();
                i += 1;
            }
            "--verbose" => {
                verbose = true;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let engine = ReplayEngine::new(config, depth, verbose);

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    let start = std::time::Instant::now();
    let (results, stats) = match turns {
        Some(turns) => {
            println!("Replaying {} specific turn(s) at depth {}...\n", turns.len(), depth);
            engine.replay_turns(&entries, &turns).unwrap_or_else(|e| {
                eprintln!("Error during replay: {}", e);
                process::exit(1);
            })
        }
        None => {
            println!("Replaying all {} turns at depth {}...\n", entries.len(), depth);
            engine.replay_all(&entries)
        }
    };

    engine.print_report(&results, &stats);
    simple_profiler::print_report(start.elapsed().as_millis() as u64);
}
