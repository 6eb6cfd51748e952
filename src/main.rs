use log::{error, info};
use std::env;
use std::process;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, BufReader};

use pellet_pursuit::bot::Bot;
use pellet_pursuit::config::Config;
use pellet_pursuit::debug_logger::DebugLogger;
use pellet_pursuit::protocol::{format_actions, ProtocolReader};
use pellet_pursuit::simple_profiler;
use pellet_pursuit::state::GameState;

/// Reads the map, then answers every turn until the referee closes stdin
async fn run(bot: &Bot, logger: &DebugLogger) -> Result<(), String> {
    let start_time = Instant::now();
    let mut reader = ProtocolReader::new(BufReader::new(tokio::io::stdin()));
    let mut stdout = tokio::io::stdout();

    let layout = reader.read_map().await?;
    info!("Map {}x{} received", layout.width, layout.height);
    let mut state = GameState::new(&layout, bot.config().rules);

    let mut turn: u32 = 0;
    while let Some(snapshot) = reader.read_turn().await? {
        state.begin_turn(&snapshot);

        let actions = bot.plan_turn(&state, turn).await?;
        let line = format!("{}\n", format_actions(&actions));
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("Failed to write commands: {}", e))?;
        stdout
            .flush()
            .await
            .map_err(|e| format!("Failed to flush stdout: {}", e))?;

        logger.log_turn(turn, &state, &actions);
        turn += 1;
    }

    info!("Input closed after {} turns", turn);
    simple_profiler::print_report(start_time.elapsed().as_millis() as u64);
    Ok(())
}

#[tokio::main]
async fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead. Logs go to stderr; stdout belongs to the referee.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Pellet Pursuit bot...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let bot = Bot::new(config);

    if let Err(e) = run(&bot, &logger).await {
        error!("{}", e);
        process::exit(1);
    }
}
