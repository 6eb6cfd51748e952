// Replay module for re-running logged decisions
//
// Loads the JSONL debug log, plans each logged state again at a fixed depth
// and compares the result with what was actually played.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::Bot;
use crate::config::Config;
use crate::debug_logger::DebugLogEntry;
use crate::protocol::format_actions;
use crate::types::PlannedAction;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u32,
    pub original: Vec<PlannedAction>,
    pub replayed: Vec<PlannedAction>,
    pub matches: bool,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub failures: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    bot: Bot,
    depth: u32,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a replay engine searching every turn at `depth` plies
    pub fn new(config: Config, depth: u32, verbose: bool) -> Self {
        ReplayEngine {
            bot: Bot::new(config),
            depth,
            verbose,
        }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<DebugLogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: DebugLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Plans a logged state again and compares the result
    pub fn replay_entry(&self, entry: &DebugLogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let start_time = Instant::now();
        let replayed = self.bot.plan_turn_at_depth(&entry.state, self.depth)?;
        let computation_time_ms = start_time.elapsed().as_millis();
        let matches = replayed == entry.actions;

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (depth: {}, time: {}ms)",
                    entry.turn,
                    format_actions(&replayed),
                    self.depth,
                    computation_time_ms
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (depth: {}, time: {}ms)",
                    entry.turn,
                    format_actions(&entry.actions),
                    format_actions(&replayed),
                    self.depth,
                    computation_time_ms
                );
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            original: entry.actions.clone(),
            replayed,
            matches,
            computation_time_ms,
        })
    }

    /// Replays every entry; turns that fail are logged and counted
    pub fn replay_all(&self, entries: &[DebugLogEntry]) -> (Vec<ReplayResult>, ReplayStats) {
        let mut results = Vec::new();
        let mut failures = 0;

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                    failures += 1;
                }
            }
        }

        let stats = Self::generate_stats(&results, failures);
        (results, stats)
    }

    /// Replays only the given turns
    pub fn replay_turns(
        &self,
        entries: &[DebugLogEntry],
        turn_numbers: &[u32],
    ) -> Result<(Vec<ReplayResult>, ReplayStats), String> {
        let mut selected = Vec::with_capacity(turn_numbers.len());
        for turn in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log file", turn))?;
            selected.push(entry.clone());
        }
        Ok(self.replay_all(&selected))
    }

    fn generate_stats(results: &[ReplayResult], failures: usize) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches: total_turns - matches,
            failures,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult], stats: &ReplayStats) {
        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Search Depth:   {}", self.depth);
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("Failures:       {}", stats.failures);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} ({}ms)",
                    result.turn,
                    format_actions(&result.original),
                    format_actions(&result.replayed),
                    result.computation_time_ms
                );
            }
            println!();
        }
    }
}
