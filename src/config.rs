// Configuration module for reading Bot.toml
// All tunable constants of the bot live here; the rules section travels with every game state

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub time_estimation: TimeEstimationConfig,
    pub rules: RulesConfig,
    pub debug: DebugConfig,
}

/// Time budget and iterative deepening limits
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub first_turn_budget_ms: u64,
    pub turn_budget_ms: u64,
    pub polling_interval_ms: u64,
    pub initial_depth: u32,
    pub max_search_depth: u32,
    pub min_time_remaining_ms: u64,
}

impl TimingConfig {
    /// Budget for a single decision when `agents` decisions share one turn
    pub fn budget_for_turn(&self, turn: u32, agents: usize) -> u64 {
        let total = if turn == 0 {
            self.first_turn_budget_ms
        } else {
            self.turn_budget_ms
        };
        total / agents.max(1) as u64
    }
}

/// Exponential model of how long one search iteration takes
#[derive(Debug, Deserialize, Clone)]
pub struct TimeEstimationConfig {
    pub base_iteration_time_ms: f64,
    pub branching_factor: f64,
}

impl TimeEstimationConfig {
    /// Estimated time for a full search at `depth` plies: base * factor^depth
    pub fn estimate_ms(&self, depth: u32) -> u64 {
        (self.base_iteration_time_ms * self.branching_factor.powi(depth as i32)).ceil() as u64
    }
}

/// Game constants used by the simulator and the evaluator
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct RulesConfig {
    /// Utility of a kill, split across the killer side's living agents
    pub kill_reward: f64,
    /// Cooldown set by any ability
    pub ability_cooldown: u32,
    /// Turns of speed granted by the speed ability
    pub speed_duration: u32,
    /// Reward assumed on open cells that were never observed
    pub unseen_pellet_value: u32,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Bot.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Bot.toml in the working directory
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Bot.toml")
    }

    /// Hardcoded fallback; must match Bot.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                first_turn_budget_ms: 900,
                turn_budget_ms: 45,
                polling_interval_ms: 2,
                initial_depth: 1,
                max_search_depth: 12,
                min_time_remaining_ms: 3,
            },
            time_estimation: TimeEstimationConfig {
                base_iteration_time_ms: 0.02,
                branching_factor: 4.0,
            },
            rules: RulesConfig {
                kill_reward: 100.0,
                ability_cooldown: 10,
                speed_duration: 5,
                unseen_pellet_value: 1,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "pellet_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load Bot.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_split_across_agents() {
        let config = Config::default_hardcoded();
        assert_eq!(config.timing.budget_for_turn(0, 3), 300);
        assert_eq!(config.timing.budget_for_turn(7, 3), 15);
        assert_eq!(config.timing.budget_for_turn(7, 0), 45);
    }

    #[test]
    fn test_estimate_grows_with_depth() {
        let config = Config::default_hardcoded();
        let shallow = config.time_estimation.estimate_ms(2);
        let deep = config.time_estimation.estimate_ms(8);
        assert!(deep > shallow);
        assert_eq!(config.time_estimation.estimate_ms(1), 1);
    }

    #[test]
    fn test_bot_toml_can_be_parsed() {
        let result = Config::from_file("Bot.toml");
        assert!(result.is_ok(), "Failed to parse Bot.toml: {:?}", result.err());
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Bot.toml").expect("Bot.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        assert_eq!(
            file_config.timing.first_turn_budget_ms,
            hardcoded.timing.first_turn_budget_ms
        );
        assert_eq!(file_config.timing.turn_budget_ms, hardcoded.timing.turn_budget_ms);
        assert_eq!(
            file_config.timing.polling_interval_ms,
            hardcoded.timing.polling_interval_ms
        );
        assert_eq!(file_config.timing.initial_depth, hardcoded.timing.initial_depth);
        assert_eq!(
            file_config.timing.max_search_depth,
            hardcoded.timing.max_search_depth
        );
        assert_eq!(
            file_config.timing.min_time_remaining_ms,
            hardcoded.timing.min_time_remaining_ms
        );
        assert_eq!(
            file_config.time_estimation.base_iteration_time_ms,
            hardcoded.time_estimation.base_iteration_time_ms
        );
        assert_eq!(
            file_config.time_estimation.branching_factor,
            hardcoded.time_estimation.branching_factor
        );
        assert_eq!(file_config.rules, hardcoded.rules);
        assert_eq!(file_config.debug.enabled, hardcoded.debug.enabled);
        assert_eq!(file_config.debug.log_file_path, hardcoded.debug.log_file_path);
    }

    #[test]
    fn test_invalid_path_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
