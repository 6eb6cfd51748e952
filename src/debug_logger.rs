// Debug logging module for asynchronous game state logging
//
// Fire-and-forget async logging so the game loop never waits on disk. Each
// turn's pre-decision state and chosen actions are written as one JSONL line.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::state::GameState;
use crate::types::PlannedAction;

/// One line of the debug log
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DebugLogEntry {
    pub turn: u32,
    pub state: GameState,
    pub actions: Vec<PlannedAction>,
    pub timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a turn asynchronously (fire-and-forget)
    pub fn log_turn(&self, turn: u32, state: &GameState, actions: &[PlannedAction]) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        let entry = DebugLogEntry {
            turn,
            state: state.clone(),
            actions: actions.to_vec(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Internal async function that performs the actual file write
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{Action, AgentId, CombatType, MapLayout, Point};
    use std::time::Duration;

    #[tokio::test]
    async fn test_logged_turn_round_trips() {
        let path = std::env::temp_dir().join(format!("pellet_debug_{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());

        let state = GameState::new(&MapLayout::open(3, 3), Config::default_hardcoded().rules);
        let actions = vec![PlannedAction {
            agent: AgentId::mine(1),
            action: Action::Speed {
                target: Point::new(1, 1),
                combat_type: CombatType::Rock,
            },
        }];
        logger.log_turn(4, &state, &actions);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let entry: DebugLogEntry = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(entry.turn, 4);
        assert_eq!(entry.state, state);
        assert_eq!(entry.actions, actions);
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.timestamp).is_ok());
    }

    #[test]
    fn test_disabled_logger_is_a_no_op() {
        let logger = DebugLogger::disabled();
        assert!(!logger.is_enabled());
        // No runtime needed: nothing is spawned
        let state = GameState::new(&MapLayout::open(2, 2), Config::default_hardcoded().rules);
        logger.log_turn(0, &state, &[]);
    }
}
