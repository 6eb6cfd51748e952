// Turn planner
//
// Each of our agents gets its own decision, searched on a blocking worker with
// iterative deepening while the async side polls the shared result until the
// time budget runs out. Decisions are chained on a private copy of the state so
// later agents see the moves already planned for earlier ones.

use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::search;
use crate::simple_profiler;
use crate::state::GameState;
use crate::types::{Action, PlannedAction, Side};

/// Deepest completed search result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub action: Action,
    pub utility: f64,
    pub depth: u32,
}

/// Shared state between the async poller and the search worker
#[derive(Debug)]
pub struct SharedSearchState {
    /// Result of the deepest completed iteration
    best: Mutex<Option<SearchResult>>,
    /// Error raised by the search, if any
    error: Mutex<Option<String>>,
    /// Set by the worker when it stops deepening
    pub search_complete: AtomicBool,
    /// Set by the poller when it no longer needs results
    pub stop_requested: AtomicBool,
    /// Depth currently being searched
    pub current_depth: AtomicU32,
}

impl SharedSearchState {
    pub fn new() -> Self {
        SharedSearchState {
            best: Mutex::new(None),
            error: Mutex::new(None),
            search_complete: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            current_depth: AtomicU32::new(0),
        }
    }

    pub fn publish(&self, result: SearchResult) {
        *self.best.lock() = Some(result);
    }

    pub fn best(&self) -> Option<SearchResult> {
        *self.best.lock()
    }

    fn fail(&self, error: String) {
        *self.error.lock() = Some(error);
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}

impl Default for SharedSearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Takes static configuration and plans every turn of the game
pub struct Bot {
    config: Config,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Bot { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chooses one action for each of our living agents, in queue order.
    ///
    /// `state` must have been refreshed with this turn's snapshot; it is not
    /// modified. The turn's time budget is split evenly between our agents.
    pub async fn plan_turn(
        &self,
        state: &GameState,
        turn: u32,
    ) -> Result<Vec<PlannedAction>, String> {
        let start_time = Instant::now();
        let mut plan = state.clone();
        let agents = plan.living_count(Side::Mine);
        let budget_ms = self.config.timing.budget_for_turn(turn, agents);

        info!("Turn {}: planning {} agents ({}ms each)", turn, agents, budget_ms);

        let mut actions = Vec::with_capacity(agents);
        for _ in 0..agents {
            let agent = match plan.current_agent() {
                Some(a) if a.is_mine() => a.id,
                _ => break,
            };
            let result = self.decide(&plan, budget_ms).await?;
            info!(
                "Turn {}: {} -> {} (utility: {:.3}, depth: {})",
                turn, agent, result.action, result.utility, result.depth
            );
            plan.apply(&result.action);
            actions.push(PlannedAction {
                agent,
                action: result.action,
            });
        }

        info!(
            "Turn {}: planned {} actions in {}ms",
            turn,
            actions.len(),
            start_time.elapsed().as_millis()
        );
        Ok(actions)
    }

    /// Same as `plan_turn` but with a fixed search depth and no time limit
    pub fn plan_turn_at_depth(
        &self,
        state: &GameState,
        depth: u32,
    ) -> Result<Vec<PlannedAction>, String> {
        let mut plan = state.clone();
        let agents = plan.living_count(Side::Mine);

        let mut actions = Vec::with_capacity(agents);
        for _ in 0..agents {
            let agent = match plan.current_agent() {
                Some(a) if a.is_mine() => a.id,
                _ => break,
            };
            let (action, _) = search::best_action(&plan, depth)?;
            plan.apply(&action);
            actions.push(PlannedAction { agent, action });
        }
        simple_profiler::merge_thread_local();

        Ok(actions)
    }

    /// Searches the decision of the agent on move within `budget_ms`.
    ///
    /// Anytime: returns the deepest completed result, or the first legal
    /// action if no iteration finished in time.
    async fn decide(&self, state: &GameState, budget_ms: u64) -> Result<SearchResult, String> {
        let start_time = Instant::now();

        let fallback = state.legal_actions().first().copied().ok_or_else(|| {
            match state.current_agent() {
                Some(a) => format!("No legal action for {} at {}", a.id, a.position),
                None => "No agent left to move".to_string(),
            }
        })?;

        let shared = Arc::new(SharedSearchState::new());
        let shared_clone = shared.clone();
        let state_clone = state.clone();
        let config = self.config.clone();

        // Detached: the worker notices the stop flag before its next iteration
        tokio::task::spawn_blocking(move || {
            Bot::compute_best_action_internal(
                &state_clone,
                shared_clone,
                start_time,
                budget_ms,
                &config,
            )
        });

        let polling_interval = Duration::from_millis(self.config.timing.polling_interval_ms);
        loop {
            tokio::time::sleep(polling_interval).await;

            let elapsed = start_time.elapsed().as_millis() as u64;
            if elapsed >= budget_ms || shared.search_complete.load(Ordering::Acquire) {
                break;
            }
        }
        shared.stop_requested.store(true, Ordering::Release);
        let reached = shared.current_depth.load(Ordering::Acquire);

        if let Some(result) = shared.best() {
            if reached > result.depth && !shared.search_complete.load(Ordering::Acquire) {
                info!(
                    "Depth {} still running after {}ms, using depth {}",
                    reached,
                    start_time.elapsed().as_millis(),
                    result.depth
                );
            }
            return Ok(result);
        }
        if let Some(error) = shared.take_error() {
            return Err(error);
        }

        warn!(
            "No search iteration finished within {}ms (depth {} started), falling back to {}",
            budget_ms, reached, fallback
        );
        Ok(SearchResult {
            action: fallback,
            utility: f64::NAN,
            depth: 0,
        })
    }

    /// Iterative deepening on the worker thread. Publishes the result of every
    /// completed depth and stops when the next one is not expected to fit.
    pub fn compute_best_action_internal(
        state: &GameState,
        shared: Arc<SharedSearchState>,
        start_time: Instant,
        budget_ms: u64,
        config: &Config,
    ) {
        let mut current_depth = config.timing.initial_depth.max(1);

        loop {
            if shared.stop_requested.load(Ordering::Acquire) {
                info!("Stopping search: poller no longer waiting");
                break;
            }

            let elapsed = start_time.elapsed().as_millis() as u64;
            let remaining = budget_ms.saturating_sub(elapsed);

            if remaining < config.timing.min_time_remaining_ms {
                info!("Stopping search: insufficient time remaining ({}ms)", remaining);
                break;
            }

            let estimated_time = config.time_estimation.estimate_ms(current_depth);
            if estimated_time > remaining {
                info!(
                    "Stopping search: next iteration would exceed budget (estimated {}ms, remaining {}ms)",
                    estimated_time, remaining
                );
                break;
            }

            if current_depth > config.timing.max_search_depth {
                info!("Stopping search: reached max depth ({})", config.timing.max_search_depth);
                break;
            }

            shared.current_depth.store(current_depth, Ordering::Release);

            match search::best_action(state, current_depth) {
                Ok((action, utility)) => {
                    info!(
                        "Depth {} complete: {} (utility: {:.3}, {}ms)",
                        current_depth,
                        action,
                        utility,
                        start_time.elapsed().as_millis()
                    );
                    shared.publish(SearchResult {
                        action,
                        utility,
                        depth: current_depth,
                    });
                    // A guaranteed win cannot be improved by searching deeper
                    if utility == f64::INFINITY {
                        break;
                    }
                }
                Err(e) => {
                    shared.fail(e);
                    break;
                }
            }

            current_depth += 1;
        }

        simple_profiler::merge_thread_local();
        shared.search_complete.store(true, Ordering::Release);
    }
}
