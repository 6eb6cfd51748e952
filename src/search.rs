//! Alpha-beta search over the N-agent turn queue
//!
//! Every ply belongs to the agent at the head of the queue: our agents
//! maximize, theirs minimize. The tree is built lazily and each node caches
//! its children and its utility.

use log::debug;

use crate::eval;
use crate::profile;
use crate::simple_profiler::{self, Category};
use crate::state::GameState;
use crate::types::{Action, Side};

/// Whether bounds are used to cut branches. Disabled gives plain minimax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pruning {
    Enabled,
    Disabled,
}

#[derive(Debug)]
pub struct SearchNode {
    state: GameState,
    /// Plies left below this node
    depth: u32,
    children: Option<Vec<(Action, SearchNode)>>,
    utility: Option<f64>,
}

impl SearchNode {
    pub fn new(state: GameState, depth: u32) -> Self {
        SearchNode {
            state,
            depth,
            children: None,
            utility: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Cached utility, if this node has been evaluated
    pub fn utility(&self) -> Option<f64> {
        self.utility
    }

    /// Children built so far; `None` until first expanded
    pub fn children(&self) -> Option<&[(Action, SearchNode)]> {
        self.children.as_deref()
    }

    /// Our agent is on move
    pub fn is_maximizing(&self) -> bool {
        self.state
            .current_agent()
            .map(|a| a.is_mine())
            .unwrap_or(false)
    }

    fn is_leaf(&self) -> bool {
        self.depth == 0 || self.state.current_agent().is_none()
    }

    fn expand(&mut self) -> &mut Vec<(Action, SearchNode)> {
        let state = &self.state;
        let child_depth = self.depth.saturating_sub(1);
        self.children.get_or_insert_with(|| {
            state
                .legal_actions()
                .into_iter()
                .map(|action| (action, SearchNode::new(state.child(&action), child_depth)))
                .collect()
        })
    }

    /// Utility of this node given the best values already guaranteed to the
    /// maximizer (`parent_max`) and the minimizer (`parent_min`) on the path
    /// from the root. Computed once and cached.
    pub fn alpha_beta(&mut self, parent_max: f64, parent_min: f64, pruning: Pruning) -> f64 {
        profile!(Category::AlphaBeta, {
            if let Some(utility) = self.utility {
                return utility;
            }

            let utility = if self.is_leaf() {
                eval::utility(&self.state)
            } else if self.is_maximizing() {
                self.max_value(parent_max, parent_min, pruning)
            } else {
                self.min_value(parent_max, parent_min, pruning)
            };

            self.utility = Some(utility);
            utility
        })
    }

    fn max_value(&mut self, parent_max: f64, parent_min: f64, pruning: Pruning) -> f64 {
        let mut utility = f64::NEG_INFINITY;
        let mut current_max = parent_max;

        for (_, child) in self.expand().iter_mut() {
            utility = utility.max(child.alpha_beta(current_max, parent_min, pruning));
            current_max = current_max.max(utility);
            if pruning == Pruning::Enabled && utility >= parent_min {
                simple_profiler::record_alpha_beta_cutoff();
                break;
            }
        }

        utility
    }

    fn min_value(&mut self, parent_max: f64, parent_min: f64, pruning: Pruning) -> f64 {
        let enemies = self.state.living_count(Side::Theirs);
        let kill_reward = self.state.rules().kill_reward;

        if self.expand().is_empty() && enemies > 1 {
            // A stranded opponent counts as a kill, not as a won game
            self.state.kill_current();
            return kill_reward;
        }

        let mut utility = f64::INFINITY;
        let mut current_min = parent_min;

        for (_, child) in self.expand().iter_mut() {
            utility = utility.min(child.alpha_beta(parent_max, current_min, pruning));
            current_min = current_min.min(utility);
            if pruning == Pruning::Enabled && utility <= parent_max {
                simple_profiler::record_alpha_beta_cutoff();
                break;
            }
        }

        utility
    }

    /// Evaluates the tree and returns the root action with the highest child
    /// utility. Ties keep the first action in generation order; a child worth
    /// +inf ends the scan.
    pub fn best_action(&mut self, pruning: Pruning) -> Result<(Action, f64), String> {
        if self.depth == 0 {
            return Err("Search depth must be at least 1".to_string());
        }

        self.alpha_beta(f64::NEG_INFINITY, f64::INFINITY, pruning);

        let mut best: Option<(Action, f64)> = None;
        for (action, child) in self.expand().iter_mut() {
            let utility = child.alpha_beta(f64::NEG_INFINITY, f64::INFINITY, pruning);
            debug!("  {} -> {:.4}", action, utility);

            if best.map(|(_, b)| utility > b).unwrap_or(true) {
                best = Some((*action, utility));
            }
            if utility == f64::INFINITY {
                break;
            }
        }

        best.ok_or_else(|| match self.state.current_agent() {
            Some(agent) => format!("No legal action for {} at {}", agent.id, agent.position),
            None => "No agent left to move".to_string(),
        })
    }
}

/// Best action for the agent on move, searching `depth` plies with pruning
pub fn best_action(state: &GameState, depth: u32) -> Result<(Action, f64), String> {
    SearchNode::new(state.clone(), depth).best_action(Pruning::Enabled)
}
