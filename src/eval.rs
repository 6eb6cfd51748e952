//! Position evaluation
//!
//! Utility is always from our side's point of view: banked score difference,
//! a flood-fill estimate of the pellets each side can reach first, the fights
//! of the last ply and a small bonus per agent under speed.

use std::collections::VecDeque;

use crate::agent::Agent;
use crate::grid::Grid;
use crate::profile;
use crate::simple_profiler::Category;
use crate::state::GameState;
use crate::types::{AgentId, Point};

/// Utility of a state for our side
pub fn utility(state: &GameState) -> f64 {
    profile!(Category::Eval, {
        let banked = (state.my_score() - state.opponent_score()) as f64;
        banked + flood_fill(state).value + state.combat_score() + speed_bonus(state)
    })
}

/// Our agents under speed minus theirs
pub fn speed_bonus(state: &GameState) -> f64 {
    state
        .agents_in_turn_order()
        .filter(|a| a.speed_remaining > 0)
        .map(|a| a.side().sign())
        .sum()
}

/// Result of one simultaneous flood fill
#[derive(Debug, Clone)]
pub struct Territory {
    /// Signed sum of reward / arrival time over all claimed cells
    pub value: f64,
    /// Claiming agent per cell index
    pub owners: Vec<Option<AgentId>>,
    /// Number of claim events
    pub claims: usize,
}

impl Territory {
    pub fn owner(&self, grid: &Grid, p: Point) -> Option<AgentId> {
        self.owners[grid.index(p)]
    }

    pub fn cells_owned_by(&self, id: AgentId) -> usize {
        self.owners.iter().filter(|o| **o == Some(id)).count()
    }
}

/// Working set of a flood fill: one wavefront per agent over shared claim maps
struct Wavefronts<'a> {
    grid: &'a Grid,
    frontiers: Vec<VecDeque<Point>>,
    /// Cell currently waiting in some wavefront
    queued: Vec<bool>,
    owners: Vec<Option<AgentId>>,
    time: u32,
    value: f64,
    claims: usize,
}

impl<'a> Wavefronts<'a> {
    fn new(grid: &'a Grid, agents: &[&Agent]) -> Self {
        let mut queued = vec![false; grid.len()];
        let frontiers = agents
            .iter()
            .map(|a| {
                queued[grid.index(a.position)] = true;
                VecDeque::from([a.position])
            })
            .collect();

        Wavefronts {
            grid,
            frontiers,
            queued,
            owners: vec![None; grid.len()],
            time: 1,
            value: 0.0,
            claims: 0,
        }
    }

    fn has_pending(&self, i: usize) -> bool {
        !self.frontiers[i].is_empty()
    }

    fn any_pending(&self) -> bool {
        self.frontiers.iter().any(|f| !f.is_empty())
    }

    /// Pops one cell from agent `i`'s wavefront. A cell someone already
    /// claimed is skipped; the wavefront keeps draining on the next pass.
    fn expand(&mut self, i: usize, agent: &Agent) {
        let p = match self.frontiers[i].pop_front() {
            Some(p) => p,
            None => return,
        };
        let idx = self.grid.index(p);
        self.queued[idx] = false;

        if self.owners[idx].is_some() {
            return;
        }
        self.owners[idx] = Some(agent.id);

        for n in self.grid.open_neighbors(p) {
            let n_idx = self.grid.index(n);
            if self.owners[n_idx].is_none() && !self.queued[n_idx] {
                self.queued[n_idx] = true;
                self.frontiers[i].push_back(n);
            }
        }

        self.value += self.grid.reward(p) as f64 * agent.side().sign() / self.time as f64;
        self.time += 1;
        self.claims += 1;
    }
}

/// Simultaneous breadth-first claim of the board from every living agent.
///
/// Agents expand round-robin in turn order; an agent under speed gets a
/// second pass each round while its local copy of the speed counter lasts.
/// Every newly claimed cell is worth reward / arrival time, where the arrival
/// clock ticks once per claim across all agents.
pub fn flood_fill(state: &GameState) -> Territory {
    profile!(Category::FloodFill, {
        let agents: Vec<&Agent> = state.agents_in_turn_order().collect();
        let mut speed: Vec<u32> = agents.iter().map(|a| a.speed_remaining).collect();
        let mut fill = Wavefronts::new(state.grid(), &agents);

        while fill.any_pending() {
            for (i, agent) in agents.iter().enumerate() {
                if fill.has_pending(i) {
                    fill.expand(i, agent);
                }
                if speed[i] > 0 && fill.has_pending(i) {
                    fill.expand(i, agent);
                    speed[i] -= 1;
                }
            }
        }

        Territory {
            value: fill.value,
            owners: fill.owners,
            claims: fill.claims,
        }
    })
}
