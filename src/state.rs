//! Game state: grid, agents, round-robin turn queue and scores
//!
//! The roster owns every agent ever seen this turn (living and dead, in
//! discovery order). Side lists and the turn queue hold roster indices, so an
//! agent is mutated in exactly one place no matter which collection found it.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::agent::Agent;
use crate::config::RulesConfig;
use crate::grid::Grid;
use crate::profile;
use crate::simple_profiler::Category;
use crate::types::{Action, AgentId, Direction, FoodChain, MapLayout, Point, Side, TurnSnapshot};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GameState {
    grid: Grid,
    rules: RulesConfig,
    /// All agents, never reordered
    roster: Vec<Agent>,
    /// Living agents per side, as roster indices
    mine: Vec<usize>,
    theirs: Vec<usize>,
    /// Permutation of all living agents; the head moves next
    turn_order: VecDeque<usize>,
    my_score: i32,
    opponent_score: i32,
    /// Utility from fights during the last ply only
    combat_score: f64,
}

impl GameState {
    /// Creates an empty state for the given map; agents arrive with `begin_turn`
    pub fn new(layout: &MapLayout, rules: RulesConfig) -> Self {
        GameState {
            grid: Grid::new(layout, rules.unseen_pellet_value),
            rules,
            roster: Vec::new(),
            mine: Vec::new(),
            theirs: Vec::new(),
            turn_order: VecDeque::new(),
            my_score: 0,
            opponent_score: 0,
            combat_score: 0.0,
        }
    }

    /// Replaces agents, queue and scores with a fresh snapshot and refines the
    /// reward grid with what our agents can currently see.
    pub fn begin_turn(&mut self, snapshot: &TurnSnapshot) {
        self.combat_score = 0.0;
        self.my_score = snapshot.my_score;
        self.opponent_score = snapshot.opponent_score;

        self.roster.clear();
        self.mine.clear();
        self.theirs.clear();
        self.turn_order.clear();

        let mut visible: HashSet<Point> = HashSet::new();

        for seen in &snapshot.agents {
            let agent = Agent::from_visible(seen);
            self.grid.set_reward(agent.position, 0);

            let idx = self.roster.len();
            if agent.alive {
                if agent.is_mine() {
                    self.mine.push(idx);
                    for d in Direction::all() {
                        visible.extend(self.grid.line_of_sight(agent.position, d));
                    }
                } else {
                    self.theirs.push(idx);
                }
            }
            self.roster.push(agent);
        }

        for pellet in &snapshot.pellets {
            self.grid.set_reward(pellet.position, pellet.value);
            visible.remove(&pellet.position);
        }

        // Seen without a pellet means eaten
        for p in visible {
            self.grid.set_reward(p, 0);
        }

        self.turn_order.extend(self.mine.iter().copied());
        self.turn_order.extend(self.theirs.iter().copied());
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn my_score(&self) -> i32 {
        self.my_score
    }

    pub fn opponent_score(&self) -> i32 {
        self.opponent_score
    }

    pub fn combat_score(&self) -> f64 {
        self.combat_score
    }

    /// Every agent known this turn, dead ones included
    pub fn roster(&self) -> &[Agent] {
        &self.roster
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.roster.iter().find(|a| a.id == id)
    }

    /// Agent whose ply it is
    pub fn current_agent(&self) -> Option<&Agent> {
        self.turn_order.front().map(|&idx| &self.roster[idx])
    }

    /// Living agents in turn order, head first
    pub fn agents_in_turn_order(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.turn_order.iter().map(move |&idx| &self.roster[idx])
    }

    pub fn turn_order(&self) -> Vec<AgentId> {
        self.agents_in_turn_order().map(|a| a.id).collect()
    }

    /// Living agents of one side in discovery order
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Agent> + '_ {
        self.side_list(side).iter().map(move |&idx| &self.roster[idx])
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.side_list(side).len()
    }

    fn side_list(&self, side: Side) -> &Vec<usize> {
        match side {
            Side::Mine => &self.mine,
            Side::Theirs => &self.theirs,
        }
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Legal actions for the agent at the head of the turn queue.
    ///
    /// Moves go to each open neighbor; with speed active every neighbor is
    /// followed by its own open neighbors (except the origin) and duplicate
    /// destinations reached through different neighbors are kept. Each
    /// neighbor itself is listed once, not once per onward direction; the
    /// first of equal children wins, so repeats would not change the choice.
    /// Abilities are offered when the cooldown is over.
    pub fn legal_actions(&self) -> Vec<Action> {
        profile!(Category::MoveGen, {
            let agent = match self.current_agent() {
                Some(a) => a,
                None => return Vec::new(),
            };
            let origin = agent.position;
            let primaries: Vec<Point> = self.grid.open_neighbors(origin).collect();

            let targets: Vec<Point> = if agent.speed_remaining > 0 {
                let mut expanded = Vec::with_capacity(primaries.len() * 4);
                for &p in &primaries {
                    expanded.push(p);
                    expanded.extend(self.grid.open_neighbors(p).filter(|&q| q != origin));
                }
                expanded
            } else {
                primaries
            };

            let mut actions: Vec<Action> = targets
                .into_iter()
                .map(|target| Action::Move {
                    target,
                    combat_type: agent.combat_type,
                })
                .collect();

            if agent.cooldown == 0 {
                actions.push(Action::Speed {
                    target: origin,
                    combat_type: agent.combat_type,
                });
                actions.push(Action::Switch {
                    target: origin,
                    combat_type: agent.combat_type.switched(FoodChain::Predator),
                });
                actions.push(Action::Switch {
                    target: origin,
                    combat_type: agent.combat_type.switched(FoodChain::Prey),
                });
            }

            actions
        })
    }

    // ========================================================================
    // TRANSITION
    // ========================================================================

    /// Plays one ply: the head agent performs `action`, eats whatever is on
    /// its cell, goes to the back of the queue and fights any co-located
    /// opponent.
    ///
    /// # Panics
    /// If the turn queue is empty.
    pub fn apply(&mut self, action: &Action) {
        profile!(Category::ApplyAction, {
            self.combat_score = 0.0;

            let idx = self
                .turn_order
                .pop_front()
                .unwrap_or_else(|| panic!("apply called with an empty turn queue"));

            let rules = self.rules;
            let mover = &mut self.roster[idx];
            mover.perform(action, &rules);
            let position = mover.position;
            let side = mover.side();

            let reward = self.grid.reward(position);
            if reward > 0 {
                match side {
                    Side::Mine => self.my_score += reward as i32,
                    Side::Theirs => self.opponent_score += reward as i32,
                }
                self.grid.set_reward(position, 0);
            }

            self.turn_order.push_back(idx);
            self.resolve_combat(idx);
        })
    }

    /// Clone of this state advanced by one ply
    pub fn child(&self, action: &Action) -> GameState {
        let mut next = self.clone();
        next.apply(action);
        next
    }

    /// Fights between the mover and every opponent on its cell. A loss ends
    /// the scan; ties are harmless.
    fn resolve_combat(&mut self, mover_idx: usize) {
        let mover = &self.roster[mover_idx];
        let side = mover.side();
        let allies = self.living_count(side) as f64;

        let mut delta = 0.0;
        let mut fallen = Vec::new();
        for &opp_idx in self.side_list(side.opponent()) {
            let opponent = &self.roster[opp_idx];
            if opponent.position != mover.position {
                continue;
            }

            let result = mover.combat(opponent);
            // Each kill is worth more the fewer agents the mover's side has left
            delta += result as f64 * self.rules.kill_reward * side.sign() / allies;

            if result < 0 {
                fallen.push(mover_idx);
                break;
            }
            if result > 0 {
                fallen.push(opp_idx);
            }
        }

        self.combat_score += delta;
        for idx in fallen {
            self.kill(idx);
        }
    }

    /// Removes the agent at the head of the queue from play
    pub fn kill_current(&mut self) {
        if let Some(&idx) = self.turn_order.front() {
            self.kill(idx);
        }
    }

    /// Removes a living agent from its side and from the turn queue, keeping
    /// the relative order of the rest. It stays in the roster.
    ///
    /// # Panics
    /// If the agent is not in the roster or is alive but missing from the queue.
    fn kill(&mut self, idx: usize) {
        let victim = self
            .roster
            .get(idx)
            .unwrap_or_else(|| panic!("agent #{} does not exist", idx));
        if !victim.alive {
            return;
        }

        let side = victim.side();
        match side {
            Side::Mine => self.mine.retain(|&i| i != idx),
            Side::Theirs => self.theirs.retain(|&i| i != idx),
        }

        let pos = self
            .turn_order
            .iter()
            .position(|&i| i == idx)
            .unwrap_or_else(|| panic!("living agent #{} missing from turn order", idx));
        self.turn_order.remove(pos);

        self.roster[idx].kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{CombatType, VisibleAgent, VisiblePellet};

    pub(crate) fn visible(id: u32, side: Side, x: i32, y: i32, t: CombatType) -> VisibleAgent {
        VisibleAgent {
            id,
            side,
            position: Point::new(x, y),
            combat_type: t,
            speed_turns_left: 0,
            ability_cooldown: 0,
        }
    }

    fn open_state(agents: Vec<VisibleAgent>) -> GameState {
        let mut state = GameState::new(&MapLayout::open(5, 5), Config::default_hardcoded().rules);
        let occupied: Vec<Point> = agents.iter().map(|a| a.position).collect();
        let pellets = (0..5)
            .flat_map(|y| (0..5).map(move |x| Point::new(x, y)))
            .filter(|p| !occupied.contains(p))
            .map(|position| VisiblePellet { position, value: 1 })
            .collect();
        state.begin_turn(&TurnSnapshot {
            my_score: 0,
            opponent_score: 0,
            agents,
            pellets,
        });
        state
    }

    fn step_to(state: &GameState, x: i32, y: i32) -> Action {
        Action::Move {
            target: Point::new(x, y),
            combat_type: state.current_agent().unwrap().combat_type,
        }
    }

    #[test]
    fn test_begin_turn_orders_queue_mine_first() {
        let state = open_state(vec![
            visible(0, Side::Theirs, 4, 4, CombatType::Rock),
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(1, Side::Mine, 2, 0, CombatType::Paper),
        ]);
        assert_eq!(
            state.turn_order(),
            vec![AgentId::mine(0), AgentId::mine(1), AgentId::theirs(0)]
        );
        assert_eq!(state.roster()[0].id, AgentId::theirs(0));
    }

    #[test]
    fn test_begin_turn_clears_visible_cells_without_pellets() {
        let layout = MapLayout::from_rows(&["#####", "#   #", "#####"]).unwrap();
        let mut state = GameState::new(&layout, Config::default_hardcoded().rules);
        state.begin_turn(&TurnSnapshot {
            my_score: 3,
            opponent_score: 4,
            agents: vec![visible(0, Side::Mine, 1, 1, CombatType::Rock)],
            pellets: vec![VisiblePellet {
                position: Point::new(3, 1),
                value: 10,
            }],
        });

        assert_eq!(state.grid().reward(Point::new(1, 1)), 0);
        assert_eq!(state.grid().reward(Point::new(2, 1)), 0);
        assert_eq!(state.grid().reward(Point::new(3, 1)), 10);
        assert_eq!(state.my_score(), 3);
        assert_eq!(state.opponent_score(), 4);
    }

    #[test]
    fn test_unseen_cells_keep_previous_rewards() {
        let layout = MapLayout::from_rows(&["#####", "# # #", "#####"]).unwrap();
        let mut state = GameState::new(&layout, Config::default_hardcoded().rules);
        state.begin_turn(&TurnSnapshot {
            my_score: 0,
            opponent_score: 0,
            agents: vec![visible(0, Side::Mine, 1, 1, CombatType::Rock)],
            pellets: vec![],
        });
        // (3, 1) is behind a wall and stays at the assumed pellet value
        assert_eq!(state.grid().reward(Point::new(3, 1)), 1);
    }

    #[test]
    fn test_dead_agents_stay_in_roster_only() {
        let state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(1, Side::Theirs, 3, 3, CombatType::Dead),
        ]);
        assert_eq!(state.roster().len(), 2);
        assert_eq!(state.living_count(Side::Theirs), 0);
        assert_eq!(state.turn_order(), vec![AgentId::mine(0)]);
    }

    #[test]
    fn test_legal_actions_without_speed() {
        let state = open_state(vec![visible(0, Side::Mine, 0, 0, CombatType::Rock)]);
        let actions = state.legal_actions();
        assert_eq!(actions.len(), 7);

        let targets: Vec<Point> = actions.iter().take(4).map(|a| a.target()).collect();
        assert_eq!(
            targets,
            vec![Point::new(0, 4), Point::new(1, 0), Point::new(0, 1), Point::new(4, 0)]
        );
        assert_eq!(
            actions[5],
            Action::Switch {
                target: Point::new(0, 0),
                combat_type: CombatType::Paper
            }
        );
        assert_eq!(
            actions[6],
            Action::Switch {
                target: Point::new(0, 0),
                combat_type: CombatType::Scissors
            }
        );
    }

    #[test]
    fn test_legal_actions_with_cooldown_are_moves_only() {
        let mut agent = visible(0, Side::Mine, 2, 2, CombatType::Rock);
        agent.ability_cooldown = 4;
        let state = open_state(vec![agent]);
        let actions = state.legal_actions();
        assert_eq!(actions.len(), 4);
        assert!(actions.iter().all(|a| matches!(a, Action::Move { .. })));
    }

    #[test]
    fn test_transition_eats_pellet_and_rotates_queue() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(0, Side::Theirs, 3, 3, CombatType::Rock),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);

        assert_eq!(state.my_score(), 1);
        assert_eq!(state.grid().reward(Point::new(1, 0)), 0);
        assert_eq!(state.turn_order(), vec![AgentId::theirs(0), AgentId::mine(0)]);
        assert_eq!(state.agent(AgentId::mine(0)).unwrap().position, Point::new(1, 0));
    }

    #[test]
    fn test_queue_returns_to_head_after_full_round() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(1, Side::Mine, 0, 2, CombatType::Rock),
            visible(0, Side::Theirs, 3, 3, CombatType::Rock),
        ]);
        let before = state.turn_order();
        for _ in 0..before.len() {
            let action = state.legal_actions()[0];
            state.apply(&action);
            let mut queue = state.turn_order();
            queue.sort_by_key(|id| (id.side == Side::Theirs, id.id));
            let mut living = before.clone();
            living.sort_by_key(|id| (id.side == Side::Theirs, id.id));
            assert_eq!(queue, living);
        }
        assert_eq!(state.turn_order(), before);
    }

    #[test]
    fn test_winning_fight_kills_opponent() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Paper),
            visible(0, Side::Theirs, 1, 0, CombatType::Rock),
            visible(1, Side::Theirs, 4, 4, CombatType::Rock),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);

        assert!(!state.agent(AgentId::theirs(0)).unwrap().alive);
        assert_eq!(state.living_count(Side::Theirs), 1);
        assert_eq!(state.turn_order(), vec![AgentId::theirs(1), AgentId::mine(0)]);
        assert_eq!(state.combat_score(), 100.0);
        assert_eq!(state.roster().len(), 3);
    }

    #[test]
    fn test_losing_fight_kills_mover_and_weighs_by_side_size() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(1, Side::Mine, 3, 3, CombatType::Rock),
            visible(0, Side::Theirs, 1, 0, CombatType::Paper),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);

        assert!(!state.agent(AgentId::mine(0)).unwrap().alive);
        assert_eq!(state.combat_score(), -50.0);
        assert_eq!(state.turn_order(), vec![AgentId::mine(1), AgentId::theirs(0)]);
    }

    #[test]
    fn test_tie_never_kills() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Scissors),
            visible(0, Side::Theirs, 1, 0, CombatType::Scissors),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);

        assert!(state.agent(AgentId::mine(0)).unwrap().alive);
        assert!(state.agent(AgentId::theirs(0)).unwrap().alive);
        assert_eq!(state.combat_score(), 0.0);
        assert_eq!(state.turn_order().len(), 2);
    }

    #[test]
    fn test_combat_score_is_cleared_each_ply() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Paper),
            visible(0, Side::Theirs, 1, 0, CombatType::Rock),
            visible(1, Side::Theirs, 4, 4, CombatType::Rock),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);
        assert!(state.combat_score() > 0.0);

        let action = step_to(&state, 4, 3);
        state.apply(&action);
        assert_eq!(state.combat_score(), 0.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Paper),
            visible(0, Side::Theirs, 1, 0, CombatType::Rock),
            visible(1, Side::Theirs, 4, 4, CombatType::Rock),
        ]);
        let snapshot = original.clone();

        let mut copy = original.clone();
        assert_eq!(copy, original);
        let action = step_to(&copy, 1, 0);
        copy.apply(&action);
        copy.kill_current();

        assert_eq!(original, snapshot);
        assert_eq!(original.grid().reward(Point::new(1, 0)), 1);
        assert_eq!(original.agent(AgentId::mine(0)).unwrap().position, Point::new(0, 0));
        assert_eq!(original.my_score(), 0);
        assert_eq!(
            original.turn_order(),
            vec![AgentId::mine(0), AgentId::theirs(0), AgentId::theirs(1)]
        );
        assert_ne!(copy, original);
    }

    #[test]
    fn test_kill_current_removes_head_only() {
        let mut state = open_state(vec![
            visible(0, Side::Mine, 0, 0, CombatType::Rock),
            visible(0, Side::Theirs, 2, 2, CombatType::Rock),
            visible(1, Side::Theirs, 4, 4, CombatType::Rock),
        ]);
        let action = step_to(&state, 1, 0);
        state.apply(&action);
        state.kill_current();

        assert_eq!(state.turn_order(), vec![AgentId::theirs(1), AgentId::mine(0)]);
        assert!(!state.agent(AgentId::theirs(0)).unwrap().alive);
        assert_eq!(state.living_count(Side::Theirs), 1);
    }
}
