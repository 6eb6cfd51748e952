// Invariants of the turn queue, combat and cloning over longer play-outs

use std::collections::HashSet;

use pellet_pursuit::config::Config;
use pellet_pursuit::state::GameState;
use pellet_pursuit::types::{
    AgentId, CombatType, FoodChain, MapLayout, Point, Side, TurnSnapshot, VisibleAgent,
};

fn pac(id: u32, side: Side, x: i32, y: i32, combat_type: CombatType) -> VisibleAgent {
    VisibleAgent {
        id,
        side,
        position: Point::new(x, y),
        combat_type,
        speed_turns_left: 0,
        ability_cooldown: 0,
    }
}

fn crowded_state() -> GameState {
    let layout = MapLayout::from_rows(&["#### ####", "         ", "## # # ##", "         ", "#### ####"])
        .unwrap();
    let mut state = GameState::new(&layout, Config::default_hardcoded().rules);
    state.begin_turn(&TurnSnapshot {
        my_score: 0,
        opponent_score: 0,
        agents: vec![
            pac(0, Side::Mine, 0, 1, CombatType::Rock),
            pac(1, Side::Mine, 4, 3, CombatType::Paper),
            pac(2, Side::Mine, 8, 1, CombatType::Scissors),
            pac(0, Side::Theirs, 2, 1, CombatType::Paper),
            pac(1, Side::Theirs, 5, 3, CombatType::Scissors),
            pac(2, Side::Theirs, 4, 0, CombatType::Rock),
        ],
        pellets: vec![],
    });
    state
}

fn living_ids(state: &GameState) -> HashSet<AgentId> {
    state
        .living(Side::Mine)
        .chain(state.living(Side::Theirs))
        .map(|a| a.id)
        .collect()
}

#[test]
fn test_queue_is_always_a_permutation_of_the_living() {
    let mut state = crowded_state();

    for ply in 0..200 {
        let actions = state.legal_actions();
        if actions.is_empty() {
            break;
        }
        // Deterministic but varied choice of action
        let action = actions[(ply * 7 + 3) % actions.len()];
        state.apply(&action);

        let queue = state.turn_order();
        let unique: HashSet<AgentId> = queue.iter().copied().collect();
        assert_eq!(unique.len(), queue.len(), "duplicate in queue at ply {}", ply);
        assert_eq!(unique, living_ids(&state), "queue diverged at ply {}", ply);
        assert!(state.agents_in_turn_order().all(|a| a.alive));
        assert_eq!(state.roster().len(), 6);
    }
}

#[test]
fn test_scores_only_grow_and_grid_only_shrinks() {
    let mut state = crowded_state();
    let mut last_reward = state.grid().total_reward();
    let mut last_scores = (state.my_score(), state.opponent_score());

    for ply in 0..60 {
        let actions = state.legal_actions();
        if actions.is_empty() {
            break;
        }
        let action = actions[ply % actions.len()];
        state.apply(&action);

        let reward = state.grid().total_reward();
        let scores = (state.my_score(), state.opponent_score());
        assert!(reward <= last_reward);
        assert!(scores.0 >= last_scores.0 && scores.1 >= last_scores.1);
        let eaten = (scores.0 - last_scores.0 + scores.1 - last_scores.1) as u64;
        assert_eq!(last_reward - reward, eaten);

        last_reward = reward;
        last_scores = scores;
    }
}

#[test]
fn test_switch_offsets_are_inverse() {
    for t in CombatType::LIVE {
        assert_eq!(t.switched(FoodChain::Predator).switched(FoodChain::Prey), t);
        assert_eq!(t.switched(FoodChain::Prey).switched(FoodChain::Predator), t);
        assert_eq!(t.switched(FoodChain::Predator).dominance(t), 1);
        assert_eq!(t.switched(FoodChain::Prey).dominance(t), -1);
    }
}

#[test]
fn test_clone_survives_deaths_in_the_copy() {
    let original = crowded_state();
    let before = original.clone();

    let mut copy = original.clone();
    for ply in 0..12 {
        let actions = copy.legal_actions();
        let action = actions[ply % actions.len()];
        copy.apply(&action);
    }
    copy.kill_current();
    copy.kill_current();

    assert_ne!(copy, original);
    assert_eq!(original, before);
    assert_eq!(original.living_count(Side::Mine), 3);
    assert_eq!(original.living_count(Side::Theirs), 3);
    assert_eq!(original.turn_order().len(), 6);
    assert!(original.roster().iter().all(|a| a.alive));
}
