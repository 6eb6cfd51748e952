// Mobile agent record and its per-ply bookkeeping

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::types::{Action, AgentId, CombatType, Point, Side, VisibleAgent};

/// One agent on the board. Mutated in place only by state transitions.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Point,
    pub combat_type: CombatType,
    pub alive: bool,
    /// Turns until an ability can be used again
    pub cooldown: u32,
    /// Turns of speed boost left
    pub speed_remaining: u32,
}

impl Agent {
    pub fn new(id: AgentId, position: Point, combat_type: CombatType) -> Self {
        Agent {
            id,
            position,
            combat_type,
            alive: combat_type != CombatType::Dead,
            cooldown: 0,
            speed_remaining: 0,
        }
    }

    pub fn from_visible(visible: &VisibleAgent) -> Self {
        Agent {
            cooldown: visible.ability_cooldown,
            speed_remaining: visible.speed_turns_left,
            ..Agent::new(
                AgentId {
                    side: visible.side,
                    id: visible.id,
                },
                visible.position,
                visible.combat_type,
            )
        }
    }

    pub fn side(&self) -> Side {
        self.id.side
    }

    pub fn is_mine(&self) -> bool {
        self.id.side == Side::Mine
    }

    /// Applies the agent-local effect of an action
    pub fn perform(&mut self, action: &Action, rules: &RulesConfig) {
        match *action {
            Action::Move { target, .. } => {
                self.position = target;
                self.cooldown = self.cooldown.saturating_sub(1);
                self.speed_remaining = self.speed_remaining.saturating_sub(1);
            }
            Action::Speed { .. } => {
                self.cooldown = rules.ability_cooldown;
                self.speed_remaining = rules.speed_duration;
            }
            Action::Switch { combat_type, .. } => {
                self.combat_type = combat_type;
                self.cooldown = rules.ability_cooldown;
            }
        }
    }

    /// Outcome of fighting `other` from this agent's point of view: 1 win, -1 loss, 0 tie
    pub fn combat(&self, other: &Agent) -> i32 {
        self.combat_type.dominance(other.combat_type)
    }

    /// Marks the agent dead. Rosters are maintained by the owning state.
    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }
}
