// Core value types shared by the simulator, the search and the text protocol

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// 2D grid coordinate, (0, 0) is the top left corner
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four cardinal directions, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Returns all directions in move-generation order
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left]
    }

    /// Unit offset of this direction (y grows downwards)
    pub fn offset(&self) -> Point {
        match self {
            Direction::Up => Point::new(0, -1),
            Direction::Right => Point::new(1, 0),
            Direction::Down => Point::new(0, 1),
            Direction::Left => Point::new(-1, 0),
        }
    }

    /// Calculates the next (unwrapped) point when moving in this direction
    pub fn apply(&self, point: Point) -> Point {
        point + self.offset()
    }

    /// Direction that moves from `start` to `end`
    ///
    /// # Panics
    /// If the points are not exactly one cardinal step apart.
    pub fn between(start: Point, end: Point) -> Direction {
        let delta = Point::new(end.x - start.x, end.y - start.y);
        Direction::all()
            .into_iter()
            .find(|d| d.offset() == delta)
            .unwrap_or_else(|| panic!("{} and {} are not adjacent", start, end))
    }
}

/// Which team an agent plays for
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Mine,
    Theirs,
}

impl Side {
    /// +1 for our side, -1 for the opponent; used to sign utility terms
    pub fn sign(&self) -> f64 {
        match self {
            Side::Mine => 1.0,
            Side::Theirs => -1.0,
        }
    }

    pub fn opponent(&self) -> Side {
        match self {
            Side::Mine => Side::Theirs,
            Side::Theirs => Side::Mine,
        }
    }
}

/// Position in the food chain relative to a given combat type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodChain {
    /// The type that eats the given type
    Predator,
    /// The type eaten by the given type
    Prey,
}

impl FoodChain {
    fn offset(&self) -> i32 {
        match self {
            FoodChain::Predator => 1,
            FoodChain::Prey => -1,
        }
    }
}

/// Combat type of an agent. `Dead` is only ever reported for dead agents.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatType {
    Rock,
    Paper,
    Scissors,
    Dead,
}

impl CombatType {
    /// The three live types
    pub const LIVE: [CombatType; 3] = [CombatType::Rock, CombatType::Paper, CombatType::Scissors];

    /// Position in the 3-cycle; `None` for `Dead`
    pub fn code(&self) -> Option<i32> {
        match self {
            CombatType::Rock => Some(0),
            CombatType::Paper => Some(1),
            CombatType::Scissors => Some(2),
            CombatType::Dead => None,
        }
    }

    fn from_code(code: i32) -> CombatType {
        CombatType::LIVE[code.rem_euclid(3) as usize]
    }

    /// 1 if `self` beats `other`, -1 if it loses, 0 on a tie.
    /// Each type beats the one just below it in the cycle; dead types never fight.
    pub fn dominance(&self, other: CombatType) -> i32 {
        match (self.code(), other.code()) {
            (Some(a), Some(b)) => match (a - b).rem_euclid(3) {
                0 => 0,
                1 => 1,
                _ => -1,
            },
            _ => 0,
        }
    }

    /// The predator or prey of this type
    ///
    /// # Panics
    /// If called on `Dead`.
    pub fn switched(&self, chain: FoodChain) -> CombatType {
        let code = self
            .code()
            .unwrap_or_else(|| panic!("dead type has no place in the food chain"));
        CombatType::from_code((code + chain.offset() + 3) % 3)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombatType::Rock => "ROCK",
            CombatType::Paper => "PAPER",
            CombatType::Scissors => "SCISSORS",
            CombatType::Dead => "DEAD",
        }
    }
}

impl FromStr for CombatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROCK" => Ok(CombatType::Rock),
            "PAPER" => Ok(CombatType::Paper),
            "SCISSORS" => Ok(CombatType::Scissors),
            "DEAD" => Ok(CombatType::Dead),
            other => Err(format!("Unknown combat type '{}'", other)),
        }
    }
}

/// Stable identity of an agent for the whole game: ids are unique per side
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId {
    pub side: Side,
    pub id: u32,
}

impl AgentId {
    pub fn mine(id: u32) -> Self {
        AgentId { side: Side::Mine, id }
    }

    pub fn theirs(id: u32) -> Self {
        AgentId { side: Side::Theirs, id }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Side::Mine => write!(f, "mine#{}", self.id),
            Side::Theirs => write!(f, "theirs#{}", self.id),
        }
    }
}

/// Protocol keyword for each action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Move,
    Speed,
    Switch,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "MOVE",
            ActionKind::Speed => "SPEED",
            ActionKind::Switch => "SWITCH",
        }
    }
}

/// One ply of play for the agent at the head of the turn queue.
///
/// Moves carry the mover's current type; abilities carry the type the agent
/// will have afterwards.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move { target: Point, combat_type: CombatType },
    Speed { target: Point, combat_type: CombatType },
    Switch { target: Point, combat_type: CombatType },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Speed { .. } => ActionKind::Speed,
            Action::Switch { .. } => ActionKind::Switch,
        }
    }

    pub fn target(&self) -> Point {
        match *self {
            Action::Move { target, .. }
            | Action::Speed { target, .. }
            | Action::Switch { target, .. } => target,
        }
    }

    pub fn combat_type(&self) -> CombatType {
        match *self {
            Action::Move { combat_type, .. }
            | Action::Speed { combat_type, .. }
            | Action::Switch { combat_type, .. } => combat_type,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.kind().as_str(),
            self.target(),
            self.combat_type().as_str()
        )
    }
}

/// An action chosen for a specific agent
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAction {
    pub agent: AgentId,
    pub action: Action,
}

/// Static map received once at the start of the game
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MapLayout {
    pub width: i32,
    pub height: i32,
    /// Row-major, `true` at walls
    pub walls: Vec<bool>,
}

impl MapLayout {
    /// Builds a layout from text rows where `#` marks a wall
    pub fn from_rows(rows: &[&str]) -> Result<Self, String> {
        let height = rows.len() as i32;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as i32;
        if width == 0 || height == 0 {
            return Err("Map must have at least one row and one column".to_string());
        }

        let mut walls = Vec::with_capacity((width * height) as usize);
        for (y, row) in rows.iter().enumerate() {
            let length = row.chars().count() as i32;
            if length != width {
                return Err(format!("Map row {} has length {}, expected {}", y, length, width));
            }
            walls.extend(row.chars().map(|c| c == '#'));
        }

        Ok(MapLayout { width, height, walls })
    }

    /// A map with no walls at all
    pub fn open(width: i32, height: i32) -> Self {
        MapLayout {
            width,
            height,
            walls: vec![false; (width * height) as usize],
        }
    }
}

/// An agent as reported in a turn snapshot
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VisibleAgent {
    pub id: u32,
    pub side: Side,
    pub position: Point,
    pub combat_type: CombatType,
    pub speed_turns_left: u32,
    pub ability_cooldown: u32,
}

/// A pellet as reported in a turn snapshot
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct VisiblePellet {
    pub position: Point,
    pub value: u32,
}

/// Everything the referee tells us at the start of a turn
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TurnSnapshot {
    pub my_score: i32,
    pub opponent_score: i32,
    pub agents: Vec<VisibleAgent>,
    pub pellets: Vec<VisiblePellet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_is_a_three_cycle() {
        for a in CombatType::LIVE {
            let wins = CombatType::LIVE.iter().filter(|&&b| a.dominance(b) == 1).count();
            let losses = CombatType::LIVE.iter().filter(|&&b| a.dominance(b) == -1).count();
            assert_eq!(wins, 1, "{:?} should beat exactly one type", a);
            assert_eq!(losses, 1, "{:?} should lose to exactly one type", a);
            assert_eq!(a.dominance(a), 0);
            for b in CombatType::LIVE {
                assert_eq!(a.dominance(b), -b.dominance(a));
            }
        }
    }

    #[test]
    fn test_classic_rules() {
        assert_eq!(CombatType::Paper.dominance(CombatType::Rock), 1);
        assert_eq!(CombatType::Rock.dominance(CombatType::Scissors), 1);
        assert_eq!(CombatType::Scissors.dominance(CombatType::Paper), 1);
        assert_eq!(CombatType::Rock.dominance(CombatType::Paper), -1);
    }

    #[test]
    fn test_predator_and_prey() {
        assert_eq!(CombatType::Rock.switched(FoodChain::Predator), CombatType::Paper);
        assert_eq!(CombatType::Rock.switched(FoodChain::Prey), CombatType::Scissors);
        for t in CombatType::LIVE {
            let predator = t.switched(FoodChain::Predator);
            assert_eq!(predator.dominance(t), 1);
            assert_eq!(t.dominance(t.switched(FoodChain::Prey)), 1);
            assert_eq!(predator.switched(FoodChain::Prey), t);
            assert_eq!(t.switched(FoodChain::Prey).switched(FoodChain::Predator), t);
        }
    }

    #[test]
    #[should_panic(expected = "dead type")]
    fn test_switching_dead_type_panics() {
        CombatType::Dead.switched(FoodChain::Prey);
    }

    #[test]
    fn test_dead_never_fights() {
        assert_eq!(CombatType::Dead.dominance(CombatType::Rock), 0);
        assert_eq!(CombatType::Paper.dominance(CombatType::Dead), 0);
    }

    #[test]
    fn test_direction_between() {
        let p = Point::new(3, 3);
        for d in Direction::all() {
            assert_eq!(Direction::between(p, d.apply(p)), d);
        }
    }

    #[test]
    #[should_panic(expected = "not adjacent")]
    fn test_direction_between_non_adjacent_panics() {
        Direction::between(Point::new(0, 0), Point::new(2, 0));
    }

    #[test]
    fn test_combat_type_parsing() {
        assert_eq!("SCISSORS".parse::<CombatType>(), Ok(CombatType::Scissors));
        assert_eq!("DEAD".parse::<CombatType>(), Ok(CombatType::Dead));
        assert!("LIZARD".parse::<CombatType>().is_err());
    }

    #[test]
    fn test_map_layout_from_rows() {
        let layout = MapLayout::from_rows(&["###", "# #"]).unwrap();
        assert_eq!(layout.width, 3);
        assert_eq!(layout.height, 2);
        assert!(layout.walls[0]);
        assert!(!layout.walls[4]);
        assert!(MapLayout::from_rows(&["##", "#"]).is_err());
    }

    #[test]
    fn test_row_length_error_counts_chars() {
        // One char, two bytes
        let err = MapLayout::from_rows(&["  ", "é"]).unwrap_err();
        assert_eq!(err, "Map row 1 has length 1, expected 2");
    }
}
