// Toroidal grid: immutable walls plus a mutable reward layer

use serde::{Deserialize, Serialize};

use crate::types::{Direction, MapLayout, Point};

/// Reward of an ordinary pellet
pub const PELLET_REWARD: u32 = 1;
/// Reward of a power pellet
pub const POWER_PELLET_REWARD: u32 = 10;

/// Wall bitmap and per-cell rewards. Coordinates wrap on both axes.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    walls: Vec<bool>,
    rewards: Vec<u32>,
}

impl Grid {
    /// Creates a grid from the static map, assuming `unseen_reward` on every open cell
    pub fn new(layout: &MapLayout, unseen_reward: u32) -> Self {
        let rewards = layout
            .walls
            .iter()
            .map(|&wall| if wall { 0 } else { unseen_reward })
            .collect();

        Grid {
            width: layout.width,
            height: layout.height,
            walls: layout.walls.clone(),
            rewards,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells (walls included)
    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Reduces a point onto the torus; negative offsets wrap to the far edge
    pub fn wrap(&self, p: Point) -> Point {
        Point::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }

    /// Row-major cell index of an already wrapped point
    pub fn index(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    pub fn is_wall(&self, p: Point) -> bool {
        self.walls[self.index(p)]
    }

    pub fn reward(&self, p: Point) -> u32 {
        self.rewards[self.index(p)]
    }

    /// Sets the reward of an open cell. Walls always keep a reward of 0.
    pub fn set_reward(&mut self, p: Point, reward: u32) {
        if self.is_wall(p) {
            return;
        }
        let idx = self.index(p);
        self.rewards[idx] = reward;
    }

    /// Wrapped neighbor of `p` in direction `d`
    pub fn step(&self, p: Point, d: Direction) -> Point {
        self.wrap(d.apply(p))
    }

    /// Wrapped, non-wall cardinal neighbors in direction order
    pub fn open_neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        Direction::all()
            .into_iter()
            .map(move |d| self.step(p, d))
            .filter(move |&n| !self.is_wall(n))
    }

    /// Open cells seen looking from `start` towards `d` until the first wall.
    /// A wall-free line stops once it has wrapped back to `start`.
    pub fn line_of_sight(&self, start: Point, d: Direction) -> Vec<Point> {
        let mut seen = Vec::new();
        let mut p = self.step(start, d);
        while !self.is_wall(p) && p != start {
            seen.push(p);
            p = self.step(p, d);
        }
        seen
    }

    /// Sum of all rewards left on the grid
    pub fn total_reward(&self) -> u64 {
        self.rewards.iter().map(|&r| r as u64).sum()
    }
}
