// Line-oriented referee protocol
//
// Input: the map once, then one block per turn. Output: one line per turn with
// all of our commands joined by '|'.

use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::types::{
    Action, CombatType, MapLayout, PlannedAction, Point, Side, TurnSnapshot, VisibleAgent,
    VisiblePellet,
};

/// Reads the referee's messages from any async buffered source
pub struct ProtocolReader<R> {
    lines: Lines<R>,
    line_number: usize,
    /// Map size once `read_map` has succeeded; positions are checked against it
    bounds: Option<(i32, i32)>,
}

impl<R: AsyncBufRead + Unpin> ProtocolReader<R> {
    pub fn new(reader: R) -> Self {
        ProtocolReader {
            lines: reader.lines(),
            line_number: 0,
            bounds: None,
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>, String> {
        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read line {}: {}", self.line_number + 1, e))?;
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    async fn expect_line(&mut self, what: &str) -> Result<String, String> {
        self.next_line()
            .await?
            .ok_or_else(|| format!("Unexpected end of input while reading {}", what))
    }

    /// Reads `width height` followed by `height` rows where '#' is a wall.
    /// Short rows are padded with floor.
    pub async fn read_map(&mut self) -> Result<MapLayout, String> {
        let header = self.expect_line("map size").await?;
        let fields = Fields::new(&header, self.line_number);
        let width: i32 = fields.get(0, "width")?;
        let height: i32 = fields.get(1, "height")?;
        if width <= 0 || height <= 0 {
            return Err(format!(
                "Line {}: invalid map size {}x{}",
                self.line_number, width, height
            ));
        }

        let mut walls = Vec::with_capacity((width * height) as usize);
        for _ in 0..height {
            let row = self.expect_line("map row").await?;
            let cells: Vec<char> = row.chars().collect();
            if cells.len() > width as usize {
                return Err(format!(
                    "Line {}: map row has {} cells, expected {}",
                    self.line_number,
                    cells.len(),
                    width
                ));
            }
            walls.extend((0..width as usize).map(|x| cells.get(x) == Some(&'#')));
        }

        self.bounds = Some((width, height));
        Ok(MapLayout {
            width,
            height,
            walls,
        })
    }

    /// Reads one turn block; `Ok(None)` once the input is exhausted
    pub async fn read_turn(&mut self) -> Result<Option<TurnSnapshot>, String> {
        let scores = match self.next_line().await? {
            Some(line) => line,
            None => return Ok(None),
        };
        let fields = Fields::new(&scores, self.line_number);
        let my_score = fields.get(0, "my score")?;
        let opponent_score = fields.get(1, "opponent score")?;

        let count_line = self.expect_line("agent count").await?;
        let agent_count: usize = Fields::new(&count_line, self.line_number).get(0, "agent count")?;
        let mut agents = Vec::with_capacity(agent_count);
        for _ in 0..agent_count {
            let line = self.expect_line("agent").await?;
            let agent = parse_agent(&line, self.line_number)?;
            self.check_position(agent.position)?;
            agents.push(agent);
        }

        let count_line = self.expect_line("pellet count").await?;
        let pellet_count: usize =
            Fields::new(&count_line, self.line_number).get(0, "pellet count")?;
        let mut pellets = Vec::with_capacity(pellet_count);
        for _ in 0..pellet_count {
            let line = self.expect_line("pellet").await?;
            let fields = Fields::new(&line, self.line_number);
            let position = Point::new(fields.get(0, "x")?, fields.get(1, "y")?);
            self.check_position(position)?;
            pellets.push(VisiblePellet {
                position,
                value: fields.get(2, "value")?,
            });
        }

        Ok(Some(TurnSnapshot {
            my_score,
            opponent_score,
            agents,
            pellets,
        }))
    }

    fn check_position(&self, p: Point) -> Result<(), String> {
        match self.bounds {
            Some((width, height)) if p.x < 0 || p.x >= width || p.y < 0 || p.y >= height => {
                Err(format!(
                    "Line {}: position {} is outside the {}x{} map",
                    self.line_number, p, width, height
                ))
            }
            _ => Ok(()),
        }
    }
}

/// `pacId mine x y typeId speedTurnsLeft abilityCooldown`
fn parse_agent(line: &str, line_number: usize) -> Result<VisibleAgent, String> {
    let fields = Fields::new(line, line_number);
    let side = if fields.raw(1, "owner")? == "0" {
        Side::Theirs
    } else {
        Side::Mine
    };

    Ok(VisibleAgent {
        id: fields.get(0, "agent id")?,
        side,
        position: Point::new(fields.get(2, "x")?, fields.get(3, "y")?),
        combat_type: fields.get::<CombatType>(4, "type")?,
        speed_turns_left: fields.get(5, "speed turns")?,
        ability_cooldown: fields.get(6, "cooldown")?,
    })
}

/// Whitespace-separated fields of one input line
struct Fields<'a> {
    parts: Vec<&'a str>,
    line_number: usize,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str, line_number: usize) -> Self {
        Fields {
            parts: line.split_whitespace().collect(),
            line_number,
        }
    }

    fn raw(&self, index: usize, name: &str) -> Result<&'a str, String> {
        self.parts
            .get(index)
            .copied()
            .ok_or_else(|| format!("Line {}: missing {}", self.line_number, name))
    }

    fn get<T>(&self, index: usize, name: &str) -> Result<T, String>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.raw(index, name)?;
        raw.parse()
            .map_err(|e| format!("Line {}: invalid {} '{}': {}", self.line_number, name, raw, e))
    }
}

/// Renders one command
pub fn format_action(planned: &PlannedAction) -> String {
    let id = planned.agent.id;
    match planned.action {
        Action::Move { target, .. } => format!("MOVE {} {} {}", id, target.x, target.y),
        Action::Speed { .. } => format!("SPEED {}", id),
        Action::Switch { combat_type, .. } => format!("SWITCH {} {}", id, combat_type.as_str()),
    }
}

/// Renders a full turn's output line
pub fn format_actions(actions: &[PlannedAction]) -> String {
    actions
        .iter()
        .map(format_action)
        .collect::<Vec<_>>()
        .join("|")
}
