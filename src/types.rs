use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// (row, col) delta of one step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Logical directions currently held by the input layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldDirections {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldDirections {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(dir: Direction) -> Self {
        let mut held = Self::default();
        held.set(dir, true);
        held
    }

    pub fn set(&mut self, dir: Direction, pressed: bool) {
        match dir {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    pub fn is_held(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    /// Every held direction shifts its axis independently, so opposing keys cancel
    /// and perpendicular keys combine.
    pub fn target_from(&self, from: Position) -> Position {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.is_held(*dir))
            .fold(from, |pos, dir| pos.step(dir))
    }
}

impl FromIterator<Direction> for HeldDirections {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut held = Self::default();
        for dir in iter {
            held.set(dir, true);
        }
        held
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    /// Orthogonal neighbours inside a `height` x `width` grid, ordered up, down, left, right.
    pub fn neighbours(self, height: i32, width: i32) -> Vec<Position> {
        Direction::ALL
            .into_iter()
            .map(|dir| self.step(dir))
            .filter(|pos| pos.row >= 0 && pos.col >= 0 && pos.row < height && pos.col < width)
            .collect()
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl PursuerName {
    pub const ROSTER: [PursuerName; 4] = [
        PursuerName::Blinky,
        PursuerName::Pinky,
        PursuerName::Inky,
        PursuerName::Clyde,
    ];

    /// Blinky and Pinky hunt the player; Inky and Clyde roam.
    pub fn chases_player(self) -> bool {
        matches!(self, PursuerName::Blinky | PursuerName::Pinky)
    }

    pub fn symbol(self) -> char {
        match self {
            PursuerName::Blinky => 'B',
            PursuerName::Pinky => 'P',
            PursuerName::Inky => 'I',
            PursuerName::Clyde => 'C',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitTier {
    Cherry,
    Strawberry,
    Orange,
}

impl FruitTier {
    pub fn reward(self) -> u32 {
        match self {
            FruitTier::Cherry => 100,
            FruitTier::Strawberry => 300,
            FruitTier::Orange => 500,
        }
    }

    pub fn next(self) -> Self {
        match self {
            FruitTier::Cherry => FruitTier::Strawberry,
            FruitTier::Strawberry | FruitTier::Orange => FruitTier::Orange,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellSymbol {
    Wall,
    Track,
    Dot,
    PowerPill,
    Player,
    Pursuer(PursuerName),
    Fruit,
}

impl CellSymbol {
    pub fn as_char(self) -> char {
        match self {
            CellSymbol::Wall => '#',
            CellSymbol::Track => ' ',
            CellSymbol::Dot => '.',
            CellSymbol::PowerPill => 'o',
            CellSymbol::Player => 'X',
            CellSymbol::Pursuer(name) => name.symbol(),
            CellSymbol::Fruit => 'F',
        }
    }

    #[cfg(test)]
    fn from_char(value: char) -> Option<Self> {
        match value {
            '#' => Some(CellSymbol::Wall),
            ' ' => Some(CellSymbol::Track),
            '.' => Some(CellSymbol::Dot),
            'o' => Some(CellSymbol::PowerPill),
            'X' => Some(CellSymbol::Player),
            'B' => Some(CellSymbol::Pursuer(PursuerName::Blinky)),
            'P' => Some(CellSymbol::Pursuer(PursuerName::Pinky)),
            'I' => Some(CellSymbol::Pursuer(PursuerName::Inky)),
            'C' => Some(CellSymbol::Pursuer(PursuerName::Clyde)),
            'F' => Some(CellSymbol::Fruit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Ready,
    Playing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub score: u32,
    pub level: u32,
    #[serde(rename = "dotsEaten")]
    pub dots_eaten: u32,
    #[serde(rename = "pursuersEaten")]
    pub pursuers_eaten: u32,
    #[serde(rename = "fruitsEaten")]
    pub fruits_eaten: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        at: Position,
    },
    PillTaken {
        at: Position,
        #[serde(rename = "powerMs")]
        power_ms: u64,
    },
    PowerExpired,
    PursuerEaten {
        name: PursuerName,
        reward: u32,
    },
    FruitSpawned {
        at: Position,
        tier: FruitTier,
    },
    FruitTaken {
        tier: FruitTier,
    },
    ExtraLife {
        lives: u32,
    },
    PlayerHit {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    LevelCleared {
        level: u32,
    },
    GameOver {
        summary: GameSummary,
    },
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub phase: GamePhase,
    pub level: u32,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "poweredUp")]
    pub powered_up: bool,
    #[serde(rename = "fruitTier")]
    pub fruit_tier: FruitTier,
    #[serde(rename = "remainingDots")]
    pub remaining_dots: u32,
    #[serde(rename = "tiles", serialize_with = "serialize_grid_rows")]
    pub grid: Vec<Vec<CellSymbol>>,
    pub events: Vec<RuntimeEvent>,
}

impl Frame {
    pub fn symbol_at(&self, pos: Position) -> Option<CellSymbol> {
        if pos.row < 0 || pos.col < 0 {
            return None;
        }
        self.grid
            .get(pos.row as usize)
            .and_then(|row| row.get(pos.col as usize))
            .copied()
    }

    pub fn rows(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_char()).collect())
            .collect()
    }
}

fn serialize_grid_rows<S>(grid: &[Vec<CellSymbol>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(grid.len()))?;
    for row in grid {
        let line: String = row.iter().map(|cell| cell.as_char()).collect();
        seq.serialize_element(&line)?;
    }
    seq.end()
}
