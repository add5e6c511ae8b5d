use crate::error::BoardError;
use crate::rng::Rng;
use crate::types::{CellSymbol, Position};

/// The one maze the game ships with. `#` blocks, `.` holds a dot, space is bare track.
pub const CLASSIC_LAYOUT: &[&str] = &[
    "###################",
    "# .......#....... #",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "####.#       #.####",
    "####.# ##### #.####",
    "#......     ......#",
    "####.# ##### #.####",
    "####.#       #.####",
    "####.# ##### #.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#..#...........#..#",
    "##.#.#.#####.#.#.##",
    "#....#... ...#....#",
    "#.######.#.######.#",
    "# ............... #",
    "###################",
];

const BLOCKING_SYMBOLS: [char; 1] = ['#'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tile {
    Wall,
    Track,
    Dot,
}

/// Which cells an entity may stand on. Built once per board and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassabilityMap {
    height: i32,
    width: i32,
    cells: Vec<bool>,
}

impl PassabilityMap {
    /// `cells` is row-major and must hold `height * width` entries.
    pub fn new(height: usize, width: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), height * width);
        Self {
            height: height as i32,
            width: width as i32,
            cells,
        }
    }

    pub fn open(height: usize, width: usize) -> Self {
        Self::new(height, width, vec![true; height * width])
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && pos.row < self.height && pos.col < self.width
    }

    pub fn is_passable(&self, pos: Position) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.cells
            .get((pos.row * self.width + pos.col) as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn set_passable(&mut self, pos: Position, passable: bool) {
        if !self.contains(pos) {
            return;
        }
        if let Some(cell) = self.cells.get_mut((pos.row * self.width + pos.col) as usize) {
            *cell = passable;
        }
    }

    pub fn passable_neighbours(&self, pos: Position) -> Vec<Position> {
        pos.neighbours(self.height, self.width)
            .into_iter()
            .filter(|next| self.is_passable(*next))
            .collect()
    }

    pub fn passable_cells(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let pos = Position::new(row, col);
                if self.is_passable(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    tiles: Vec<Vec<Tile>>,
    passability: PassabilityMap,
}

impl Board {
    #[cfg(test)]
    fn classic() -> Result<Self, BoardError> {
        Self::from_layout(CLASSIC_LAYOUT)
    }

    pub fn from_layout(layout: &[&str]) -> Result<Self, BoardError> {
        let Some(first) = layout.first() else {
            return Err(BoardError::EmptyLayout);
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(BoardError::EmptyLayout);
        }

        let mut tiles = Vec::with_capacity(layout.len());
        for (row, line) in layout.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            let mut parsed = Vec::with_capacity(width);
            for (col, symbol) in line.chars().enumerate() {
                let tile = match symbol {
                    '#' => Tile::Wall,
                    '.' => Tile::Dot,
                    ' ' => Tile::Track,
                    _ => return Err(BoardError::UnknownSymbol { symbol, row, col }),
                };
                parsed.push(tile);
            }
            tiles.push(parsed);
        }

        let passability = PassabilityMap::new(
            layout.len(),
            width,
            layout
                .iter()
                .flat_map(|line| line.chars())
                .map(|symbol| !BLOCKING_SYMBOLS.contains(&symbol))
                .collect(),
        );

        Ok(Self {
            tiles,
            passability,
        })
    }

    pub fn height(&self) -> i32 {
        self.passability.height()
    }

    pub fn width(&self) -> i32 {
        self.passability.width()
    }

    pub fn passability(&self) -> &PassabilityMap {
        &self.passability
    }

    pub fn is_passable(&self, pos: Position) -> bool {
        self.passability.is_passable(pos)
    }

    pub fn require_passable(&self, pos: Position, what: &'static str) -> Result<(), BoardError> {
        if self.is_passable(pos) {
            Ok(())
        } else {
            Err(BoardError::BlockedCell { what, at: pos })
        }
    }

    fn tile(&self, pos: Position) -> Option<Tile> {
        if !self.passability.contains(pos) {
            return None;
        }
        self.tiles
            .get(pos.row as usize)
            .and_then(|row| row.get(pos.col as usize))
            .copied()
    }

    pub fn has_dot(&self, pos: Position) -> bool {
        self.tile(pos) == Some(Tile::Dot)
    }

    /// Clears the dot at `pos`; false when there was none.
    pub fn take_dot(&mut self, pos: Position) -> bool {
        if !self.has_dot(pos) {
            return false;
        }
        self.tiles[pos.row as usize][pos.col as usize] = Tile::Track;
        true
    }

    pub fn dot_count(&self) -> u32 {
        self.tiles
            .iter()
            .flatten()
            .filter(|tile| **tile == Tile::Dot)
            .count() as u32
    }

    #[cfg(test)]
    fn dot_cells(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for (row, line) in self.tiles.iter().enumerate() {
            for (col, tile) in line.iter().enumerate() {
                if *tile == Tile::Dot {
                    out.push(Position::new(row as i32, col as i32));
                }
            }
        }
        out
    }

    /// Corner cells one step inside the outer wall.
    pub fn pill_spawns(&self) -> [Position; 4] {
        let h = self.height();
        let w = self.width();
        [
            Position::new(1, 1),
            Position::new(1, w - 2),
            Position::new(h - 2, 1),
            Position::new(h - 2, w - 2),
        ]
    }

    pub fn random_passable_cell(&self, rng: &mut Rng, exclude: &[Position]) -> Option<Position> {
        let candidates: Vec<Position> = self
            .passability
            .passable_cells()
            .into_iter()
            .filter(|pos| !exclude.contains(pos))
            .collect();
        rng.choose(&candidates).copied()
    }

    /// Static layer of the render grid: walls, bare track and remaining dots.
    pub fn symbol_grid(&self) -> Vec<Vec<CellSymbol>> {
        self.tiles
            .iter()
            .map(|row| {
                row.iter()
                    .map(|tile| match tile {
                        Tile::Wall => CellSymbol::Wall,
                        Tile::Track => CellSymbol::Track,
                        Tile::Dot => CellSymbol::Dot,
                    })
                    .collect()
            })
            .collect()
    }
}
