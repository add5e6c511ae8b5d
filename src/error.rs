use thiserror::Error;

use crate::types::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("maze template has no rows")]
    EmptyLayout,
    #[error("maze row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown maze symbol {symbol:?} at row {row}, col {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
    #[error("{what} cell ({}, {}) is not passable", .at.row, .at.col)]
    BlockedCell { what: &'static str, at: Position },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid maze: {0}")]
    Board(#[from] BoardError),
    #[error("maze has no dots; the level would end before it starts")]
    NoDots,
}
