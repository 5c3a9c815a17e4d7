use serde::{Deserialize, Serialize};
use std::fmt;

/// Default board height of the checkers page.
pub const DEFAULT_TOTAL_ROWS: usize = 8;

/// The two sides of the game. The driver plays `Player`; `System` is the
/// autonomous opponent behind the remote board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Player,
    System,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Player => write!(f, "Player"),
            Owner::System => write!(f, "System"),
        }
    }
}

/// Logical game coordinate embedded in a piece's descriptor.
///
/// Signed so that off-board candidates (column -1 and the like) can be
/// expressed and probed; they simply never match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub column: i32,
    pub row: i32,
}

impl Position {
    pub fn new(column: i32, row: i32) -> Self {
        Position { column, row }
    }

    pub fn offset(&self, columns: i32, rows: i32) -> Self {
        Position::new(self.column + columns, self.row + rows)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Opaque reference to an element of the external board. Only the
/// surface that produced it knows what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        ElementHandle(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A piece as returned by a row query, before its descriptor is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceHandle {
    pub handle: ElementHandle,
    pub owner: Owner,
    pub query_row: usize,
}

/// A piece whose position has been decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub handle: ElementHandle,
    pub owner: Owner,
    pub query_row: usize,
    pub position: Position,
}

/// An empty cell marked as a valid move target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub handle: ElementHandle,
    pub query_row: usize,
    pub position: Position,
}

/// Whole-board piece totals per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PieceCounts {
    pub player: usize,
    pub system: usize,
}

impl PieceCounts {
    pub fn new(player: usize, system: usize) -> Self {
        PieceCounts { player, system }
    }

    pub fn of(&self, owner: Owner) -> usize {
        match owner {
            Owner::Player => self.player,
            Owner::System => self.system,
        }
    }
}

impl fmt::Display for PieceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Player / {} System", self.player, self.system)
    }
}
