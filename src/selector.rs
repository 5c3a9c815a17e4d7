use crate::board::{Cell, Owner, Piece, Position};
use crate::error::{DriverError, Result};
use crate::query::BoardQuery;
use crate::surface::BoardSurface;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// One diagonal step forward for a Player piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub source: Piece,
    pub target: Cell,
}

impl Move {
    /// Click the piece, then the target. No read happens in between.
    pub fn execute<S: BoardSurface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        surface.activate(self.source.handle)?;
        surface.activate(self.target.handle)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.position, self.target.position)
    }
}

enum Selection {
    Found(Move),
    NoPiece,
    Blocked(Position),
}

/// Picks a non-capturing move for the first Player piece of a row.
///
/// "First" is whatever the page lists first; no other ordering is implied.
pub struct MoveSelector<'a, S: BoardSurface + ?Sized> {
    query: BoardQuery<'a, S>,
}

impl<'a, S: BoardSurface + ?Sized> MoveSelector<'a, S> {
    pub fn new(query: BoardQuery<'a, S>) -> Self {
        MoveSelector { query }
    }

    /// The first legal forward move of the first Player piece in `row`,
    /// trying the right diagonal `(c+1, r+1)` before the left `(c-1, r+1)`.
    pub fn select_first_move(&self, row: usize) -> Result<Option<Move>> {
        Ok(match self.selection(row)? {
            Selection::Found(mv) => Some(mv),
            Selection::NoPiece | Selection::Blocked(_) => None,
        })
    }

    /// Like [`select_first_move`](Self::select_first_move) but a missing
    /// move is an error naming the row and why.
    pub fn require_move(&self, row: usize) -> Result<Move> {
        match self.selection(row)? {
            Selection::Found(mv) => Ok(mv),
            Selection::NoPiece => Err(DriverError::NoLegalMove {
                row,
                reason: "no Player piece in row".to_string(),
            }),
            Selection::Blocked(position) => Err(DriverError::NoLegalMove {
                row,
                reason: format!("no reachable forward cell for piece at {}", position),
            }),
        }
    }

    fn selection(&self, row: usize) -> Result<Selection> {
        let Some(first) = self.query.find(row, Owner::Player)?.into_iter().next() else {
            debug!(row, "no Player piece to move");
            return Ok(Selection::NoPiece);
        };
        let source = self.query.resolve(first)?;

        for candidate in forward_targets(source.position) {
            if let Some(target) = self.query.reachable_cell(candidate)? {
                debug!(row, from = %source.position, to = %candidate, "selected move");
                return Ok(Selection::Found(Move { source, target }));
            }
        }

        debug!(row, from = %source.position, "first piece is blocked");
        Ok(Selection::Blocked(source.position))
    }
}

/// Forward diagonals of a Player piece, in the order they are tried.
pub fn forward_targets(from: Position) -> [Position; 2] {
    [from.offset(1, 1), from.offset(-1, 1)]
}
