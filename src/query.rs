use crate::board::{Cell, ElementHandle, Owner, Piece, PieceCounts, PieceHandle, Position};
use crate::codec;
use crate::config::Markers;
use crate::error::{DriverError, Result};
use crate::surface::{BoardSurface, DESCRIPTOR_ATTRIBUTE, ElementQuery};
use tracing::debug;

/// Read-only view over the external board.
///
/// Every call goes to the surface; nothing is cached, since the page is
/// the only source of truth and may change whenever a command is issued.
pub struct BoardQuery<'a, S: BoardSurface + ?Sized> {
    surface: &'a S,
    markers: &'a Markers,
    total_rows: usize,
}

impl<S: BoardSurface + ?Sized> Clone for BoardQuery<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: BoardSurface + ?Sized> Copy for BoardQuery<'_, S> {}

impl<'a, S: BoardSurface + ?Sized> BoardQuery<'a, S> {
    pub fn new(surface: &'a S, markers: &'a Markers, total_rows: usize) -> Self {
        BoardQuery {
            surface,
            markers,
            total_rows,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Pieces of `owner` in page row `row`.
    pub fn count(&self, row: usize, owner: Owner) -> Result<usize> {
        self.surface
            .query_count(&ElementQuery::in_row(row, self.markers.owner(owner)))
    }

    /// Pieces of `owner` anywhere on the board.
    pub fn count_all(&self, owner: Owner) -> Result<usize> {
        self.surface
            .query_count(&ElementQuery::anywhere(self.markers.owner(owner)))
    }

    pub fn counts(&self) -> Result<PieceCounts> {
        Ok(PieceCounts::new(
            self.count_all(Owner::Player)?,
            self.count_all(Owner::System)?,
        ))
    }

    /// Pieces of `owner` in `row`, in page order.
    pub fn find(&self, row: usize, owner: Owner) -> Result<Vec<PieceHandle>> {
        let handles = self
            .surface
            .query_all(&ElementQuery::in_row(row, self.markers.owner(owner)))?;
        Ok(handles
            .into_iter()
            .map(|handle| PieceHandle {
                handle,
                owner,
                query_row: row,
            })
            .collect())
    }

    /// Reachable cells in `row` whose descriptor contains `fragment`.
    pub fn find_reachable_cells(&self, row: usize, fragment: &str) -> Result<Vec<ElementHandle>> {
        let query = ElementQuery::in_row(row, &self.markers.reachable).with_fragment(fragment);
        self.surface.query_all(&query)
    }

    /// The reachable cell at `position`, if the page marks one there.
    pub fn reachable_cell(&self, position: Position) -> Result<Option<Cell>> {
        let Some(row) = codec::query_row_for(self.total_rows, position.row) else {
            return Ok(None);
        };
        let cells = self.find_reachable_cells(row, &codec::encode(position))?;
        debug!(%position, row, found = cells.len(), "probed reachable cell");
        Ok(cells.first().map(|&handle| Cell {
            handle,
            query_row: row,
            position,
        }))
    }

    /// The piece of `owner` at `position`, if present.
    pub fn piece_at(&self, owner: Owner, position: Position) -> Result<Option<Piece>> {
        let Some(row) = codec::query_row_for(self.total_rows, position.row) else {
            return Ok(None);
        };
        let query = ElementQuery::in_row(row, self.markers.owner(owner))
            .with_fragment(codec::encode(position));
        let handles = self.surface.query_all(&query)?;
        Ok(handles.first().map(|&handle| Piece {
            handle,
            owner,
            query_row: row,
            position,
        }))
    }

    /// Decode a piece's position and check it against the row it came from.
    pub fn read_position(&self, piece: &PieceHandle) -> Result<Position> {
        let descriptor = self
            .surface
            .read_attribute(piece.handle, DESCRIPTOR_ATTRIBUTE)?
            .ok_or(DriverError::MissingDescriptor {
                row: piece.query_row,
            })?;
        let position = codec::decode(&descriptor)?;

        if codec::game_row_for(self.total_rows, piece.query_row) != Some(position.row) {
            return Err(DriverError::InconsistentPosition {
                row: piece.query_row,
                position,
                expected_row: codec::query_row_for(self.total_rows, position.row).unwrap_or(0),
            });
        }
        Ok(position)
    }

    pub fn resolve(&self, piece: PieceHandle) -> Result<Piece> {
        let position = self.read_position(&piece)?;
        Ok(Piece {
            handle: piece.handle,
            owner: piece.owner,
            query_row: piece.query_row,
            position,
        })
    }
}
