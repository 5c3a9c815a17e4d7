use crate::board::{Owner, PieceCounts, Position};
use crate::config::LayoutConfig;
use crate::error::{DriverError, Result};
use crate::query::BoardQuery;
use crate::surface::BoardSurface;
use tracing::{debug, info};

/// Structural assertions over the live board. A violation is never
/// recoverable; it ends the scenario.
pub struct GameStateValidator<'a, S: BoardSurface + ?Sized> {
    query: BoardQuery<'a, S>,
    layout: &'a LayoutConfig,
}

impl<'a, S: BoardSurface + ?Sized> GameStateValidator<'a, S> {
    pub fn new(query: BoardQuery<'a, S>, layout: &'a LayoutConfig) -> Self {
        GameStateValidator { query, layout }
    }

    /// The opening position: `pieces_per_row` pieces in each home row of
    /// both sides, nothing in between, `pieces_per_side` per side.
    pub fn assert_default_layout(&self, total_rows: usize) -> Result<()> {
        if total_rows != self.layout.total_rows {
            return Err(DriverError::UnexpectedRowCount {
                expected: self.layout.total_rows,
                observed: total_rows,
            });
        }

        let expected = self.layout.pieces_per_side();
        let counts = self.snapshot()?;
        for owner in [Owner::Player, Owner::System] {
            check("board".to_string(), owner, expected, counts.of(owner))?;
        }

        for owner in [Owner::System, Owner::Player] {
            for row in self.layout.home_rows_of(owner) {
                self.assert_row_occupancy(row, owner, self.layout.pieces_per_row)?;
            }
        }

        let system_home = self.layout.home_rows_of(Owner::System);
        let player_home = self.layout.home_rows_of(Owner::Player);
        for row in (*system_home.end() + 1)..*player_home.start() {
            for owner in [Owner::Player, Owner::System] {
                self.assert_row_occupancy(row, owner, 0)?;
            }
        }

        info!("Game is set to default correctly");
        Ok(())
    }

    pub fn assert_row_occupancy(&self, row: usize, owner: Owner, expected: usize) -> Result<()> {
        let observed = self.query.count(row, owner)?;
        debug!(row, %owner, expected, observed, "row occupancy");
        check(format!("row {}", row), owner, expected, observed)
    }

    /// Exactly one `owner` piece sits at `position`.
    pub fn assert_piece_at(&self, owner: Owner, position: Position) -> Result<()> {
        let observed = usize::from(self.query.piece_at(owner, position)?.is_some());
        check(format!("cell {}", position), owner, 1, observed)
    }

    pub fn snapshot(&self) -> Result<PieceCounts> {
        self.query.counts()
    }

    /// Compare current totals with `before`: a capture removes exactly one
    /// System piece, any other move removes nothing. Player totals never
    /// change on the Player's own move. Returns the current totals.
    pub fn assert_conservation(&self, before: PieceCounts, captured: bool) -> Result<PieceCounts> {
        let after = self.snapshot()?;
        let (scope, expected_system) = if captured {
            ("after capture", before.system.saturating_sub(1))
        } else {
            ("after move", before.system)
        };
        check(scope.to_string(), Owner::Player, before.player, after.player)?;
        check(scope.to_string(), Owner::System, expected_system, after.system)?;
        Ok(after)
    }
}

/// The page title contains `expected`.
pub fn assert_title<S: BoardSurface + ?Sized>(surface: &S, expected: &str) -> Result<()> {
    let observed = surface.title()?;
    if !observed.contains(expected) {
        return Err(DriverError::UnexpectedTitle {
            expected: expected.to_string(),
            observed,
        });
    }
    info!(title = %observed, "Page title is valid");
    Ok(())
}

fn check(scope: String, owner: Owner, expected: usize, observed: usize) -> Result<()> {
    if expected != observed {
        return Err(DriverError::InvariantViolation {
            scope,
            owner,
            expected,
            observed,
        });
    }
    Ok(())
}
