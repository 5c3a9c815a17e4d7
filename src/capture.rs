use crate::board::{Cell, Owner, Piece, Position};
use crate::error::Result;
use crate::query::BoardQuery;
use crate::surface::BoardSurface;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which page row holds the opponent pieces worth inspecting, relative to
/// the Player's front row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureScan {
    /// The row just ahead of the front (one page row up).
    RowAhead,
    /// The front row itself.
    SameRow,
}

impl CaptureScan {
    pub fn inspected_row(&self, front_row: usize) -> Option<usize> {
        match self {
            CaptureScan::RowAhead => front_row.checked_sub(1).filter(|&row| row >= 1),
            CaptureScan::SameRow => Some(front_row),
        }
    }
}

/// Side a jump comes from, as seen on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpSide {
    Right,
    Left,
}

/// A jump geometry around a victim: where the jumper must stand and where
/// it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpCandidate {
    pub side: JumpSide,
    pub jumper: Position,
    pub landing: Position,
}

/// Both jumps over `victim`, right side first.
pub fn jump_candidates(victim: Position) -> [JumpCandidate; 2] {
    [
        JumpCandidate {
            side: JumpSide::Right,
            jumper: victim.offset(1, -1),
            landing: victim.offset(-1, 1),
        },
        JumpCandidate {
            side: JumpSide::Left,
            jumper: victim.offset(-1, -1),
            landing: victim.offset(1, 1),
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureMove {
    pub jumper: Piece,
    pub victim: Piece,
    pub landing: Cell,
    pub side: JumpSide,
}

impl CaptureMove {
    /// Click the jumper, then the landing cell. The page removes the
    /// victim on its own.
    pub fn execute<S: BoardSurface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        surface.activate(self.jumper.handle)?;
        surface.activate(self.landing.handle)
    }
}

impl fmt::Display for CaptureMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} -> {}",
            self.jumper.position, self.victim.position, self.landing.position
        )
    }
}

pub struct CaptureDetector<'a, S: BoardSurface + ?Sized> {
    query: BoardQuery<'a, S>,
}

impl<'a, S: BoardSurface + ?Sized> CaptureDetector<'a, S> {
    pub fn new(query: BoardQuery<'a, S>) -> Self {
        CaptureDetector { query }
    }

    /// First available jump over a System piece in the inspected row.
    ///
    /// Victims are tried in page order; for each one the right-side jump is
    /// tried before the left-side one. A jump needs a reachable landing
    /// cell and a Player piece on the matching jump-off cell.
    pub fn detect_capture(&self, front_row: usize, scan: CaptureScan) -> Result<Option<CaptureMove>> {
        let Some(row) = scan.inspected_row(front_row) else {
            return Ok(None);
        };

        let victims = self.query.find(row, Owner::System)?;
        if victims.is_empty() {
            debug!(row, ?scan, "no System piece to capture");
            return Ok(None);
        }

        for handle in victims {
            let victim = self.query.resolve(handle)?;
            for candidate in jump_candidates(victim.position) {
                let Some(landing) = self.query.reachable_cell(candidate.landing)? else {
                    continue;
                };
                let Some(jumper) = self.query.piece_at(Owner::Player, candidate.jumper)? else {
                    debug!(
                        victim = %victim.position,
                        side = ?candidate.side,
                        "landing free but no jumper"
                    );
                    continue;
                };
                debug!(
                    jumper = %jumper.position,
                    victim = %victim.position,
                    landing = %landing.position,
                    side = ?candidate.side,
                    "capture available"
                );
                return Ok(Some(CaptureMove {
                    jumper,
                    victim,
                    landing,
                    side: candidate.side,
                }));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceCounts;
    use crate::config::Markers;
    use crate::sim::{ReplyTiming, SimulatedBoard};

    /// Default opening with the System piece from (3, 5) advanced to (3, 3).
    const EXPOSED_VICTIM: &str = "\
        -S-S-S-S\n\
        S-S-S-S-\n\
        -S-.-S-S\n\
        .-.-.-.-\n\
        -.-S-.-.\n\
        P-P-P-P-\n\
        -P-P-P-P\n\
        P-P-P-P-\n";

    #[test]
    fn test_jump_geometry() {
        let [right, left] = jump_candidates(Position::new(3, 3));
        assert_eq!(right.side, JumpSide::Right);
        assert_eq!(right.jumper, Position::new(4, 2));
        assert_eq!(right.landing, Position::new(2, 4));
        assert_eq!(left.jumper, Position::new(2, 2));
        assert_eq!(left.landing, Position::new(4, 4));
    }

    #[test]
    fn test_inspected_row() {
        assert_eq!(CaptureScan::RowAhead.inspected_row(6), Some(5));
        assert_eq!(CaptureScan::SameRow.inspected_row(6), Some(6));
        assert_eq!(CaptureScan::RowAhead.inspected_row(1), None);
    }

    #[test]
    fn test_right_side_wins_when_both_jumps_exist() {
        let board = SimulatedBoard::from_layout(EXPOSED_VICTIM).unwrap();
        let markers = Markers::default();
        let detector = CaptureDetector::new(BoardQuery::new(&board, &markers, 8));

        for _ in 0..3 {
            let capture = detector
                .detect_capture(6, CaptureScan::RowAhead)
                .unwrap()
                .unwrap();
            assert_eq!(capture.side, JumpSide::Right);
            assert_eq!(capture.jumper.position, Position::new(4, 2));
            assert_eq!(capture.victim.position, Position::new(3, 3));
            assert_eq!(capture.landing.position, Position::new(2, 4));
            assert_eq!(capture.to_string(), "(4, 2) x (3, 3) -> (2, 4)");
        }
    }

    #[test]
    fn test_left_side_when_right_jumper_missing() {
        let board = SimulatedBoard::from_layout(
            "\
            -S-S-S-S\n\
            S-S-S-S-\n\
            -S-.-S-S\n\
            .-.-.-.-\n\
            -.-S-.-.\n\
            P-P-.-P-\n\
            -P-P-P-P\n\
            P-P-P-P-\n",
        )
        .unwrap();
        let markers = Markers::default();
        let detector = CaptureDetector::new(BoardQuery::new(&board, &markers, 8));

        let capture = detector
            .detect_capture(6, CaptureScan::RowAhead)
            .unwrap()
            .unwrap();
        assert_eq!(capture.side, JumpSide::Left);
        assert_eq!(capture.jumper.position, Position::new(2, 2));
        assert_eq!(capture.landing.position, Position::new(4, 4));
    }

    #[test]
    fn test_no_capture_without_victims() {
        let board = SimulatedBoard::new();
        let markers = Markers::default();
        let detector = CaptureDetector::new(BoardQuery::new(&board, &markers, 8));

        assert!(detector.detect_capture(6, CaptureScan::RowAhead).unwrap().is_none());
        assert!(detector.detect_capture(6, CaptureScan::SameRow).unwrap().is_none());
    }

    #[test]
    fn test_no_capture_when_landing_occupied() {
        // Victim at (3, 3) with both landings (2, 4) and (4, 4) taken.
        let board = SimulatedBoard::from_layout(
            "\
            -S-S-S-S\n\
            S-S-S-S-\n\
            -S-.-.-S\n\
            .-S-S-.-\n\
            -.-S-.-.\n\
            P-P-P-P-\n\
            -P-P-P-P\n\
            P-P-.-.-\n",
        )
        .unwrap();
        let markers = Markers::default();
        let detector = CaptureDetector::new(BoardQuery::new(&board, &markers, 8));

        assert!(detector.detect_capture(6, CaptureScan::RowAhead).unwrap().is_none());
    }

    #[test]
    fn test_executed_capture_removes_one_system_piece() {
        let mut board = SimulatedBoard::from_layout(EXPOSED_VICTIM)
            .unwrap()
            .with_reply_timing(ReplyTiming::Never);
        let markers = Markers::default();
        let capture = CaptureDetector::new(BoardQuery::new(&board, &markers, 8))
            .detect_capture(6, CaptureScan::RowAhead)
            .unwrap()
            .unwrap();

        assert_eq!(
            BoardQuery::new(&board, &markers, 8).counts().unwrap(),
            PieceCounts::new(12, 12)
        );
        capture.execute(&mut board).unwrap();

        let query = BoardQuery::new(&board, &markers, 8);
        assert_eq!(query.counts().unwrap(), PieceCounts::new(12, 11));
        assert!(query
            .piece_at(Owner::Player, Position::new(2, 4))
            .unwrap()
            .is_some());
        assert!(query
            .piece_at(Owner::System, Position::new(3, 3))
            .unwrap()
            .is_none());
    }
}
