use crate::board::{Owner, PieceCounts, Position};
use crate::capture::{CaptureDetector, CaptureScan};
use crate::config::DriverConfig;
use crate::error::Result;
use crate::query::BoardQuery;
use crate::selector::MoveSelector;
use crate::surface::BoardSurface;
use crate::validator::{GameStateValidator, assert_title};
use crate::waiter::TurnWaiter;
use serde::Serialize;
use tracing::info;

/// What the scripted opening does on a given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnPlan {
    /// Move the first Player piece of `row` forward.
    Advance { row: usize },
    /// Jump if `scan` finds a victim, otherwise advance from `fallback_row`.
    CaptureOrAdvance { scan: CaptureScan, fallback_row: usize },
}

/// The opening sequence: two plain advances from the starting row, then a
/// capture check one row ahead, then capture checks on the starting row
/// with advances from the row ahead.
pub fn plan_for_turn(turn: usize, starting_row: usize) -> TurnPlan {
    match turn {
        0..=2 => TurnPlan::Advance { row: starting_row },
        3 => TurnPlan::CaptureOrAdvance {
            scan: CaptureScan::RowAhead,
            fallback_row: starting_row,
        },
        _ => TurnPlan::CaptureOrAdvance {
            scan: CaptureScan::SameRow,
            fallback_row: starting_row.saturating_sub(1),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnAction {
    Advance {
        from: Position,
        to: Position,
    },
    Capture {
        jumper: Position,
        victim: Position,
        landing: Position,
    },
}

impl TurnAction {
    pub fn is_capture(&self) -> bool {
        matches!(self, TurnAction::Capture { .. })
    }

    /// Where the Player piece ends up.
    pub fn destination(&self) -> Position {
        match self {
            TurnAction::Advance { to, .. } => *to,
            TurnAction::Capture { landing, .. } => *landing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub turn: usize,
    pub action: TurnAction,
    /// Totals right after the Player's move, before the reply.
    pub counts_after_move: PieceCounts,
    pub poll_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub total_rows: usize,
    pub turns: Vec<TurnRecord>,
    /// Totals after the last reply, before the restart.
    pub final_counts: PieceCounts,
}

impl ScenarioReport {
    pub fn captures(&self) -> usize {
        self.turns.iter().filter(|t| t.action.is_capture()).count()
    }
}

/// Plays the scripted opening against a live board: validate, then per
/// turn decide, execute and wait, then restart and validate again.
pub struct ScenarioRunner<'a, S: BoardSurface + ?Sized> {
    surface: &'a mut S,
    config: DriverConfig,
}

impl<'a, S: BoardSurface + ?Sized> ScenarioRunner<'a, S> {
    pub fn new(surface: &'a mut S, config: DriverConfig) -> Self {
        ScenarioRunner { surface, config }
    }

    pub fn play(&mut self) -> Result<ScenarioReport> {
        assert_title(&*self.surface, &self.config.scenario.expected_title)?;

        let total_rows = self.surface.row_count()?;
        info!(total_rows, "Board found");
        self.validator(total_rows).assert_default_layout(total_rows)?;

        let mut turns = Vec::with_capacity(self.config.scenario.turns);
        for turn in 1..=self.config.scenario.turns {
            turns.push(self.play_turn(turn, total_rows)?);
        }

        let final_counts = self.query(total_rows).counts()?;
        info!(%final_counts, "Opening finished, restarting");

        self.surface.restart()?;
        self.validator(total_rows).assert_default_layout(total_rows)?;
        info!("All checks passed successfully");

        Ok(ScenarioReport {
            total_rows,
            turns,
            final_counts,
        })
    }

    fn play_turn(&mut self, turn: usize, total_rows: usize) -> Result<TurnRecord> {
        let starting_row = self.config.scenario.starting_row;
        let plan = plan_for_turn(turn, starting_row);
        info!(turn, ?plan, "Current move");

        let before = self.query(total_rows).counts()?;

        let action = match plan {
            TurnPlan::Advance { row } => self.advance(row, total_rows)?,
            TurnPlan::CaptureOrAdvance { scan, fallback_row } => {
                let capture =
                    CaptureDetector::new(self.query(total_rows)).detect_capture(starting_row, scan)?;
                match capture {
                    Some(capture) => {
                        capture.execute(self.surface)?;
                        info!(%capture, "Captured System piece");
                        TurnAction::Capture {
                            jumper: capture.jumper.position,
                            victim: capture.victim.position,
                            landing: capture.landing.position,
                        }
                    }
                    None => self.advance(fallback_row, total_rows)?,
                }
            }
        };

        let counts_after_move = if self.config.scenario.verify_conservation {
            let validator = self.validator(total_rows);
            let after = validator.assert_conservation(before, action.is_capture())?;
            validator.assert_piece_at(Owner::Player, action.destination())?;
            after
        } else {
            self.query(total_rows).counts()?
        };

        let waiter = TurnWaiter::new(
            self.config.wait,
            self.config.layout,
            &self.config.markers,
        );
        let poll_attempts = waiter
            .await_opponent_reply(self.surface, total_rows, self.config.wait.timeout())?
            .into_result()?;

        Ok(TurnRecord {
            turn,
            action,
            counts_after_move,
            poll_attempts,
        })
    }

    fn advance(&mut self, row: usize, total_rows: usize) -> Result<TurnAction> {
        let mv = MoveSelector::new(self.query(total_rows)).require_move(row)?;
        mv.execute(self.surface)?;
        info!(%mv, row, "Moved Player piece");
        Ok(TurnAction::Advance {
            from: mv.source.position,
            to: mv.target.position,
        })
    }

    fn query(&self, total_rows: usize) -> BoardQuery<'_, S> {
        BoardQuery::new(&*self.surface, &self.config.markers, total_rows)
    }

    fn validator(&self, total_rows: usize) -> GameStateValidator<'_, S> {
        GameStateValidator::new(self.query(total_rows), &self.config.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::sim::{ReplyTiming, SimulatedBoard};

    fn advance(from: (i32, i32), to: (i32, i32)) -> TurnAction {
        TurnAction::Advance {
            from: Position::new(from.0, from.1),
            to: Position::new(to.0, to.1),
        }
    }

    #[test]
    fn test_turn_plans() {
        assert_eq!(plan_for_turn(1, 6), TurnPlan::Advance { row: 6 });
        assert_eq!(plan_for_turn(2, 6), TurnPlan::Advance { row: 6 });
        assert_eq!(
            plan_for_turn(3, 6),
            TurnPlan::CaptureOrAdvance {
                scan: CaptureScan::RowAhead,
                fallback_row: 6
            }
        );
        for turn in [4, 5, 9] {
            assert_eq!(
                plan_for_turn(turn, 6),
                TurnPlan::CaptureOrAdvance {
                    scan: CaptureScan::SameRow,
                    fallback_row: 5
                }
            );
        }
    }

    #[test]
    fn test_full_opening_against_simulated_board() {
        let mut board = SimulatedBoard::new();
        let report = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap();

        let actions: Vec<TurnAction> = report.turns.iter().map(|t| t.action).collect();
        assert_eq!(
            actions,
            vec![
                advance((0, 2), (1, 3)),
                advance((2, 2), (3, 3)),
                advance((4, 2), (5, 3)),
                TurnAction::Capture {
                    jumper: Position::new(3, 1),
                    victim: Position::new(2, 2),
                    landing: Position::new(1, 3),
                },
                advance((1, 3), (2, 4)),
            ]
        );
        assert_eq!(report.captures(), 1);
        assert_eq!(report.turns[3].counts_after_move, PieceCounts::new(11, 11));
        assert!(report.turns.iter().all(|t| t.poll_attempts == 1));
        assert_eq!(report.final_counts, PieceCounts::new(10, 11));

        // Restarted at the end.
        assert_eq!(board.display_board(), SimulatedBoard::new().display_board());
    }

    #[test]
    fn test_first_move_from_front_row_keeps_counts() {
        let mut board = SimulatedBoard::new();
        let mut config = DriverConfig::default();
        config.scenario.turns = 1;

        let report = ScenarioRunner::new(&mut board, config).play().unwrap();
        assert_eq!(report.turns.len(), 1);
        assert_eq!(report.turns[0].counts_after_move, PieceCounts::new(12, 12));
        assert_eq!(report.turns[0].action.destination(), Position::new(1, 3));
    }

    #[test]
    fn test_report_serializes() {
        let mut board = SimulatedBoard::new();
        let report = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["turns"].as_array().unwrap().len(), 5);
        assert_eq!(json["turns"][3]["action"]["kind"], "capture");
        assert_eq!(json["turns"][0]["action"]["kind"], "advance");
        assert_eq!(json["final_counts"]["system"], 11);
    }

    #[test]
    fn test_blocked_starting_row_is_fatal() {
        let mut board = SimulatedBoard::new();
        let mut config = DriverConfig::default();
        config.scenario.starting_row = 7;

        let err = ScenarioRunner::new(&mut board, config).play().unwrap_err();
        assert!(matches!(err, DriverError::NoLegalMove { row: 7, .. }));
    }

    #[test]
    fn test_silent_opponent_is_fatal() {
        let mut board = SimulatedBoard::new().with_reply_timing(ReplyTiming::Never);
        let err = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap_err();
        assert!(matches!(err, DriverError::TimedOut { attempts: 10, .. }));
    }

    #[test]
    fn test_slow_opponent_within_deadline() {
        let mut board = SimulatedBoard::new().with_reply_timing(ReplyTiming::AfterWaits(2));
        let report = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap();
        assert!(report.turns.iter().all(|t| t.poll_attempts == 2));
    }

    #[test]
    fn test_wrong_page_is_rejected_before_moving() {
        let mut board = SimulatedBoard::new().with_title("Chess");
        let err = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap_err();
        assert!(matches!(err, DriverError::UnexpectedTitle { .. }));
        assert_eq!(board.waited(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_non_default_start_is_rejected() {
        let mut board = SimulatedBoard::with_size(10);
        let err = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::UnexpectedRowCount {
                expected: 8,
                observed: 10
            }
        ));
    }

    #[test]
    fn test_instant_reply_breaks_conservation_check() {
        // The opponent's capture on turn 2 lands before the post-move read.
        let mut board = SimulatedBoard::new().with_reply_timing(ReplyTiming::Immediate);
        let err = ScenarioRunner::new(&mut board, DriverConfig::default())
            .play()
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::InvariantViolation {
                owner: Owner::Player,
                expected: 12,
                observed: 11,
                ..
            }
        ));

        let mut board = SimulatedBoard::new().with_reply_timing(ReplyTiming::Immediate);
        let mut config = DriverConfig::default();
        config.scenario.verify_conservation = false;
        let report = ScenarioRunner::new(&mut board, config).play().unwrap();
        assert_eq!(report.captures(), 1);
    }
}
