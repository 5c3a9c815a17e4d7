use crate::board::Owner;
use crate::config::{LayoutConfig, Markers, WaitConfig};
use crate::error::{DriverError, Result};
use crate::query::BoardQuery;
use crate::surface::BoardSurface;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnOutcome {
    Acknowledged { attempts: u32 },
    TimedOut { attempts: u32, waited: Duration },
}

impl TurnOutcome {
    /// Poll attempts on success; a timeout becomes [`DriverError::TimedOut`].
    pub fn into_result(self) -> Result<u32> {
        match self {
            TurnOutcome::Acknowledged { attempts } => Ok(attempts),
            TurnOutcome::TimedOut { attempts, waited } => {
                Err(DriverError::TimedOut { attempts, waited })
            }
        }
    }
}

/// Waits for the opponent to answer a Player move.
///
/// There is no notification channel, so the waiter sleeps a fixed
/// interval and then checks that the opponent's pieces reconcile: pieces
/// that left the opponent's home rows, less the ones it lost, must equal
/// the pieces found outside those rows. A torn read (a piece mid-move, in
/// no row) fails that check and the waiter keeps polling.
pub struct TurnWaiter<'a> {
    wait: WaitConfig,
    layout: LayoutConfig,
    markers: &'a Markers,
}

impl<'a> TurnWaiter<'a> {
    pub fn new(wait: WaitConfig, layout: LayoutConfig, markers: &'a Markers) -> Self {
        TurnWaiter {
            wait,
            layout,
            markers,
        }
    }

    /// Poll until the board reconciles, `max_attempts` polls were spent or
    /// the next poll would end past `timeout`. A timeout shorter than the
    /// poll interval therefore never polls and always times out.
    pub fn await_opponent_reply<S: BoardSurface + ?Sized>(
        &self,
        surface: &mut S,
        total_rows: usize,
        timeout: Duration,
    ) -> Result<TurnOutcome> {
        let interval = self.wait.poll_interval();
        let mut waited = Duration::ZERO;
        let mut attempts = 0;

        while attempts < self.wait.max_attempts && waited + interval <= timeout {
            surface.wait_fixed_delay(interval)?;
            waited += interval;
            attempts += 1;

            let query = BoardQuery::new(&*surface, self.markers, total_rows);
            if self.reply_observed(&query)? {
                info!(attempts, ?waited, "System responded with a move");
                return Ok(TurnOutcome::Acknowledged { attempts });
            }
            debug!(attempts, "board does not reconcile yet");
        }

        warn!(attempts, ?waited, ?timeout, "System did not respond in time");
        Ok(TurnOutcome::TimedOut { attempts, waited })
    }

    fn reply_observed<S: BoardSurface + ?Sized>(&self, query: &BoardQuery<'_, S>) -> Result<bool> {
        let expected = self.layout.pieces_per_side();
        let total = query.count_all(Owner::System)?;
        if total < expected {
            warn!(lost = expected - total, "System lost pieces");
        }

        let home = self.layout.home_rows_of(Owner::System);
        let first_outside = *home.end() + 1;

        let mut left_home = 0i64;
        for row in home {
            left_home += self.layout.pieces_per_row as i64 - query.count(row, Owner::System)? as i64;
        }
        let moved = left_home - (expected as i64 - total as i64);

        let mut outside = 0i64;
        for row in first_outside..=query.total_rows() {
            outside += query.count(row, Owner::System)? as i64;
        }

        debug!(moved, outside, "reconciling System pieces");
        Ok(moved == outside)
    }
}
