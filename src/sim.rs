//! In-memory checkers page.
//!
//! Renders the same element structure the driver expects from the real
//! page: one row per game row, an image source per cell (`you1.gif`,
//! `me1.gif`, `gray.gif` for empty playable cells, `black.gif` for the
//! others) and a `didClick(column, row)` descriptor on every playable
//! cell. A built-in opponent answers each Player move.
//!
//! Not a rules engine: no kings, no multi-jumps, no forced captures for
//! the Player side.

use crate::board::{DEFAULT_TOTAL_ROWS, ElementHandle, Owner, PieceCounts, Position};
use crate::codec;
use crate::config::Markers;
use crate::error::{DriverError, Result};
use crate::surface::{BoardSurface, DESCRIPTOR_ATTRIBUTE, ElementQuery, SRC_ATTRIBUTE};
use std::time::Duration;
use tracing::debug;

const HOME_ROWS: usize = 3;
const LIGHT_SRC: &str = "black.gif";

/// When the simulated opponent's reply becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTiming {
    /// Applied as part of the Player's move.
    Immediate,
    /// The moving piece is lifted off its row and lands after this many
    /// waits. Whole-board queries still see it in the meantime.
    AfterWaits(u32),
    /// The piece is lifted and never lands.
    Never,
}

#[derive(Debug, Clone, Copy)]
struct Reply {
    from: Position,
    to: Position,
    captured: Option<Position>,
}

#[derive(Debug, Clone, Copy)]
struct PendingReply {
    reply: Reply,
    remaining: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    size: usize,
    /// Indexed `[game_row][column]`; game row 0 is the bottom page row.
    cells: Vec<Vec<Option<Owner>>>,
    markers: Markers,
    timing: ReplyTiming,
    selected: Option<Position>,
    pending: Option<PendingReply>,
    waited: Duration,
    title: String,
}

impl SimulatedBoard {
    /// Standard 8-row board, opponent replying on the first wait.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_TOTAL_ROWS)
    }

    pub fn with_size(size: usize) -> Self {
        let mut board = SimulatedBoard {
            size,
            cells: vec![vec![None; size]; size],
            markers: Markers::default(),
            timing: ReplyTiming::AfterWaits(1),
            selected: None,
            pending: None,
            waited: Duration::ZERO,
            title: "Checkers - Simulated".to_string(),
        };
        board.setup_default();
        board
    }

    /// Build a board from text, top page row first. `P` is a Player
    /// piece, `S` a System piece, `.` or `-` an empty cell. Whitespace is
    /// ignored. Pieces may only sit on playable cells.
    pub fn from_layout(layout: &str) -> Result<Self> {
        let lines: Vec<Vec<char>> = layout
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|line| !line.is_empty())
            .collect();

        let size = lines.len();
        let mut board = Self::with_size(size);
        board.cells = vec![vec![None; size]; size];

        for (index, line) in lines.iter().enumerate() {
            if line.len() != size {
                return Err(DriverError::Surface(format!(
                    "layout row {} has {} cells, expected {}",
                    index + 1,
                    line.len(),
                    size
                )));
            }
            let game_row = size - 1 - index;
            for (column, ch) in line.iter().enumerate() {
                let owner = match ch {
                    'P' => Some(Owner::Player),
                    'S' => Some(Owner::System),
                    '.' | '-' => None,
                    other => {
                        return Err(DriverError::Surface(format!(
                            "unknown layout cell {:?} in row {}",
                            other,
                            index + 1
                        )));
                    }
                };
                if owner.is_some() && !is_playable(game_row, column) {
                    return Err(DriverError::Surface(format!(
                        "piece on unplayable cell ({}, {})",
                        column, game_row
                    )));
                }
                board.cells[game_row][column] = owner;
            }
        }

        Ok(board)
    }

    pub fn with_reply_timing(mut self, timing: ReplyTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    fn setup_default(&mut self) {
        let size = self.size;
        for (game_row, row) in self.cells.iter_mut().enumerate() {
            for (column, cell) in row.iter_mut().enumerate() {
                *cell = if !is_playable(game_row, column) {
                    None
                } else if game_row < HOME_ROWS {
                    Some(Owner::Player)
                } else if game_row + HOME_ROWS >= size {
                    Some(Owner::System)
                } else {
                    None
                };
            }
        }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Owner> {
        self.index(pos).and_then(|(row, col)| self.cells[row][col])
    }

    /// Piece totals including a lifted opponent piece.
    pub fn counts(&self) -> PieceCounts {
        let mut counts = PieceCounts::default();
        for owner in self.cells.iter().flatten().flatten() {
            match owner {
                Owner::Player => counts.player += 1,
                Owner::System => counts.system += 1,
            }
        }
        if self.pending.is_some() {
            counts.system += 1;
        }
        counts
    }

    pub fn reply_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total time spent in `wait_fixed_delay`.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Text rendering in the `from_layout` format.
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        for game_row in (0..self.size).rev() {
            for column in 0..self.size {
                let c = match self.cells[game_row][column] {
                    Some(Owner::Player) => 'P',
                    Some(Owner::System) => 'S',
                    None if is_playable(game_row, column) => '.',
                    None => '-',
                };
                result.push(c);
            }
            result.push('\n');
        }
        result
    }

    fn index(&self, pos: Position) -> Option<(usize, usize)> {
        let row = usize::try_from(pos.row).ok()?;
        let col = usize::try_from(pos.column).ok()?;
        (row < self.size && col < self.size).then_some((row, col))
    }

    fn set(&mut self, pos: Position, owner: Option<Owner>) {
        if let Some((row, col)) = self.index(pos) {
            self.cells[row][col] = owner;
        }
    }

    fn lifted_handle(&self) -> ElementHandle {
        ElementHandle::new((self.size * self.size) as u64)
    }

    fn handle_of(&self, game_row: usize, column: usize) -> ElementHandle {
        ElementHandle::new((game_row * self.size + column) as u64)
    }

    fn cell_of(&self, handle: ElementHandle) -> Option<(usize, usize)> {
        let id = usize::try_from(handle.id()).ok()?;
        (id < self.size * self.size).then(|| (id / self.size, id % self.size))
    }

    fn owner_src(&self, owner: Owner) -> String {
        format!("{}.gif", self.markers.owner(owner))
    }

    fn render(&self, game_row: usize, column: usize) -> (String, Option<String>) {
        if !is_playable(game_row, column) {
            return (LIGHT_SRC.to_string(), None);
        }
        let src = match self.cells[game_row][column] {
            Some(owner) => self.owner_src(owner),
            None => format!("{}.gif", self.markers.reachable),
        };
        let pos = Position::new(column as i32, game_row as i32);
        (src, Some(codec::descriptor(pos)))
    }

    fn render_lifted(&self) -> Option<(String, String)> {
        self.pending
            .map(|p| (self.owner_src(Owner::System), codec::descriptor(p.reply.from)))
    }

    fn try_player_move(&mut self, from: Position, to: Position) {
        let rows = to.row - from.row;
        let columns = to.column - from.column;

        let captured = if rows == 1 && columns.abs() == 1 {
            None
        } else if rows == 2 && columns.abs() == 2 {
            let middle = from.offset(columns / 2, 1);
            if self.piece_at(middle) != Some(Owner::System) {
                return;
            }
            Some(middle)
        } else {
            return;
        };

        if let Some(middle) = captured {
            self.set(middle, None);
        }
        self.set(from, None);
        self.set(to, Some(Owner::Player));
        debug!(%from, %to, capture = captured.is_some(), "simulated player move");

        self.begin_reply();
    }

    fn begin_reply(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.land(pending.reply);
        }
        let Some(reply) = self.choose_reply() else {
            debug!("simulated opponent has no move");
            return;
        };

        let remaining = match self.timing {
            ReplyTiming::Immediate | ReplyTiming::AfterWaits(0) => {
                self.land(reply);
                return;
            }
            ReplyTiming::AfterWaits(waits) => Some(waits),
            ReplyTiming::Never => None,
        };
        self.set(reply.from, None);
        self.pending = Some(PendingReply { reply, remaining });
    }

    fn land(&mut self, reply: Reply) {
        if let Some(captured) = reply.captured {
            self.set(captured, None);
        }
        self.set(reply.from, None);
        self.set(reply.to, Some(Owner::System));
        debug!(from = %reply.from, to = %reply.to, "simulated opponent reply");
    }

    /// First capture scanning top-down and left to right, otherwise the
    /// first simple move in the same order.
    fn choose_reply(&self) -> Option<Reply> {
        let pieces: Vec<Position> = (0..self.size)
            .rev()
            .flat_map(|row| (0..self.size).map(move |col| Position::new(col as i32, row as i32)))
            .filter(|&pos| self.piece_at(pos) == Some(Owner::System))
            .collect();

        for &from in &pieces {
            for step in [-1, 1] {
                let over = from.offset(step, -1);
                let to = from.offset(2 * step, -2);
                if self.piece_at(over) == Some(Owner::Player)
                    && self.index(to).is_some()
                    && self.piece_at(to).is_none()
                {
                    return Some(Reply {
                        from,
                        to,
                        captured: Some(over),
                    });
                }
            }
        }

        for &from in &pieces {
            for step in [-1, 1] {
                let to = from.offset(step, -1);
                if self.index(to).is_some() && self.piece_at(to).is_none() {
                    return Some(Reply {
                        from,
                        to,
                        captured: None,
                    });
                }
            }
        }

        None
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardSurface for SimulatedBoard {
    fn query_all(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>> {
        let rows: Vec<usize> = match query.row {
            Some(row) if (1..=self.size).contains(&row) => vec![row],
            Some(_) => Vec::new(),
            None => (1..=self.size).collect(),
        };

        let mut found = Vec::new();
        for row in rows {
            let game_row = self.size - row;
            for column in 0..self.size {
                let (src, descriptor) = self.render(game_row, column);
                if query.matches(&src, descriptor.as_deref()) {
                    found.push(self.handle_of(game_row, column));
                }
            }
        }

        if query.row.is_none() {
            if let Some((src, descriptor)) = self.render_lifted() {
                if query.matches(&src, Some(descriptor.as_str())) {
                    found.push(self.lifted_handle());
                }
            }
        }

        Ok(found)
    }

    fn read_attribute(&self, handle: ElementHandle, name: &str) -> Result<Option<String>> {
        let (src, descriptor) = if handle == self.lifted_handle() {
            match self.render_lifted() {
                Some((src, descriptor)) => (src, Some(descriptor)),
                None => return Err(DriverError::Surface(format!("stale element {:?}", handle))),
            }
        } else {
            let (row, col) = self
                .cell_of(handle)
                .ok_or_else(|| DriverError::Surface(format!("unknown element {:?}", handle)))?;
            self.render(row, col)
        };

        Ok(match name {
            SRC_ATTRIBUTE => Some(src),
            DESCRIPTOR_ATTRIBUTE => descriptor,
            _ => None,
        })
    }

    fn activate(&mut self, handle: ElementHandle) -> Result<()> {
        let Some((row, col)) = self.cell_of(handle) else {
            self.selected = None;
            return Ok(());
        };
        let pos = Position::new(col as i32, row as i32);

        let occupant = self.cells[row][col];
        match occupant {
            Some(Owner::Player) => self.selected = Some(pos),
            None if is_playable(row, col) => {
                if let Some(from) = self.selected.take() {
                    self.try_player_move(from, pos);
                }
            }
            _ => self.selected = None,
        }
        Ok(())
    }

    fn wait_fixed_delay(&mut self, delay: Duration) -> Result<()> {
        self.waited += delay;
        if let Some(mut pending) = self.pending.take() {
            match pending.remaining.as_mut() {
                Some(remaining) => {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        self.land(pending.reply);
                    } else {
                        self.pending = Some(pending);
                    }
                }
                None => self.pending = Some(pending),
            }
        }
        Ok(())
    }

    fn row_count(&self) -> Result<usize> {
        Ok(self.size)
    }

    fn restart(&mut self) -> Result<()> {
        self.selected = None;
        self.pending = None;
        self.setup_default();
        Ok(())
    }

    fn title(&self) -> Result<String> {
        Ok(self.title.clone())
    }
}

fn is_playable(game_row: usize, column: usize) -> bool {
    (game_row + column) % 2 == 0
}
