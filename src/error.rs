use crate::board::{Owner, Position};
use std::time::Duration;
use thiserror::Error;

/// Every failure the driver can surface. All of them end the scenario;
/// nothing in the crate retries on its own.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Malformed descriptor: {descriptor:?}")]
    MalformedDescriptor { descriptor: String },
    #[error("Piece in row {row} has no descriptor")]
    MissingDescriptor { row: usize },
    #[error("Piece queried from row {row} decodes to {position}, which belongs in row {expected_row}")]
    InconsistentPosition {
        row: usize,
        position: Position,
        expected_row: usize,
    },
    #[error("No legal move from row {row}: {reason}")]
    NoLegalMove { row: usize, reason: String },
    #[error("Invariant violated at {scope}: expected {expected} {owner} pieces, observed {observed}")]
    InvariantViolation {
        scope: String,
        owner: Owner,
        expected: usize,
        observed: usize,
    },
    #[error("Board has {observed} rows, expected {expected}")]
    UnexpectedRowCount { expected: usize, observed: usize },
    #[error("Page title {observed:?} does not contain {expected:?}")]
    UnexpectedTitle { expected: String, observed: String },
    #[error("Opponent did not reply after {attempts} polls ({waited:?})")]
    TimedOut { attempts: u32, waited: Duration },
    #[error("Board surface error: {0}")]
    Surface(String),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;
