use crate::board::{DEFAULT_TOTAL_ROWS, Owner};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Shape of the board at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub total_rows: usize,
    /// Rows each side occupies at game start.
    pub home_rows: usize,
    pub pieces_per_row: usize,
}

impl LayoutConfig {
    /// Pieces each side starts with.
    pub fn pieces_per_side(&self) -> usize {
        self.home_rows * self.pieces_per_row
    }

    /// Page rows (1-based, top-down) an owner starts in.
    pub fn home_rows_of(&self, owner: Owner) -> std::ops::RangeInclusive<usize> {
        match owner {
            Owner::System => 1..=self.home_rows,
            Owner::Player => (self.total_rows + 1 - self.home_rows)..=self.total_rows,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            total_rows: DEFAULT_TOTAL_ROWS,
            home_rows: 3,
            pieces_per_row: 4,
        }
    }
}

/// Substrings of an element's image source that identify what it shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub player: String,
    pub system: String,
    /// Empty cell that accepts a move.
    pub reachable: String,
}

impl Markers {
    pub fn owner(&self, owner: Owner) -> &str {
        match owner {
            Owner::Player => &self.player,
            Owner::System => &self.system,
        }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            player: "you1".to_string(),
            system: "me1".to_string(),
            reachable: "gray".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            poll_interval_ms: 500,
            max_attempts: 10,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Page row the first moves are played from.
    pub starting_row: usize,
    pub turns: usize,
    pub expected_title: String,
    /// Check piece conservation right after each executed move. Only
    /// meaningful when the opponent cannot reply before the next read.
    pub verify_conservation: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            starting_row: 6,
            turns: 5,
            expected_title: "Checkers".to_string(),
            verify_conservation: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub layout: LayoutConfig,
    pub markers: Markers,
    pub wait: WaitConfig,
    pub scenario: ScenarioConfig,
}

impl DriverConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
