// ── Derived lookup tables ──
//
// Two-axis tables built from the flat calibration arrays in the config
// block. Callers address cells with explicit (row, column) selectors; a
// missing cell is `None`, never a panic.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::model::ConfigSnapshot;

/// Rows every lookup table carries.
pub const ROWS: usize = 2;

/// Row selector for the flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RateClass {
    High,
    Low,
}

impl RateClass {
    pub fn row(self) -> usize {
        match self {
            Self::High => 0,
            Self::Low => 1,
        }
    }
}

/// Row selector for the tank table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TankLevel {
    /// Full-level calibration, from config.
    Full,
    /// Current reading, from the latest telemetry.
    Current,
}

impl TankLevel {
    pub fn row(self) -> usize {
        match self {
            Self::Full => 0,
            Self::Current => 1,
        }
    }
}

/// A 2×N table of optional numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupTable {
    rows: [Vec<Option<f64>>; ROWS],
}

impl LookupTable {
    pub fn new(row0: Vec<Option<f64>>, row1: Vec<Option<f64>>) -> Self {
        Self { rows: [row0, row1] }
    }

    /// Cell at `(row, col)`. Out-of-range coordinates and absent cells
    /// both yield `None`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row)?.get(col).copied().flatten()
    }

    pub fn row(&self, row: usize) -> &[Option<f64>] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace one row wholesale. Rows past the table's height are ignored.
    pub fn set_row(&mut self, row: usize, values: Vec<Option<f64>>) {
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = values;
        }
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }
}

/// Flow calibration table: row 0 is the high rate class, row 1 the low.
///
/// Width follows `high_flow_rates`. A short low row is padded with absent
/// cells and a long one is truncated, so both rows index the same valves.
pub fn build_flow_table(cfg: &ConfigSnapshot) -> LookupTable {
    let width = cfg.high_flow_rates.len();
    let mut low = cfg.low_flow_rates.clone();
    low.resize(width, None);
    LookupTable::new(cfg.high_flow_rates.clone(), low)
}

/// Tank table: row 0 from the full-level calibration. Row 1 is left empty
/// for telemetry to fill.
pub fn build_tank_table(cfg: &ConfigSnapshot) -> LookupTable {
    LookupTable::new(cfg.tank_full.clone(), Vec::new())
}
