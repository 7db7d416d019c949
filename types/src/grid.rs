//! Fixed grid geometry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest value on the board.
pub const GRID_LIMIT: u16 = 150;
/// Number of visual rows.
pub const GRID_ROWS: u16 = 10;
/// Number of visual columns; enough to hold every value in `GRID_ROWS` rows.
pub const GRID_COLUMNS: u16 = GRID_LIMIT.div_ceil(GRID_ROWS);

/// Identity of one board cell: an integer in `1..=GRID_LIMIT`.
///
/// Cells are laid out row-major, so `1` sits top-left and `GRID_COLUMNS + 1`
/// starts the second row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellValue(u16);

impl CellValue {
    /// Returns `None` for values outside the board.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value >= 1 && value <= GRID_LIMIT {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn row(self) -> u16 {
        (self.0 - 1) / GRID_COLUMNS
    }

    #[must_use]
    pub const fn column(self) -> u16 {
        (self.0 - 1) % GRID_COLUMNS
    }

    /// Every cell in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=GRID_LIMIT).map(Self)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
