//! Multiplication table selection and step generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{CellValue, GRID_LIMIT};

/// Largest selectable table.
pub const MAX_TABLE: u8 = 20;
/// Highest multiplier a run ever reaches.
pub const MAX_MULTIPLIER: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableBaseError {
    #[error("table selection {0:?} is not a number")]
    NotANumber(String),
    #[error("table {0} is out of range (1..={max})", max = MAX_TABLE)]
    OutOfRange(i64),
}

/// The multiplication table being played, always in `1..=MAX_TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TableBase(u8);

impl TableBase {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(MAX_TABLE);

    pub fn new(value: i64) -> Result<Self, TableBaseError> {
        if (1..=i64::from(MAX_TABLE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TableBaseError::OutOfRange(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every selectable table in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MAX_TABLE).map(Self)
    }

    /// The following table, saturating at `MAX_TABLE`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1).min(MAX_TABLE))
    }

    /// The preceding table, saturating at 1.
    #[must_use]
    pub fn prev(self) -> Self {
        Self(self.0.saturating_sub(1).max(1))
    }

    /// Steps visited by a run of this table.
    ///
    /// Multipliers start at 1 and stop at `MAX_MULTIPLIER` or just before the
    /// first product that would leave the board, whichever comes first.
    #[must_use]
    pub fn steps(self) -> Vec<TableStep> {
        let base = u16::from(self.0);
        (1..=MAX_MULTIPLIER)
            .map(|multiplier| TableStep {
                multiplier,
                product: base * u16::from(multiplier),
            })
            .take_while(|step| step.product <= GRID_LIMIT)
            .collect()
    }
}

impl Default for TableBase {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<i64> for TableBase {
    type Error = TableBaseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableBase> for i64 {
    fn from(value: TableBase) -> Self {
        i64::from(value.0)
    }
}

impl FromStr for TableBase {
    type Err = TableBaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| TableBaseError::NotANumber(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for TableBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One hop of a run: `base * multiplier = product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStep {
    pub multiplier: u8,
    pub product: u16,
}

impl TableStep {
    /// Board cell the marker lands on, if the product is on the board.
    #[must_use]
    pub fn cell(self) -> Option<CellValue> {
        CellValue::new(self.product)
    }

    /// Product display text, e.g. `7 x 3 = 21`.
    #[must_use]
    pub fn equation(self, base: TableBase) -> String {
        format!("{base} x {} = {}", self.multiplier, self.product)
    }
}
