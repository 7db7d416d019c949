//! The numbered grid.

use std::collections::BTreeSet;

use hopscotch_types::CellValue;

/// One numbered cell and its styling flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    value: CellValue,
    visited: bool,
    active: bool,
}

impl Cell {
    #[must_use]
    pub fn value(&self) -> CellValue {
        self.value
    }

    /// Touched during the current run.
    #[must_use]
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// Where the marker currently rests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// All `GRID_LIMIT` cells plus the visited set and the active cell.
#[derive(Debug, Clone)]
pub struct Board {
    /// Indexed by `value - 1`.
    cells: Vec<Cell>,
    visited: BTreeSet<CellValue>,
    active: Option<CellValue>,
}

impl Board {
    #[must_use]
    pub fn build() -> Self {
        let cells = CellValue::all()
            .map(|value| Cell {
                value,
                visited: false,
                active: false,
            })
            .collect();
        Self {
            cells,
            visited: BTreeSet::new(),
            active: None,
        }
    }

    #[must_use]
    pub fn cell(&self, value: CellValue) -> Option<&Cell> {
        self.cells.get(usize::from(value.get()) - 1)
    }

    fn cell_mut(&mut self, value: CellValue) -> Option<&mut Cell> {
        self.cells.get_mut(usize::from(value.get()) - 1)
    }

    /// Cells in ascending order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn active(&self) -> Option<CellValue> {
        self.active
    }

    #[must_use]
    pub fn visited(&self) -> &BTreeSet<CellValue> {
        &self.visited
    }

    /// Move the active flag to `value`, marking it visited.
    ///
    /// Returns `false` (and changes nothing) when the board has no such cell.
    pub fn activate(&mut self, value: CellValue) -> bool {
        if self.cell(value).is_none() {
            return false;
        }
        self.deactivate();
        if let Some(cell) = self.cell_mut(value) {
            cell.active = true;
            cell.visited = true;
        }
        self.visited.insert(value);
        self.active = Some(value);
        true
    }

    /// Clear the active flag; visited cells stay visited.
    pub fn deactivate(&mut self) {
        if let Some(previous) = self.active.take()
            && let Some(cell) = self.cell_mut(previous)
        {
            cell.active = false;
        }
    }

    /// Clear every visited and active flag.
    pub fn clear_visited(&mut self) {
        let visited = std::mem::take(&mut self.visited);
        for value in visited {
            if let Some(cell) = self.cell_mut(value) {
                cell.visited = false;
                cell.active = false;
            }
        }
        self.deactivate();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::build()
    }
}
