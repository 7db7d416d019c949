//! Presentation state for the terminal renderer.
//!
//! The run controller never touches rendering directly; it issues commands
//! through the [`Stage`] capability trait. [`Presentation`] is the terminal
//! implementation, read by the TUI on every frame.

mod animation;
mod board;
mod presentation;

use std::time::Duration;

use hopscotch_types::{CellValue, RunPalette};

pub use animation::{Hop, Marker};
pub use board::{Board, Cell};
pub use presentation::Presentation;

/// Rendering capabilities the run controller drives.
pub trait Stage {
    /// Make `cell` the active cell and mark it visited.
    ///
    /// Returns `false` when the rendering has no such cell.
    fn highlight(&mut self, cell: CellValue) -> bool;

    /// Drop the active flag; visited cells keep their styling.
    fn clear_active(&mut self);

    /// Forget every visited cell and the active cell.
    fn clear_visited(&mut self);

    #[must_use]
    fn active_cell(&self) -> Option<CellValue>;

    /// Send the marker to `cell`, travelling for `duration`.
    fn move_marker(&mut self, cell: CellValue, duration: Duration);

    /// Finish any in-flight marker travel immediately.
    fn settle_marker(&mut self) {}

    fn hide_marker(&mut self);

    fn show_product(&mut self, text: &str);

    fn clear_product(&mut self);

    fn apply_palette(&mut self, palette: &RunPalette);

    /// Flip the start/stop affordances.
    fn set_running(&mut self, running: bool);
}
