//! Core domain types for Hopscotch.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod color;
mod grid;
mod ids;
mod settings;
mod table;
pub mod ui;

pub use color::{Hsla, RunPalette};
pub use grid::{CellValue, GRID_COLUMNS, GRID_LIMIT, GRID_ROWS};
pub use ids::RunToken;
pub use settings::{DEFAULT_VOLUME_PERCENT, EXTRA_HOLD, HopDuration, LEAD_IN, Volume};
pub use table::{MAX_MULTIPLIER, MAX_TABLE, TableBase, TableBaseError, TableStep};
pub use ui::UiOptions;
