//! UI option types shared by the engine and the TUI.
//!
//! Pure data types with no IO, no async, no ratatui dependency.

/// UI configuration options derived from config/environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    /// Use ASCII-only glyphs for the marker and affordances.
    pub ascii_only: bool,
    pub high_contrast: bool,
    /// Hops land instantly instead of gliding between cells.
    pub reduced_motion: bool,
}
