use std::time::{Duration, Instant};

use hopscotch_types::{CellValue, RunPalette};

use super::{Board, Hop, Marker, Stage};

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    board: Board,
    marker: Marker,
    product: Option<String>,
    palette: Option<RunPalette>,
    running: bool,
    reduced_motion: bool,
}

impl Presentation {
    #[must_use]
    pub fn new(reduced_motion: bool) -> Self {
        Self {
            reduced_motion,
            ..Self::default()
        }
    }

    /// Replace the board with a fresh one; all run styling is lost.
    pub fn rebuild(&mut self) {
        self.board = Board::build();
        self.marker = Marker::Hidden;
        self.product = None;
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Text of the product display, e.g. `7 x 3 = 21`.
    #[must_use]
    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Palette of the most recent run, if any run has started.
    #[must_use]
    pub fn palette(&self) -> Option<&RunPalette> {
        self.palette.as_ref()
    }

    /// Start is disabled and stop enabled while this is set.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Stage for Presentation {
    fn highlight(&mut self, cell: CellValue) -> bool {
        self.board.activate(cell)
    }

    fn clear_active(&mut self) {
        self.board.deactivate();
    }

    fn clear_visited(&mut self) {
        self.board.clear_visited();
    }

    fn active_cell(&self) -> Option<CellValue> {
        self.board.active()
    }

    fn move_marker(&mut self, cell: CellValue, duration: Duration) {
        let duration = if self.reduced_motion {
            Duration::ZERO
        } else {
            duration
        };
        self.marker = Marker::Visible(Hop::new(
            self.marker.target(),
            cell,
            Instant::now(),
            duration,
        ));
    }

    fn settle_marker(&mut self) {
        if let Marker::Visible(hop) = &mut self.marker {
            hop.land();
        }
    }

    fn hide_marker(&mut self) {
        self.marker = Marker::Hidden;
    }

    fn show_product(&mut self, text: &str) {
        self.product = Some(text.to_string());
    }

    fn clear_product(&mut self) {
        self.product = None;
    }

    fn apply_palette(&mut self, palette: &RunPalette) {
        self.palette = Some(*palette);
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(v: u16) -> CellValue {
        CellValue::new(v).unwrap()
    }

    #[test]
    fn marker_travels_from_previous_target() {
        let mut stage = Presentation::new(false);
        stage.move_marker(cell(4), Duration::from_millis(800));
        stage.move_marker(cell(8), Duration::from_millis(800));

        let Marker::Visible(hop) = stage.marker() else {
            panic!("marker should be visible");
        };
        assert_eq!(hop.origin(), Some(cell(4)));
        assert_eq!(hop.to(), cell(8));
        assert_eq!(hop.duration(), Duration::from_millis(800));
    }

    #[test]
    fn marker_reappears_without_travel_after_hiding() {
        let mut stage = Presentation::new(false);
        stage.move_marker(cell(4), Duration::from_millis(800));
        stage.hide_marker();
        stage.move_marker(cell(12), Duration::from_millis(800));

        let Marker::Visible(hop) = stage.marker() else {
            panic!("marker should be visible");
        };
        assert_eq!(hop.origin(), None);
    }

    #[test]
    fn reduced_motion_lands_immediately() {
        let mut stage = Presentation::new(true);
        stage.move_marker(cell(4), Duration::from_millis(800));
        stage.move_marker(cell(8), Duration::from_millis(800));
        let Marker::Visible(hop) = stage.marker() else {
            panic!("marker should be visible");
        };
        assert_eq!(hop.duration(), Duration::ZERO);
    }

    #[test]
    fn settle_lands_current_hop() {
        let mut stage = Presentation::new(false);
        stage.move_marker(cell(4), Duration::from_secs(2));
        stage.move_marker(cell(8), Duration::from_secs(2));
        stage.settle_marker();
        let Marker::Visible(hop) = stage.marker() else {
            panic!("marker should be visible");
        };
        assert!(hop.is_landed(Instant::now()));
    }

    #[test]
    fn rebuild_clears_run_styling() {
        let mut stage = Presentation::new(false);
        stage.highlight(cell(6));
        stage.show_product("3 x 2 = 6");
        stage.move_marker(cell(6), Duration::ZERO);
        stage.rebuild();

        assert!(stage.board().visited().is_empty());
        assert_eq!(stage.active_cell(), None);
        assert_eq!(stage.product(), None);
        assert!(!stage.marker().is_visible());
    }
}
