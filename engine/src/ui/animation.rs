use std::time::{Duration, Instant};

use hopscotch_types::CellValue;

pub(crate) fn normalized_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }

    let elapsed = elapsed.as_secs_f32();
    let total = duration.as_secs_f32();
    (elapsed / total).clamp(0.0, 1.0)
}

/// Marker travel from one cell to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// `None` when the marker appears out of nowhere.
    from: Option<CellValue>,
    to: CellValue,
    started: Instant,
    duration: Duration,
}

impl Hop {
    #[must_use]
    pub fn new(from: Option<CellValue>, to: CellValue, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    #[must_use]
    pub fn origin(&self) -> Option<CellValue> {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> CellValue {
        self.to
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Linear progress in `0.0..=1.0` at `now`.
    #[must_use]
    pub fn progress(&self, now: Instant) -> f32 {
        if self.from.is_none() {
            return 1.0;
        }
        normalized_progress(now.saturating_duration_since(self.started), self.duration)
    }

    #[must_use]
    pub fn is_landed(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Finish the hop immediately.
    pub fn land(&mut self) {
        self.duration = Duration::ZERO;
    }
}

/// Where the marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    Hidden,
    Visible(Hop),
}

impl Marker {
    /// The cell the marker is on or heading to.
    #[must_use]
    pub fn target(&self) -> Option<CellValue> {
        match self {
            Marker::Hidden => None,
            Marker::Visible(hop) => Some(hop.to()),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self, Marker::Visible(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(v: u16) -> CellValue {
        CellValue::new(v).unwrap()
    }

    #[test]
    fn progress_is_clamped() {
        let start = Instant::now();
        let hop = Hop::new(Some(cell(1)), cell(2), start, Duration::from_millis(400));
        assert!(hop.progress(start).abs() < f32::EPSILON);
        assert!((hop.progress(start + Duration::from_millis(200)) - 0.5).abs() < 1e-3);
        assert!((hop.progress(start + Duration::from_secs(5)) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn first_appearance_is_already_landed() {
        let start = Instant::now();
        let hop = Hop::new(None, cell(9), start, Duration::from_secs(1));
        assert!(hop.is_landed(start));
    }

    #[test]
    fn landing_skips_the_rest_of_the_hop() {
        let start = Instant::now();
        let mut hop = Hop::new(Some(cell(1)), cell(2), start, Duration::from_secs(3));
        assert!(!hop.is_landed(start));
        hop.land();
        assert!(hop.is_landed(start));
    }
}
