//! Playback pacing and loudness settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Extra time the marker rests on a cell after its hop lands.
pub const EXTRA_HOLD: Duration = Duration::from_millis(260);
/// Pause between starting a run and the first hop.
pub const LEAD_IN: Duration = Duration::from_millis(150);
/// Volume used when nothing better is known.
pub const DEFAULT_VOLUME_PERCENT: u8 = 60;

/// Below this hop duration narration switches to the terse form.
const QUICK_HOP_MS: u32 = 1500;

/// Time the marker takes to travel between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct HopDuration(u32);

impl HopDuration {
    pub const MIN_MS: u32 = 400;
    pub const MAX_MS: u32 = 3000;
    pub const STEP_MS: u32 = 100;
    pub const DEFAULT_MS: u32 = 1200;

    /// Clamps into `MIN_MS..=MAX_MS`.
    #[must_use]
    pub fn from_millis(ms: u32) -> Self {
        Self(ms.clamp(Self::MIN_MS, Self::MAX_MS))
    }

    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0))
    }

    /// How long the run waits on a cell: the hop itself plus `EXTRA_HOLD`.
    #[must_use]
    pub fn dwell(self) -> Duration {
        self.as_duration() + EXTRA_HOLD
    }

    /// Fast playback narrates only the product.
    #[must_use]
    pub const fn is_quick(self) -> bool {
        self.0 < QUICK_HOP_MS
    }

    /// A shorter hop.
    #[must_use]
    pub fn faster(self) -> Self {
        Self::from_millis(self.0.saturating_sub(Self::STEP_MS))
    }

    /// A longer hop.
    #[must_use]
    pub fn slower(self) -> Self {
        Self::from_millis(self.0.saturating_add(Self::STEP_MS))
    }

    /// Seconds with one decimal, e.g. `1.2s`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{:.1}s", f64::from(self.0) / 1000.0)
    }
}

impl Default for HopDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_MS)
    }
}

impl From<u32> for HopDuration {
    fn from(ms: u32) -> Self {
        Self::from_millis(ms)
    }
}

impl From<HopDuration> for u32 {
    fn from(value: HopDuration) -> Self {
        value.0
    }
}

/// User volume setting in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Volume(u8);

impl Volume {
    pub const STEP: u8 = 5;
    pub const MUTE: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Clamps to at most 100.
    #[must_use]
    pub fn from_percent(percent: u8) -> Self {
        Self(percent.min(100))
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Linear level in `0.0..=1.0`.
    #[must_use]
    pub fn level(self) -> f64 {
        (f64::from(self.0) / 100.0).clamp(0.0, 1.0)
    }

    /// Background music volume.
    ///
    /// A power curve keeps the lower half of the control audible; anything at
    /// or below 1% is silence.
    #[must_use]
    pub fn music_gain(self) -> f64 {
        let level = self.level();
        if level <= 0.01 {
            return 0.0;
        }
        let shaped = level.powf(0.8);
        (0.15 + shaped * 0.75).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn louder(self) -> Self {
        Self::from_percent(self.0.saturating_add(Self::STEP))
    }

    #[must_use]
    pub fn quieter(self) -> Self {
        Self(self.0.saturating_sub(Self::STEP))
    }

    /// Whole percent, e.g. `60%`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}%", self.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(DEFAULT_VOLUME_PERCENT)
    }
}

impl From<u8> for Volume {
    fn from(percent: u8) -> Self {
        Self::from_percent(percent)
    }
}

impl From<Volume> for u8 {
    fn from(value: Volume) -> Self {
        value.0
    }
}
