//! Per-run colour scheme.

use std::fmt;

/// A colour in hue/saturation/lightness/alpha form.
///
/// `hue` is in degrees, `saturation` and `lightness` in percent, `alpha` in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Hsla {
    #[must_use]
    pub const fn new(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
            alpha,
        }
    }

    /// Opaque RGB, ignoring alpha.
    #[must_use]
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    /// RGB blended over `background` by alpha.
    #[must_use]
    pub fn over(self, background: (u8, u8, u8)) -> (u8, u8, u8) {
        let (r, g, b) = self.to_rgb();
        let a = self.alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| {
            (f32::from(fg) * a + f32::from(bg) * (1.0 - a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        (
            mix(r, background.0),
            mix(g, background.1),
            mix(b, background.2),
        )
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

/// Theme colours for one table, all derived from a single hue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPalette {
    pub hue: u16,
    pub run_color: Hsla,
    pub run_shadow: Hsla,
    pub run_shadow_strong: Hsla,
    pub marker_light: Hsla,
    pub marker_border: Hsla,
    pub marker_glow: Hsla,
}

impl RunPalette {
    #[must_use]
    pub fn from_hue(hue: u16) -> Self {
        let hue = hue % 360;
        let h = f32::from(hue);
        Self {
            hue,
            run_color: Hsla::new(h, 85.0, 68.0, 0.95),
            run_shadow: Hsla::new(h, 80.0, 35.0, 0.35),
            run_shadow_strong: Hsla::new(h, 82.0, 32.0, 0.45),
            marker_light: Hsla::new(h, 95.0, 88.0, 0.85),
            marker_border: Hsla::new(h, 85.0, 65.0, 0.6),
            marker_glow: Hsla::new(h, 85.0, 52.0, 0.4),
        }
    }

    /// Theme variables in the order the renderer applies them.
    #[must_use]
    pub fn variables(&self) -> [(&'static str, Hsla); 6] {
        [
            ("run-color", self.run_color),
            ("run-color-shadow", self.run_shadow),
            ("run-color-shadow-strong", self.run_shadow_strong),
            ("marker-color-light", self.marker_light),
            ("marker-border-color", self.marker_border),
            ("marker-glow", self.marker_glow),
        ]
    }
}
