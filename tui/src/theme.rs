//! Color theme and glyphs for Hopscotch TUI.
//!
//! Chrome uses the Kanagawa Wave palette by default with an optional
//! high-contrast override. Board colours come from the run's palette.

use ratatui::style::{Color, Modifier, Style};

use hopscotch_engine::{Hsla, RunPalette, UiOptions};

/// Kanagawa Wave color palette constants.
mod colors {
    use super::Color;

    // === Backgrounds (Sumi Ink) ===
    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_HIGHLIGHT: Color = Color::Rgb(42, 42, 55); // sumiInk4
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    // === Foregrounds (Fuji) ===
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147); // oldWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray
    pub const TEXT_DISABLED: Color = Color::Rgb(113, 124, 124); // katanaGray

    // === Primary/Brand ===
    pub const PRIMARY: Color = Color::Rgb(149, 127, 184); // oniViolet

    // === Accent Colors ===
    pub const CYAN: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ORANGE: Color = Color::Rgb(255, 160, 102); // surimiOrange
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
}

/// RGB of the panel background, used to flatten translucent run colours.
const PANEL_RGB: (u8, u8, u8) = (31, 31, 40);

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_highlight: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub text_disabled: Color,
    pub primary: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub peach: Color,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_highlight: colors::BG_HIGHLIGHT,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            text_disabled: colors::TEXT_DISABLED,
            primary: colors::PRIMARY,
            accent: colors::CYAN,
            success: colors::GREEN,
            warning: colors::YELLOW,
            error: colors::RED,
            peach: colors::ORANGE,
        }
    }

    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_highlight: Color::DarkGray,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::DarkGray,
            text_disabled: Color::DarkGray,
            primary: Color::White,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            peach: Color::Yellow,
        }
    }
}

#[must_use]
pub fn palette(options: UiOptions) -> Palette {
    if options.high_contrast {
        Palette::high_contrast()
    } else {
        Palette::standard()
    }
}

/// Board colours for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunColors {
    pub visited_bg: Color,
    pub active_bg: Color,
    pub active_fg: Color,
    pub marker: Color,
    pub marker_border: Color,
    pub glow: Color,
}

impl RunColors {
    /// Flatten the run palette onto the panel background.
    #[must_use]
    pub fn from_run(run: &RunPalette) -> Self {
        Self {
            visited_bg: flatten(run.run_shadow),
            active_bg: flatten(run.run_color),
            active_fg: flatten(run.run_shadow_strong),
            marker: flatten(run.marker_light),
            marker_border: flatten(run.marker_border),
            glow: flatten(run.marker_glow),
        }
    }

    /// Colours before any run has picked a hue.
    #[must_use]
    pub fn neutral(palette: &Palette) -> Self {
        Self {
            visited_bg: palette.bg_highlight,
            active_bg: palette.primary,
            active_fg: palette.bg_dark,
            marker: palette.text_primary,
            marker_border: palette.primary,
            glow: palette.bg_highlight,
        }
    }

    /// Named ANSI colours; run hues are ignored in high contrast.
    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            visited_bg: Color::DarkGray,
            active_bg: Color::Yellow,
            active_fg: Color::Black,
            marker: Color::White,
            marker_border: Color::Yellow,
            glow: Color::DarkGray,
        }
    }
}

#[must_use]
pub fn run_colors(run: Option<&RunPalette>, options: UiOptions) -> RunColors {
    if options.high_contrast {
        return RunColors::high_contrast();
    }
    match run {
        Some(run) => RunColors::from_run(run),
        None => RunColors::neutral(&Palette::standard()),
    }
}

fn flatten(color: Hsla) -> Color {
    let (r, g, b) = color.over(PANEL_RGB);
    Color::Rgb(r, g, b)
}

/// ASCII/Unicode glyphs for the marker and affordances.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub marker: &'static str,
    pub running: &'static str,
    pub stopped: &'static str,
    pub speed: &'static str,
    pub volume: &'static str,
    pub arrow_left: &'static str,
    pub arrow_right: &'static str,
    pub bullet: &'static str,
}

#[must_use]
pub fn glyphs(options: UiOptions) -> Glyphs {
    if options.ascii_only {
        Glyphs {
            marker: "o",
            running: ">",
            stopped: "#",
            speed: "~",
            volume: "vol",
            arrow_left: "<",
            arrow_right: ">",
            bullet: "*",
        }
    } else {
        Glyphs {
            marker: "●",
            running: "▶",
            stopped: "■",
            speed: "⏱",
            volume: "♪",
            arrow_left: "◂",
            arrow_right: "▸",
            bullet: "•",
        }
    }
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn title(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn enabled_button(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.success)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn stop_button(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.error)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn disabled_button(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.text_disabled)
            .bg(palette.bg_highlight)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.peach)
            .add_modifier(Modifier::BOLD)
    }
}
