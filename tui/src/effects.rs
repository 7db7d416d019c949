//! Marker hop animation.

use std::time::Instant;

use ratatui::layout::Rect;

use hopscotch_engine::Hop;

/// Rows the marker rises at the top of its arc.
const HOP_LIFT: f32 = 1.0;

/// Where to draw the marker for `hop` at `now`.
///
/// `rect_for` maps a cell value to its on-screen rectangle; the marker
/// travels between the two rectangles along a shallow arc.
#[must_use]
pub fn marker_rect(hop: &Hop, now: Instant, rect_for: impl Fn(u16) -> Option<Rect>) -> Option<Rect> {
    let to = rect_for(hop.to().get())?;
    let Some(from) = hop.origin().and_then(|cell| rect_for(cell.get())) else {
        return Some(to);
    };

    let t = ease_out_cubic(hop.progress(now));
    if t >= 1.0 {
        return Some(to);
    }
    let lift = (f32::sin(t * std::f32::consts::PI) * HOP_LIFT).round() as u16;
    let rect = lerp_rect(from, to, t);
    Some(Rect {
        y: rect.y.saturating_sub(lift),
        ..rect
    })
}

/// Shrink `base` around its centre.
#[must_use]
pub fn scale_rect(base: Rect, scale: f32) -> Rect {
    let width = (f32::from(base.width) * scale).round() as u16;
    let height = (f32::from(base.height) * scale).round() as u16;
    let width = width.max(1).min(base.width);
    let height = height.max(1).min(base.height);
    let x = base.x + (base.width.saturating_sub(width) / 2);
    let y = base.y + (base.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn lerp_rect(from: Rect, to: Rect, t: f32) -> Rect {
    let lerp = |a: u16, b: u16| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u16;
    Rect {
        x: lerp(from.x, to.x),
        y: lerp(from.y, to.y),
        width: lerp(from.width, to.width),
        height: lerp(from.height, to.height),
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}
