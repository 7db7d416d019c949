//! TUI rendering for Hopscotch using ratatui.

mod effects;
mod input;
mod theme;

pub use effects::{marker_rect, scale_rect};
pub use input::{Action, InputPump, action_for_key, apply_action, apply_event, handle_events};
pub use theme::{Glyphs, Palette, RunColors, glyphs, palette, run_colors, styles};

use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use hopscotch_engine::{App, Cell, GRID_COLUMNS, GRID_ROWS, Marker, Presentation};

/// Narrowest cell that still fits a three-digit label.
const MIN_CELL_WIDTH: u16 = 3;
/// Fraction of a cell the marker covers.
const MARKER_SCALE: f32 = 0.6;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Controls
            Constraint::Length(3), // Product
            Constraint::Fill(1),   // Board
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_controls(frame, app, chunks[0], &palette, &glyphs);
    draw_product(frame, app.presentation(), chunks[1], &palette);
    draw_board(frame, app, chunks[2], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[3], &palette);
}

fn panel(palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
}

fn draw_controls(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let running = app.presentation().is_running();
    let label = Style::default().fg(palette.text_secondary);
    let value = Style::default()
        .fg(palette.text_primary)
        .add_modifier(Modifier::BOLD);

    let (start_style, stop_style) = if running {
        (
            styles::disabled_button(palette),
            styles::stop_button(palette),
        )
    } else {
        (
            styles::enabled_button(palette),
            styles::disabled_button(palette),
        )
    };

    let line = Line::from(vec![
        Span::styled("Table ", label),
        Span::styled(glyphs.arrow_left, styles::key_hint(palette)),
        Span::styled(format!(" {:>2} ", app.selection().get()), value),
        Span::styled(glyphs.arrow_right, styles::key_hint(palette)),
        Span::raw("   "),
        Span::styled(format!("{} Speed ", glyphs.speed), label),
        Span::styled(app.speed_label(), value),
        Span::raw("   "),
        Span::styled(format!("{} Volume ", glyphs.volume), label),
        Span::styled(app.volume_label(), value),
        Span::raw("   "),
        Span::styled(format!(" {} Start ", glyphs.running), start_style),
        Span::raw(" "),
        Span::styled(format!(" {} Stop ", glyphs.stopped), stop_style),
    ]);

    let block = panel(palette).title(Span::styled(" Hopscotch Times Tables ", styles::title(palette)));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_product(frame: &mut Frame, presentation: &Presentation, area: Rect, palette: &Palette) {
    let text = presentation.product().unwrap_or_default();
    let style = Style::default()
        .fg(palette.text_primary)
        .add_modifier(Modifier::BOLD);
    let widget = Paragraph::new(Line::from(Span::styled(text.to_string(), style)))
        .alignment(Alignment::Center)
        .block(panel(palette));
    frame.render_widget(widget, area);
}

/// Screen rectangle of the cell labelled `value` inside the board's inner area.
#[must_use]
pub fn cell_rect(board: Rect, value: u16) -> Option<Rect> {
    let cell = hopscotch_engine::CellValue::new(value)?;
    let width = board.width / GRID_COLUMNS;
    let height = board.height / GRID_ROWS;
    if width < MIN_CELL_WIDTH || height == 0 {
        return None;
    }
    Some(Rect::new(
        board.x + cell.column() * width,
        board.y + cell.row() * height,
        width,
        height,
    ))
}

fn draw_board(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let presentation = app.presentation();
    let colors = run_colors(presentation.palette(), app.ui_options());

    let block = panel(palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if cell_rect(inner, 1).is_none() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Enlarge the terminal to see the board",
            Style::default().fg(palette.warning),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(hint, inner);
        return;
    }

    for cell in presentation.board().cells() {
        let Some(rect) = cell_rect(inner, cell.value().get()) else {
            continue;
        };
        let widget = Paragraph::new(cell_label(cell, rect))
            .alignment(Alignment::Center)
            .style(cell_style(cell, palette, &colors));
        frame.render_widget(widget, rect);
    }

    if let Marker::Visible(hop) = presentation.marker()
        && let Some(rect) = marker_rect(&hop, Instant::now(), |value| cell_rect(inner, value))
    {
        let marker = scale_rect(rect, MARKER_SCALE);
        let widget = Paragraph::new(Line::from(glyphs.marker))
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(colors.marker)
                    .bg(colors.glow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(widget, marker);
    }
}

/// Label on the cell's middle row.
fn cell_label(cell: &Cell, rect: Rect) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""); usize::from(rect.height.saturating_sub(1) / 2)];
    lines.push(Line::from(cell.value().get().to_string()));
    lines
}

fn cell_style(cell: &Cell, palette: &Palette, colors: &RunColors) -> Style {
    if cell.is_active() {
        Style::default()
            .fg(colors.active_fg)
            .bg(colors.active_bg)
            .add_modifier(Modifier::BOLD)
    } else if cell.is_visited() {
        Style::default()
            .fg(palette.text_primary)
            .bg(colors.visited_bg)
    } else {
        Style::default().fg(palette.text_muted).bg(palette.bg_panel)
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let hint = styles::key_hint(palette);
    let key = styles::key_highlight(palette);
    let mut spans = vec![
        Span::styled("←/→", key),
        Span::styled(" table  ", hint),
        Span::styled("Enter", key),
        Span::styled(" start  ", hint),
        Span::styled("Esc", key),
        Span::styled(" stop  ", hint),
        Span::styled("[ ]", key),
        Span::styled(" speed  ", hint),
        Span::styled("- +", key),
        Span::styled(" volume  ", hint),
        Span::styled("q", key),
        Span::styled(" quit", hint),
    ];
    if let Some(status) = app.status_message() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            status.to_string(),
            Style::default().fg(palette.warning),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
