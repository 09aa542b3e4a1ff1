//! Main UI rendering coordinator.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::app::{App, Mode};
use super::components::{status_bar, ticker_table};

const KEYBINDINGS: &str =
    "[r]efresh [s]tart/stop [ ]interval [a]lerts [b]asis [1-8]sort [m]ore [f]ilter volume [j/k]select [q]uit";

/// Renders the entire application UI.
pub fn render(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(5),    // Ticker table
            Constraint::Length(1), // Pagination and selection
            Constraint::Length(1), // Keybindings help or input
        ])
        .split(frame.area());

    status_bar::render(frame, layout[0], app);
    ticker_table::render(frame, layout[1], app);
    render_footer(frame, layout[2], app);

    match app.mode {
        Mode::Normal => render_keybindings(frame, layout[3]),
        Mode::Insert => render_volume_input(frame, layout[3], app),
    }
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let total = app.records.len();
    let shown = app.view.visible_rows().min(total);

    let mut spans = vec![Span::raw(format!(" Showing {shown} of {total}"))];
    if app.view.has_more(total) {
        spans.push(Span::styled(
            "  [m] show more",
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(record) = app.selected_record() {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            record.trade_url(),
            Style::default().fg(Color::Blue),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_keybindings(frame: &mut Frame, area: Rect) {
    let para = Paragraph::new(KEYBINDINGS).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_volume_input(frame: &mut Frame, area: Rect, app: &App) {
    const PROMPT: &str = " Min 24h volume (empty for none, Enter to apply, Esc to cancel): ";

    let line = Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(Color::Yellow)),
        Span::raw(app.volume_input.as_str()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let x = area.x + (PROMPT.chars().count() + app.volume_input.cursor()) as u16;
    frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
}
