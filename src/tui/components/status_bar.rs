//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::tui::app::App;

/// Renders the status bar: polling state, countdown, last update, alert
/// settings and the current error, if any.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let polling = if app.auto_refresh {
        Span::styled(
            format!(" Auto: every {} ", app.interval.label()),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled(
            format!(" Auto: off ({}) ", app.interval.label()),
            Style::default().fg(Color::Yellow),
        )
    };

    let next = match (app.loading, app.countdown) {
        (true, _) => Span::styled(" Loading… ", Style::default().fg(Color::Cyan)),
        (false, Some(left)) => Span::raw(format!(" Next: {} ", format_countdown(left.as_secs()))),
        (false, None) => Span::raw(" Next: -- "),
    };

    let updated = match app.last_updated {
        Some(at) => Span::raw(format!(" Updated: {} ", at.format("%H:%M:%S"))),
        None => Span::styled(" Updated: never ", Style::default().fg(Color::Gray)),
    };

    let alerts = if app.alerts_enabled {
        Span::styled(
            format!(" Alerts: on ({}) ", app.alert_basis.label()),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled(" Alerts: off ", Style::default().fg(Color::Gray))
    };

    let floor = match app.view.min_volume {
        Some(v) => Span::raw(format!(" Min vol: {v} ")),
        None => Span::raw(" Min vol: none "),
    };

    let error_span = if let Some(ref error) = app.error_message {
        Span::styled(
            format!(" {} ", error.message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        Span::styled(
            " dipwatch ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        polling,
        Span::raw("│"),
        next,
        Span::raw("│"),
        updated,
        Span::raw("│"),
        alerts,
        Span::raw("│"),
        floor,
        Span::raw("│"),
        error_span,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

/// Formats whole seconds as `MM:SS`.
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
