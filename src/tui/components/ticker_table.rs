//! Ticker table component.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use rust_decimal::Decimal;

use crate::models::DerivedRecord;
use crate::tui::app::App;
use crate::view::COLUMNS;

const WIDTHS: [Constraint; 8] = [
    Constraint::Length(16),
    Constraint::Length(22),
    Constraint::Length(14),
    Constraint::Length(14),
    Constraint::Length(14),
    Constraint::Length(14),
    Constraint::Length(18),
    Constraint::Length(18),
];

/// Renders the sorted, paginated ticker table.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(COLUMNS.iter().enumerate().map(|(i, key)| {
        let mut label = format!("{} {}", i + 1, key.label());
        let mut style = Style::default().fg(Color::Gray);
        if *key == app.view.sort_key {
            label.push(' ');
            label.push_str(app.view.direction.arrow());
            style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        Cell::from(label).style(style)
    }));

    let rows: Vec<Row> = app.visible_rows().into_iter().map(row).collect();

    let title = format!(" USDT pairs ({}) ", app.records.len());
    let table = Table::new(rows, WIDTHS)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

    let mut state = TableState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn row(record: &DerivedRecord) -> Row<'static> {
    let t = &record.ticker;
    Row::new(vec![
        Cell::from(Span::styled(
            record.symbol().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Cell::from(change_cell(record.buy_change_percent)),
        Cell::from(price(t.buy)),
        Cell::from(price(t.sell)),
        Cell::from(price(t.high)),
        Cell::from(price(t.low)),
        Cell::from(volume(t.vol_value)),
        Cell::from(volume(t.vol)),
    ])
}

/// Colored change with a direction arrow; unchanged values stay plain.
fn change_cell(change: Option<Decimal>) -> Line<'static> {
    match change {
        Some(v) if v > Decimal::ZERO => {
            Line::from(Span::styled(format!("▲ {v:.2}%"), Style::default().fg(Color::Green)))
        }
        Some(v) if v < Decimal::ZERO => {
            Line::from(Span::styled(format!("▼ {v:.2}%"), Style::default().fg(Color::Red)))
        }
        Some(v) => Line::from(format!("  {v:.2}%")),
        None => Line::from(Span::styled("  NaN", Style::default().fg(Color::DarkGray))),
    }
}

/// Prices as delivered by the feed.
fn price(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Volumes rounded to two decimals.
pub fn volume(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v.round_dp(2)))
}
