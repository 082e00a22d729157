//! Device grid rendering for the main dashboard area.

use mvlog_core::DisplayEntry;
use mvlog_types::CalibrationMode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::theme::{AppTheme, BORDER_TYPE};
use crate::app::App;

/// Entries per grid row.
const PER_ROW: usize = 3;

/// Height of one card, borders included.
const CARD_HEIGHT: u16 = 5;

/// Draw the device cards, three per row, selection highlighted.
pub(super) fn draw_entry_grid(frame: &mut Frame, area: Rect, app: &App) {
    let theme = AppTheme::dark();
    let entries: Vec<&DisplayEntry> = app.monitor.registry().iter().collect();

    if entries.is_empty() {
        draw_empty_state(frame, area, &theme);
        return;
    }

    let row_count = entries.len().div_ceil(PER_ROW);
    let mut constraints = vec![Constraint::Length(CARD_HEIGHT); row_count];
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (row_index, chunk) in entries.chunks(PER_ROW).enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, PER_ROW as u32); PER_ROW])
            .split(rows[row_index]);

        for (column_index, entry) in chunk.iter().enumerate() {
            let selected = row_index * PER_ROW + column_index == app.selected;
            frame.render_widget(entry_card(entry, selected, &theme), columns[column_index]);
        }
    }
}

/// Create one bordered card showing the latest calibrated value.
fn entry_card(entry: &DisplayEntry, selected: bool, theme: &AppTheme) -> Paragraph<'static> {
    let value = entry
        .last
        .as_ref()
        .map(|sample| sample.to_string())
        .unwrap_or_else(|| "--".to_string());

    let mode = match entry.calibration.mode {
        CalibrationMode::SlopeIntercept => "slope/intercept",
        CalibrationMode::TwoPoint => "two-point",
    };
    let detail = format!("{}  {}", entry.id, mode);

    let border_style = if selected {
        theme.border_active_style()
    } else {
        theme.border_inactive_style()
    };
    let title_style = if selected {
        theme.title_style()
    } else {
        Style::default().fg(theme.text_secondary)
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            detail,
            Style::default().fg(theme.text_muted),
        )),
    ];

    Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(border_style)
            .title(Span::styled(format!(" {} ", entry.label), title_style)),
    )
}

fn draw_empty_state(frame: &mut Frame, area: Rect, theme: &AppTheme) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No devices connected",
            Style::default().fg(theme.text_secondary),
        )),
        Line::from(Span::styled(
            "Press 'a' to add one",
            Style::default().fg(theme.text_muted),
        )),
    ];

    let placeholder = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(theme.border_inactive_style()),
    );
    frame.render_widget(placeholder, area);
}
