//! Main UI layout and rendering for the dashboard.
//!
//! The layout is a single screen:
//!
//! - **Header**: title, measurement and logging state
//! - **Main content**: one card per display entry
//! - **Status bar**: messages or key hints, and the clock
//!
//! Dialogs and the help screen render as centered overlays on top.

pub mod theme;

mod dashboard;
mod overlays;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use time::OffsetDateTime;

use crate::app::App;
use theme::AppTheme;

/// Draw the complete interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(1),    // Device grid
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app);
    dashboard::draw_entry_grid(frame, main_layout[1], app);
    draw_status_bar(frame, main_layout[2], app);

    if app.show_help {
        overlays::draw_help_overlay(frame);
    }
    overlays::draw_form(frame, app);
    overlays::draw_confirmation_dialog(frame, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let theme = AppTheme::dark();

    let mut spans = vec![
        Span::styled(
            " mvlog ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            concat!("v", env!("CARGO_PKG_VERSION"), " "),
            Style::default().fg(theme.text_muted),
        ),
    ];

    if app.monitor.is_running() {
        spans.push(Span::styled(
            " MEASURING ",
            Style::default().fg(theme.success),
        ));
    } else {
        spans.push(Span::styled(" IDLE ", Style::default().fg(theme.text_muted)));
    }

    if app.monitor.is_logging() {
        spans.push(Span::styled(
            format!(" REC {} ", app.monitor.log_row_count()),
            Style::default()
                .fg(theme.danger)
                .add_modifier(Modifier::BOLD),
        ));
    } else if app.monitor.has_unsaved_log() {
        spans.push(Span::styled(
            format!(" UNSAVED {} ", app.monitor.log_row_count()),
            Style::default().fg(theme.warning),
        ));
    }

    spans.push(Span::styled(
        format!(" {} device(s) ", app.monitor.registry().len()),
        Style::default().fg(theme.text_muted),
    ));
    spans.push(Span::styled(
        format!(" every {}s ", app.config.logging.interval_secs),
        Style::default().fg(theme.text_muted),
    ));

    let header = Paragraph::new(Line::from(spans)).style(theme.header_style());
    frame.render_widget(header, area);
}

/// Get context-sensitive help hints based on current state.
fn context_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let mut hints = Vec::new();

    // Always show help key
    hints.push(("?", "help"));

    if app.monitor.registry().is_empty() {
        hints.push(("a", "add device"));
    } else {
        hints.push(("j/k", "select"));
        if app.monitor.is_running() {
            hints.push(("m", "stop"));
        } else {
            hints.push(("m", "measure"));
            hints.push(("a", "add"));
            hints.push(("d", "remove"));
        }
        if app.monitor.is_logging() {
            hints.push(("l", "stop log"));
        } else {
            hints.push(("l", "log"));
        }
        if app.monitor.has_unsaved_log() && !app.monitor.is_logging() {
            hints.push(("s", "save"));
        }
        if app.last_saved.is_some() {
            hints.push(("o", "open"));
        }
        hints.push(("e", "settings"));
    }

    hints.push(("p", "preferences"));
    hints.push(("q", "quit"));
    hints
}

/// Draw the status bar with context-sensitive help.
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = AppTheme::dark();
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let time_str = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());

    let left_spans = if let Some(msg) = app.current_status_message() {
        vec![Span::styled(
            format!(" {}", msg),
            Style::default().fg(theme.text_secondary),
        )]
    } else {
        // Context-sensitive hints with styled keys
        let hints = context_hints(app);
        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", Style::default().fg(theme.text_muted)));
            }
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" {}", desc),
                Style::default().fg(theme.text_muted),
            ));
        }
        spans
    };

    let status_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(area);

    let left = Paragraph::new(Line::from(left_spans));
    frame.render_widget(left, status_layout[0]);

    let right = Paragraph::new(time_str)
        .style(Style::default().fg(theme.text_muted))
        .alignment(Alignment::Right);
    frame.render_widget(right, status_layout[1]);
}
