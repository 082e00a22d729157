//! Overlay rendering for the dashboard: help, dialogs, confirmations.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use mvlog_types::CalibrationMode;

use super::theme::{AppTheme, BORDER_TYPE};
use crate::app::{App, PendingAction};
use crate::forms::{
    AddDeviceForm, ChannelAssignForm, DeviceSettingsForm, Form, PreferencesForm, SaveLogForm,
};

/// Draw help overlay with keyboard shortcuts.
pub(super) fn draw_help_overlay(frame: &mut Frame) {
    let theme = AppTheme::dark();

    let area = frame.area();
    let width = (area.width * 70 / 100)
        .max(50)
        .min(area.width.saturating_sub(2));
    let height = 18.min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;

    let help_area = Rect::new(x, y, width, height);
    frame.render_widget(Clear, help_area);

    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(theme.border_active_style())
            .title(Span::styled(" Help ", theme.title_style())),
        help_area,
    );

    // Two-column layout for shortcuts
    let inner_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(help_area);

    let left_lines = vec![
        section_heading("--- Measurement ---", &theme),
        Line::from(""),
        shortcut_line("m", "Start/stop measuring", &theme),
        shortcut_line("l", "Start/stop logging", &theme),
        shortcut_line("s", "Save log to CSV", &theme),
        shortcut_line("o", "Open saved log", &theme),
        Line::from(""),
        section_heading("--- Devices ---", &theme),
        Line::from(""),
        shortcut_line("a", "Add device", &theme),
        shortcut_line("d", "Remove device", &theme),
        shortcut_line("e", "Device settings", &theme),
    ];

    let right_lines = vec![
        section_heading("--- Navigation ---", &theme),
        Line::from(""),
        shortcut_line("j/k or arrows", "Select device", &theme),
        shortcut_line("Tab", "Next form field", &theme),
        shortcut_line("Left/Right", "Cycle form choice", &theme),
        Line::from(""),
        section_heading("--- Other ---", &theme),
        Line::from(""),
        shortcut_line("p", "Preferences", &theme),
        shortcut_line("?", "Toggle help", &theme),
        shortcut_line("Esc", "Close overlay", &theme),
        shortcut_line("q", "Quit", &theme),
    ];

    frame.render_widget(Paragraph::new(left_lines), inner_layout[0]);
    frame.render_widget(Paragraph::new(right_lines), inner_layout[1]);
}

fn section_heading(text: &str, theme: &AppTheme) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), theme.title_style()))
}

/// Create a shortcut line with key and description.
fn shortcut_line<'a>(key: &str, desc: &str, theme: &AppTheme) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{:>14} ", key),
            Style::default().fg(theme.warning),
        ),
        Span::styled(desc.to_string(), Style::default().fg(theme.text_secondary)),
    ])
}

/// Draw the open dialog, if any.
pub(super) fn draw_form(frame: &mut Frame, app: &App) {
    let Some(form) = &app.form else {
        return;
    };
    let theme = AppTheme::dark();

    let (lines, width) = match form {
        Form::AddDevice(form) => (add_device_lines(form, &theme), 46),
        Form::AssignChannels(form) => (assign_channels_lines(form, &theme), 52),
        Form::DeviceSettings(form) => (device_settings_lines(form, &theme), 52),
        Form::SaveLog(form) => (save_log_lines(form, &theme), 52),
        Form::Preferences(form) => (preferences_lines(form, &theme), 52),
    };

    let area = frame.area();
    let width = width.min(area.width.saturating_sub(4));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, dialog_area);
    let dialog = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(theme.border_active_style())
            .title(Span::styled(form.title(), theme.title_style())),
    );
    frame.render_widget(dialog, dialog_area);
}

fn add_device_lines(form: &AddDeviceForm, theme: &AppTheme) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        choice_row(
            "Device type",
            &form.selected_type().to_string(),
            form.focus == 0,
            theme,
        ),
        choice_row("Port", form.selected_port(), form.focus == 1, theme),
        Line::from(""),
        footer_line("Add", theme),
    ]
}

fn assign_channels_lines(form: &ChannelAssignForm, theme: &AppTheme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", form.parent_label),
            Style::default().fg(theme.text_muted),
        )),
        Line::from(""),
    ];
    for (slot, assignment) in form.assignments.iter().enumerate() {
        let value = assignment
            .map(|index| form.type_names[index].as_str())
            .unwrap_or("(empty)");
        lines.push(choice_row(
            &format!("Channel {}", slot + 1),
            value,
            form.focus == slot,
            theme,
        ));
    }
    lines.push(Line::from(""));
    lines.push(footer_line("Apply", theme));
    lines
}

fn device_settings_lines(form: &DeviceSettingsForm, theme: &AppTheme) -> Vec<Line<'static>> {
    let mode = match form.mode {
        CalibrationMode::SlopeIntercept => "slope/intercept",
        CalibrationMode::TwoPoint => "two-point",
    };
    vec![
        Line::from(Span::styled(
            format!(" {}", form.label),
            Style::default().fg(theme.text_muted),
        )),
        Line::from(""),
        choice_row("Calibration mode", mode, form.focus == 0, theme),
        text_row("Slope", &form.slope, form.focus == 1, theme),
        text_row("Intercept", &form.intercept, form.focus == 2, theme),
        Line::from(""),
        text_row("Point 1 measured", &form.measured_1, form.focus == 3, theme),
        button_row(
            "Read current value",
            form.focus == DeviceSettingsForm::READ_POINT_1,
            theme,
        ),
        text_row(
            "Point 1 reference",
            &form.reference_1,
            form.focus == 5,
            theme,
        ),
        text_row("Point 2 measured", &form.measured_2, form.focus == 6, theme),
        button_row(
            "Read current value",
            form.focus == DeviceSettingsForm::READ_POINT_2,
            theme,
        ),
        text_row(
            "Point 2 reference",
            &form.reference_2,
            form.focus == 8,
            theme,
        ),
        Line::from(""),
        text_row("Unit override", &form.unit, form.focus == 9, theme),
        Line::from(""),
        footer_line("Save", theme),
    ]
}

fn save_log_lines(form: &SaveLogForm, theme: &AppTheme) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(theme.primary)),
            Span::styled(
                form.filename.clone(),
                Style::default().fg(theme.text_primary),
            ),
            Span::styled("_", Style::default().fg(theme.primary)), // Cursor
        ]),
        Line::from(""),
        footer_line("Save", theme),
    ]
}

fn preferences_lines(form: &PreferencesForm, theme: &AppTheme) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        text_row(
            "Interval (seconds)",
            &form.interval_secs,
            form.focus == 0,
            theme,
        ),
        text_row(
            "Office program",
            &form.office_program,
            form.focus == 1,
            theme,
        ),
        choice_row(
            "Language",
            &form.language.to_string(),
            form.focus == 2,
            theme,
        ),
        Line::from(""),
        footer_line("Save", theme),
    ]
}

/// A labeled text input row; the focused row gets a cursor.
fn text_row(label: &str, value: &str, focused: bool, theme: &AppTheme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {:<19}", label),
        Style::default().fg(theme.text_secondary),
    )];
    if focused {
        spans.push(Span::styled(value.to_string(), theme.selected_style()));
        spans.push(Span::styled("_", Style::default().fg(theme.primary))); // Cursor
    } else {
        spans.push(Span::styled(
            value.to_string(),
            Style::default().fg(theme.text_primary),
        ));
    }
    Line::from(spans)
}

/// A labeled choice row cycled with Left/Right.
fn choice_row(label: &str, value: &str, focused: bool, theme: &AppTheme) -> Line<'static> {
    let value_style = if focused {
        theme.selected_style()
    } else {
        Style::default().fg(theme.text_primary)
    };
    Line::from(vec![
        Span::styled(
            format!(" {:<19}", label),
            Style::default().fg(theme.text_secondary),
        ),
        Span::styled("< ".to_string(), Style::default().fg(theme.text_muted)),
        Span::styled(value.to_string(), value_style),
        Span::styled(" >".to_string(), Style::default().fg(theme.text_muted)),
    ])
}

/// A row that acts on Enter instead of taking input.
fn button_row(label: &str, focused: bool, theme: &AppTheme) -> Line<'static> {
    let style = if focused {
        theme.selected_style()
    } else {
        Style::default().fg(theme.text_secondary)
    };
    Line::from(vec![
        Span::raw(" ".repeat(20)),
        Span::styled(format!("[ {label} ]"), style),
    ])
}

fn footer_line(submit_label: &str, theme: &AppTheme) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled("Enter", Style::default().fg(theme.success)),
        Span::styled(
            format!("={submit_label}  "),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled("Esc", Style::default().fg(theme.danger)),
        Span::styled("=Cancel".to_string(), Style::default().fg(theme.text_muted)),
    ])
}

/// Draw confirmation dialog for pending actions.
pub(super) fn draw_confirmation_dialog(frame: &mut Frame, app: &App) {
    if let Some(action) = &app.pending_confirmation {
        let theme = AppTheme::dark();

        let message = match action {
            PendingAction::DiscardLog => "Discard the unsaved log buffer?".to_string(),
            PendingAction::RemoveDevice { label, .. } => {
                format!("Remove '{}'?", label)
            }
            PendingAction::OverwriteFile { path } => {
                format!("Overwrite '{}'?", path.display())
            }
        };

        let area = frame.area();
        let dialog_width = ((message.len() as u16 + 6).max(40)).min(area.width.saturating_sub(4));
        let dialog_height = 5;
        let dialog_x = (area.width.saturating_sub(dialog_width)) / 2;
        let dialog_y = (area.height.saturating_sub(dialog_height)) / 2;

        let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

        // Clear background
        frame.render_widget(Clear, dialog_area);

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                message,
                Style::default().fg(theme.text_primary),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    " [Y]es ",
                    Style::default()
                        .fg(theme.success)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    " [N]o ",
                    Style::default()
                        .fg(theme.danger)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        let dialog = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BORDER_TYPE)
                    .border_style(Style::default().fg(theme.warning))
                    .title(Span::styled(
                        " Confirm ",
                        Style::default()
                            .fg(theme.warning)
                            .add_modifier(Modifier::BOLD),
                    )),
            );

        frame.render_widget(dialog, dialog_area);
    }
}
