//! Keyboard input handling for the dashboard.
//!
//! Translates key events into high-level actions and applies those actions
//! to the application state. Keys are interpreted in three layers: an open
//! form captures almost everything, a pending confirmation only listens for
//! yes/no, and otherwise the normal shortcut map applies.
//!
//! # Key Bindings
//!
//! | Key       | Action              |
//! |-----------|---------------------|
//! | `q`       | Quit                |
//! | `m`       | Start/stop measuring|
//! | `l`       | Start/stop logging  |
//! | `s`       | Save log            |
//! | `o`       | Open saved log      |
//! | `a`       | Add device          |
//! | `d`       | Remove device       |
//! | `e`       | Device settings     |
//! | `p`       | Preferences         |
//! | `↓` / `j` | Select next         |
//! | `↑` / `k` | Select previous     |
//! | `?`       | Toggle help         |

use std::time::Instant;

use crossterm::event::KeyCode;

use super::app::App;

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Start or stop the measurement loop.
    ToggleMeasurement,
    /// Start or stop log recording.
    ToggleLogging,
    /// Open the save-log form.
    SaveLog,
    /// Open the last saved log with the office program.
    OpenLog,
    /// Open the add-device form.
    AddDevice,
    /// Remove the selected device.
    RemoveDevice,
    /// Open the settings form for the selected device.
    EditDevice,
    /// Open the preferences form.
    Preferences,
    /// Select the next device.
    SelectNext,
    /// Select the previous device.
    SelectPrevious,
    /// Toggle the help overlay.
    ToggleHelp,
    /// Close the help overlay.
    DismissOverlay,
    /// Confirm pending action.
    Confirm,
    /// Cancel pending action.
    Cancel,
    /// Input character for the focused form field.
    FormInput(char),
    /// Backspace in the focused form field.
    FormBackspace,
    /// Focus the next form field.
    FormNext,
    /// Focus the previous form field.
    FormPrev,
    /// Cycle the focused choice field backward.
    FormLeft,
    /// Cycle the focused choice field forward.
    FormRight,
    /// Submit the open form.
    FormSubmit,
    /// Close the open form without applying it.
    FormCancel,
    /// No action (unrecognized key).
    None,
}

/// Map a key code to an action.
///
/// `in_form` and `has_pending_confirmation` select the key layer; an open
/// form wins over a confirmation, which wins over the shortcut map.
pub fn handle_key(key: KeyCode, in_form: bool, has_pending_confirmation: bool) -> Action {
    // A form captures text input, so most keys become form actions
    if in_form {
        return match key {
            KeyCode::Enter => Action::FormSubmit,
            KeyCode::Esc => Action::FormCancel,
            KeyCode::Backspace => Action::FormBackspace,
            KeyCode::Tab | KeyCode::Down => Action::FormNext,
            KeyCode::BackTab | KeyCode::Up => Action::FormPrev,
            KeyCode::Left => Action::FormLeft,
            KeyCode::Right => Action::FormRight,
            KeyCode::Char(c) => Action::FormInput(c),
            _ => Action::None,
        };
    }

    // When a confirmation dialog is active, only handle Y/N keys
    if has_pending_confirmation {
        return match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => Action::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::Cancel,
            _ => Action::None,
        };
    }

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('m') => Action::ToggleMeasurement,
        KeyCode::Char('l') => Action::ToggleLogging,
        KeyCode::Char('s') => Action::SaveLog,
        KeyCode::Char('o') => Action::OpenLog,
        KeyCode::Char('a') => Action::AddDevice,
        KeyCode::Char('d') => Action::RemoveDevice,
        KeyCode::Char('e') => Action::EditDevice,
        KeyCode::Char('p') => Action::Preferences,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrevious,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Esc => Action::DismissOverlay,
        _ => Action::None,
    }
}

/// Apply an action to the application state.
pub fn apply_action(app: &mut App, action: Action) {
    match action {
        Action::Quit => app.should_quit = true,
        Action::ToggleMeasurement => app.toggle_measurement(),
        Action::ToggleLogging => app.toggle_logging(Instant::now()),
        Action::SaveLog => app.request_save(),
        Action::OpenLog => app.open_saved_log(),
        Action::AddDevice => app.request_add_device(),
        Action::RemoveDevice => app.request_remove_device(),
        Action::EditDevice => app.request_edit_device(),
        Action::Preferences => app.request_preferences(),
        Action::SelectNext => app.select_next(),
        Action::SelectPrevious => app.select_previous(),
        Action::ToggleHelp => app.show_help = !app.show_help,
        Action::DismissOverlay => app.show_help = false,
        Action::Confirm => app.confirm_action(Instant::now()),
        Action::Cancel => app.cancel_confirmation(),
        Action::FormInput(c) => app.form_input(c),
        Action::FormBackspace => app.form_backspace(),
        Action::FormNext => app.form_next(),
        Action::FormPrev => app.form_prev(),
        Action::FormLeft => app.form_left(),
        Action::FormRight => app.form_right(),
        Action::FormSubmit => app.submit_form(),
        Action::FormCancel => app.form = None,
        Action::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_shortcut_map() {
        assert_eq!(handle_key(KeyCode::Char('q'), false, false), Action::Quit);
        assert_eq!(
            handle_key(KeyCode::Char('m'), false, false),
            Action::ToggleMeasurement
        );
        assert_eq!(
            handle_key(KeyCode::Char('j'), false, false),
            Action::SelectNext
        );
        assert_eq!(handle_key(KeyCode::F(5), false, false), Action::None);
    }

    #[test]
    fn test_form_captures_shortcut_characters() {
        assert_eq!(
            handle_key(KeyCode::Char('q'), true, false),
            Action::FormInput('q')
        );
        assert_eq!(handle_key(KeyCode::Enter, true, false), Action::FormSubmit);
        assert_eq!(handle_key(KeyCode::Tab, true, false), Action::FormNext);
        assert_eq!(handle_key(KeyCode::Esc, true, false), Action::FormCancel);
    }

    #[test]
    fn test_confirmation_only_listens_for_yes_no() {
        assert_eq!(handle_key(KeyCode::Char('y'), false, true), Action::Confirm);
        assert_eq!(handle_key(KeyCode::Char('N'), false, true), Action::Cancel);
        assert_eq!(handle_key(KeyCode::Esc, false, true), Action::Cancel);
        assert_eq!(handle_key(KeyCode::Char('q'), false, true), Action::None);
    }
}
