//! Application state for the dashboard.
//!
//! [`App`] owns the monitor, the loaded configuration, and the transient UI
//! state (selection, status messages, open dialog, pending confirmation).
//! The event loop calls [`App::on_tick`] every poll period and routes key
//! actions into the methods below; nothing here blocks.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mvlog_core::{
    DeviceManager, DisplayEntry, Error, Monitor, force_csv_extension, open_log_file,
};
use mvlog_types::DeviceId;

use crate::config::Config;
use crate::forms::{
    AddDeviceForm, ChannelAssignForm, DeviceSettingsForm, Form, PreferencesForm, SaveLogForm,
};

/// Actions that require a yes/no confirmation before executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Throw away the unsaved log buffer and start a new recording.
    DiscardLog,
    /// Close the selected device.
    RemoveDevice { id: DeviceId, label: String },
    /// Replace an existing file with the log buffer.
    OverwriteFile { path: PathBuf },
}

/// Main application state for the dashboard.
pub struct App {
    /// Monitor that owns the device manager, the registry, and the log.
    pub monitor: Monitor,
    /// Loaded configuration.
    pub config: Config,
    /// Where the configuration is persisted.
    pub config_path: PathBuf,
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Index of the currently selected dashboard entry.
    pub selected: usize,
    /// Queue of status messages with their creation time.
    pub status_messages: Vec<(String, Instant)>,
    /// How long to show each status message (in seconds).
    pub status_message_timeout: u64,
    /// Whether to show the help overlay.
    pub show_help: bool,
    /// Action awaiting a yes/no confirmation.
    pub pending_confirmation: Option<PendingAction>,
    /// The dialog currently open, if any.
    pub form: Option<Form>,
    /// Where the last log was saved, for the open-log shortcut.
    pub last_saved: Option<PathBuf>,
}

impl App {
    /// Create the application state around a device manager.
    pub fn new(manager: Box<dyn DeviceManager>, config: Config, config_path: PathBuf) -> Self {
        let monitor = Monitor::new(manager, config.logging_interval());
        Self {
            monitor,
            config,
            config_path,
            should_quit: false,
            selected: 0,
            status_messages: Vec::new(),
            status_message_timeout: 5, // 5 seconds
            show_help: false,
            pending_confirmation: None,
            form: None,
            last_saved: None,
        }
    }

    /// Returns whether the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Add a status message to the queue.
    pub fn push_status_message(&mut self, message: String) {
        self.status_messages.push((message, Instant::now()));
        // Keep at most 5 messages
        while self.status_messages.len() > 5 {
            self.status_messages.remove(0);
        }
    }

    /// Remove expired status messages.
    pub fn clean_expired_messages(&mut self) {
        let timeout = Duration::from_secs(self.status_message_timeout);
        self.status_messages
            .retain(|(_, created)| created.elapsed() < timeout);
    }

    /// Get the current status message to display.
    pub fn current_status_message(&self) -> Option<&str> {
        self.status_messages.last().map(|(msg, _)| msg.as_str())
    }

    /// Advance the monitor by one poll period and absorb its report.
    pub fn on_tick(&mut self, now: Instant) {
        let report = self.monitor.tick(now);
        for id in report.removed {
            self.push_status_message(format!("Device {id} was removed"));
        }
        self.clamp_selection();
        self.clean_expired_messages();
    }

    /// The dashboard entry under the selection cursor.
    pub fn selected_entry(&self) -> Option<&DisplayEntry> {
        self.monitor.registry().iter().nth(self.selected)
    }

    /// Select the next dashboard entry, wrapping at the end.
    pub fn select_next(&mut self) {
        let len = self.monitor.registry().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Select the previous dashboard entry, wrapping at the start.
    pub fn select_previous(&mut self) {
        let len = self.monitor.registry().len();
        if len > 0 {
            self.selected = self.selected.checked_sub(1).unwrap_or(len - 1);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.monitor.registry().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // --- Measurement and logging ---

    /// Start or stop the measurement loop.
    pub fn toggle_measurement(&mut self) {
        if self.monitor.is_running() {
            self.monitor.stop_measurement();
            self.push_status_message("Measurement stopped".to_string());
        } else {
            self.monitor.start_measurement();
            self.push_status_message("Measurement started".to_string());
        }
    }

    /// Start or stop log recording.
    ///
    /// Starting over an unsaved buffer asks for confirmation first, since a
    /// new recording replaces the buffered rows.
    pub fn toggle_logging(&mut self, now: Instant) {
        if self.monitor.is_logging() {
            self.monitor.stop_logging();
            self.push_status_message(format!(
                "Logging stopped, {} row(s) buffered",
                self.monitor.log_row_count()
            ));
        } else if self.monitor.has_unsaved_log() {
            self.pending_confirmation = Some(PendingAction::DiscardLog);
        } else {
            self.monitor.start_logging(now);
            self.push_status_message("Logging started".to_string());
        }
    }

    /// Open the save-log form, unless there is nothing to save.
    pub fn request_save(&mut self) {
        if self.monitor.is_logging() {
            self.push_status_message("Stop logging before saving".to_string());
            return;
        }
        if !self.monitor.has_unsaved_log() {
            self.push_status_message(Error::NoLogRecorded.to_string());
            return;
        }
        self.form = Some(Form::SaveLog(SaveLogForm::with_default_name()));
    }

    fn submit_save(&mut self, form: SaveLogForm) {
        let name = form.filename.trim();
        if name.is_empty() {
            self.push_status_message("File name must not be empty".to_string());
            self.form = Some(Form::SaveLog(form));
            return;
        }
        let path = force_csv_extension(Path::new(name));
        if path.exists() {
            self.pending_confirmation = Some(PendingAction::OverwriteFile { path });
        } else {
            self.write_log(&path);
        }
    }

    fn write_log(&mut self, path: &Path) {
        match self.monitor.save_log(path) {
            Ok(written) => {
                self.push_status_message(format!("Log saved to {}", written.display()));
                self.last_saved = Some(written);
            }
            Err(err) => self.push_status_message(err.to_string()),
        }
    }

    /// Hand the last saved log to the configured office program.
    pub fn open_saved_log(&mut self) {
        let Some(path) = self.last_saved.clone() else {
            self.push_status_message("No saved log to open".to_string());
            return;
        };
        let Some(program) = self.config.office.program.clone() else {
            self.push_status_message("No office program configured, see preferences".to_string());
            return;
        };
        match open_log_file(&program, &path) {
            Ok(_) => self.push_status_message(format!("Opened {}", path.display())),
            Err(err) => self.push_status_message(err.to_string()),
        }
    }

    // --- Device management ---

    /// Open the add-device form. Blocked while measuring.
    pub fn request_add_device(&mut self) {
        if self.monitor.is_running() {
            self.push_status_message("Stop measurement before adding devices".to_string());
            return;
        }
        let types = self.monitor.manager().valid_device_types();
        let ports = self.monitor.manager().available_ports();
        if types.is_empty() {
            self.push_status_message("The device manager offers no device types".to_string());
            return;
        }
        if ports.is_empty() {
            self.push_status_message("No free ports".to_string());
            return;
        }
        self.form = Some(Form::AddDevice(AddDeviceForm::new(types, ports)));
    }

    fn submit_add_device(&mut self, form: AddDeviceForm) {
        let config = form.config();
        match self.monitor.add_device(&config) {
            Ok(id) => {
                if let Some(channels) = form.selected_type().multibox_channels {
                    // A multibox carries no probe itself; follow up with
                    // the channel assignment dialog.
                    let label = self
                        .monitor
                        .manager()
                        .describe_device(id)
                        .unwrap_or_else(|| id.to_string());
                    let type_names = form
                        .types
                        .iter()
                        .filter(|info| !info.is_multibox())
                        .map(|info| info.name.clone())
                        .collect();
                    self.form = Some(Form::AssignChannels(ChannelAssignForm::new(
                        id, label, type_names, channels,
                    )));
                } else {
                    let label = self
                        .monitor
                        .registry()
                        .get(id)
                        .map(|entry| entry.label.clone())
                        .unwrap_or_else(|| id.to_string());
                    self.push_status_message(format!("Added {label}"));
                }
            }
            Err(err) => {
                self.push_status_message(err.to_string());
                self.form = Some(Form::AddDevice(form));
            }
        }
    }

    fn submit_assign_channels(&mut self, form: ChannelAssignForm) {
        let configs = form.configs();
        if configs.is_empty() {
            self.push_status_message(format!(
                "No channels assigned, {} will be released",
                form.parent_label
            ));
            return;
        }
        let mut added = 0;
        for config in &configs {
            match self.monitor.add_device(config) {
                Ok(_) => added += 1,
                Err(err) => self.push_status_message(err.to_string()),
            }
        }
        self.push_status_message(format!(
            "Assigned {added} channel(s) on {}",
            form.parent_label
        ));
    }

    /// Ask to close the selected device. Blocked while measuring.
    pub fn request_remove_device(&mut self) {
        if self.monitor.is_running() {
            self.push_status_message("Stop measurement before removing devices".to_string());
            return;
        }
        let Some(entry) = self.selected_entry() else {
            self.push_status_message("No device selected".to_string());
            return;
        };
        let id = entry.id;
        let label = entry.label.clone();
        self.pending_confirmation = Some(PendingAction::RemoveDevice { id, label });
    }

    /// Open the settings form for the selected device.
    pub fn request_edit_device(&mut self) {
        let Some(entry) = self.selected_entry() else {
            self.push_status_message("No device selected".to_string());
            return;
        };
        self.form = Some(Form::DeviceSettings(DeviceSettingsForm::from_entry(entry)));
    }

    fn submit_device_settings(&mut self, form: DeviceSettingsForm) {
        match form.parse() {
            Ok((settings, unit)) => {
                if let Some(entry) = self.monitor.registry_mut().get_mut(form.id) {
                    entry.calibration = settings;
                    entry.unit_override = unit;
                    self.push_status_message(format!("Updated {}", entry.label));
                } else {
                    self.push_status_message("Device is no longer connected".to_string());
                }
            }
            Err(message) => {
                self.push_status_message(message);
                self.form = Some(Form::DeviceSettings(form));
            }
        }
    }

    fn capture_reading(&mut self, form: &mut DeviceSettingsForm, point: usize) {
        match self.monitor.manager().last_raw_value(form.id) {
            Some(sample) => {
                form.set_measured(point, sample.value);
                self.push_status_message(format!("Captured {sample}"));
            }
            None => self.push_status_message("No reading available to capture".to_string()),
        }
    }

    // --- Preferences ---

    /// Open the preferences form.
    pub fn request_preferences(&mut self) {
        self.form = Some(Form::Preferences(PreferencesForm::from_config(
            &self.config,
        )));
    }

    fn submit_preferences(&mut self, form: PreferencesForm) {
        match form.parse() {
            Ok(prefs) => {
                self.config.logging.interval_secs = prefs.interval_secs;
                self.config.office.program = prefs.office_program;
                self.config.ui.language = prefs.language;
                self.monitor
                    .set_logging_interval(self.config.logging_interval());
                match self.config.save_to(&self.config_path) {
                    Ok(()) => self.push_status_message("Preferences saved".to_string()),
                    Err(err) => self.push_status_message(format!("{err:#}")),
                }
            }
            Err(message) => {
                self.push_status_message(message);
                self.form = Some(Form::Preferences(form));
            }
        }
    }

    // --- Forms and confirmations ---

    /// Submit the open form.
    ///
    /// In the device settings dialog, Enter on a "read current value" row
    /// captures a reading instead of submitting.
    pub fn submit_form(&mut self) {
        match self.form.take() {
            Some(Form::AddDevice(form)) => self.submit_add_device(form),
            Some(Form::AssignChannels(form)) => self.submit_assign_channels(form),
            Some(Form::DeviceSettings(mut form)) => {
                if let Some(point) = form.capture_point() {
                    self.capture_reading(&mut form, point);
                    self.form = Some(Form::DeviceSettings(form));
                } else {
                    self.submit_device_settings(form);
                }
            }
            Some(Form::SaveLog(form)) => self.submit_save(form),
            Some(Form::Preferences(form)) => self.submit_preferences(form),
            None => {}
        }
    }

    pub fn form_input(&mut self, c: char) {
        if let Some(form) = &mut self.form {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = &mut self.form {
            form.backspace();
        }
    }

    pub fn form_next(&mut self) {
        if let Some(form) = &mut self.form {
            form.next_field();
        }
    }

    pub fn form_prev(&mut self) {
        if let Some(form) = &mut self.form {
            form.prev_field();
        }
    }

    pub fn form_left(&mut self) {
        if let Some(form) = &mut self.form {
            form.cycle_left();
        }
    }

    pub fn form_right(&mut self) {
        if let Some(form) = &mut self.form {
            form.cycle_right();
        }
    }

    /// Execute the pending confirmation.
    pub fn confirm_action(&mut self, now: Instant) {
        match self.pending_confirmation.take() {
            Some(PendingAction::DiscardLog) => {
                self.monitor.start_logging(now);
                self.push_status_message("Logging restarted, previous rows discarded".to_string());
            }
            Some(PendingAction::RemoveDevice { id, label }) => {
                match self.monitor.remove_device(id) {
                    Ok(()) => self.push_status_message(format!("Removed {label}")),
                    Err(err) => self.push_status_message(err.to_string()),
                }
            }
            Some(PendingAction::OverwriteFile { path }) => self.write_log(&path),
            None => {}
        }
    }

    /// Drop the pending confirmation without executing it.
    pub fn cancel_confirmation(&mut self) {
        self.pending_confirmation = None;
    }
}
