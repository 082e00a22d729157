//! Modal form state for the dashboard dialogs.
//!
//! Each dialog keeps its draft in one of these structs while it is open.
//! Text fields hold raw strings and are only parsed on submit, so a
//! half-typed number never corrupts the live entry; a failed parse keeps
//! the form open with everything the user typed.

use std::path::PathBuf;

use mvlog_core::{CalibrationSettings, DeviceConfig, DeviceTypeInfo, DisplayEntry};
use mvlog_types::{CalibrationMode, DeviceId, LinearCalibration, TwoPointCalibration};
use time::OffsetDateTime;

use crate::config::{Config, Language};

/// The dialog currently open, if any.
pub enum Form {
    AddDevice(AddDeviceForm),
    AssignChannels(ChannelAssignForm),
    DeviceSettings(DeviceSettingsForm),
    SaveLog(SaveLogForm),
    Preferences(PreferencesForm),
}

impl Form {
    /// Dialog title shown in the overlay border.
    pub fn title(&self) -> &'static str {
        match self {
            Self::AddDevice(_) => " Add Device ",
            Self::AssignChannels(_) => " Assign Channels ",
            Self::DeviceSettings(_) => " Device Settings ",
            Self::SaveLog(_) => " Save Log ",
            Self::Preferences(_) => " Preferences ",
        }
    }

    pub fn next_field(&mut self) {
        match self {
            Self::AddDevice(form) => form.focus = (form.focus + 1) % AddDeviceForm::FIELDS,
            Self::AssignChannels(form) => {
                form.focus = (form.focus + 1) % form.assignments.len().max(1);
            }
            Self::DeviceSettings(form) => {
                form.focus = (form.focus + 1) % DeviceSettingsForm::FIELDS;
            }
            Self::SaveLog(_) => {}
            Self::Preferences(form) => form.focus = (form.focus + 1) % PreferencesForm::FIELDS,
        }
    }

    pub fn prev_field(&mut self) {
        match self {
            Self::AddDevice(form) => {
                form.focus = wrap_back(form.focus, AddDeviceForm::FIELDS);
            }
            Self::AssignChannels(form) => {
                form.focus = wrap_back(form.focus, form.assignments.len().max(1));
            }
            Self::DeviceSettings(form) => {
                form.focus = wrap_back(form.focus, DeviceSettingsForm::FIELDS);
            }
            Self::SaveLog(_) => {}
            Self::Preferences(form) => form.focus = wrap_back(form.focus, PreferencesForm::FIELDS),
        }
    }

    pub fn cycle_left(&mut self) {
        match self {
            Self::AddDevice(form) => form.cycle(-1),
            Self::AssignChannels(form) => form.cycle(-1),
            Self::DeviceSettings(form) => form.toggle_mode(),
            Self::SaveLog(_) => {}
            Self::Preferences(form) => form.cycle_language(),
        }
    }

    pub fn cycle_right(&mut self) {
        match self {
            Self::AddDevice(form) => form.cycle(1),
            Self::AssignChannels(form) => form.cycle(1),
            Self::DeviceSettings(form) => form.toggle_mode(),
            Self::SaveLog(_) => {}
            Self::Preferences(form) => form.cycle_language(),
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(field) = self.text_field_mut() {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.text_field_mut() {
            field.pop();
        }
    }

    /// The text field under the focus, if the focused row is editable.
    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::AddDevice(_) | Self::AssignChannels(_) => None,
            Self::DeviceSettings(form) => form.text_field_mut(),
            Self::SaveLog(form) => Some(&mut form.filename),
            Self::Preferences(form) => form.text_field_mut(),
        }
    }
}

fn wrap_back(focus: usize, fields: usize) -> usize {
    focus.checked_sub(1).unwrap_or(fields - 1)
}

/// Step an index through `len` slots in either direction, wrapping.
fn step(current: usize, len: usize, direction: isize) -> usize {
    if len == 0 {
        return 0;
    }
    if direction < 0 {
        current.checked_sub(1).unwrap_or(len - 1)
    } else {
        (current + 1) % len
    }
}

/// Draft for opening a new device: pick a type and a free port.
pub struct AddDeviceForm {
    /// Types the manager can open, in its own order.
    pub types: Vec<DeviceTypeInfo>,
    pub type_index: usize,
    /// Free ports at the moment the form was opened.
    pub ports: Vec<String>,
    pub port_index: usize,
    /// 0 = type row, 1 = port row.
    pub focus: usize,
}

impl AddDeviceForm {
    pub const FIELDS: usize = 2;

    pub fn new(types: Vec<DeviceTypeInfo>, ports: Vec<String>) -> Self {
        Self {
            types,
            type_index: 0,
            ports,
            port_index: 0,
            focus: 0,
        }
    }

    pub fn selected_type(&self) -> &DeviceTypeInfo {
        &self.types[self.type_index]
    }

    pub fn selected_port(&self) -> &str {
        &self.ports[self.port_index]
    }

    /// The device configuration this draft describes.
    pub fn config(&self) -> DeviceConfig {
        DeviceConfig::port(&self.selected_type().name, self.selected_port())
    }

    fn cycle(&mut self, direction: isize) {
        match self.focus {
            0 => self.type_index = step(self.type_index, self.types.len(), direction),
            _ => self.port_index = step(self.port_index, self.ports.len(), direction),
        }
    }
}

/// Draft for populating a freshly opened multibox: one row per channel,
/// each cycling through "unassigned" and the standalone device types.
pub struct ChannelAssignForm {
    pub parent: DeviceId,
    pub parent_label: String,
    /// Names of the assignable (non-multibox) device types.
    pub type_names: Vec<String>,
    /// Per channel, an index into `type_names`, or `None` to leave it empty.
    pub assignments: Vec<Option<usize>>,
    /// Focused channel row.
    pub focus: usize,
}

impl ChannelAssignForm {
    pub fn new(
        parent: DeviceId,
        parent_label: String,
        type_names: Vec<String>,
        channels: u8,
    ) -> Self {
        Self {
            parent,
            parent_label,
            type_names,
            assignments: vec![None; channels as usize],
            focus: 0,
        }
    }

    /// A channel config per assigned row. Channel numbers are one-based.
    pub fn configs(&self) -> Vec<DeviceConfig> {
        self.assignments
            .iter()
            .enumerate()
            .filter_map(|(slot, assignment)| {
                assignment.map(|type_index| {
                    DeviceConfig::channel(
                        self.type_names[type_index].clone(),
                        self.parent,
                        (slot + 1) as u8,
                    )
                })
            })
            .collect()
    }

    fn cycle(&mut self, direction: isize) {
        let slot = &mut self.assignments[self.focus];
        let states = self.type_names.len() + 1;
        let current = slot.map_or(0, |index| index + 1);
        let next = step(current, states, direction);
        *slot = next.checked_sub(1);
    }
}

/// Draft for the per-device settings dialog: calibration parameters in both
/// modes, plus the unit override.
pub struct DeviceSettingsForm {
    pub id: DeviceId,
    /// Entry label, shown in the dialog for orientation.
    pub label: String,
    pub mode: CalibrationMode,
    pub slope: String,
    pub intercept: String,
    pub measured_1: String,
    pub reference_1: String,
    pub measured_2: String,
    pub reference_2: String,
    pub unit: String,
    pub focus: usize,
}

impl DeviceSettingsForm {
    /// Focus order: mode, slope, intercept, measured 1, read 1,
    /// reference 1, measured 2, read 2, reference 2, unit.
    pub const FIELDS: usize = 10;
    pub const READ_POINT_1: usize = 4;
    pub const READ_POINT_2: usize = 7;

    pub fn from_entry(entry: &DisplayEntry) -> Self {
        let calibration = &entry.calibration;
        Self {
            id: entry.id,
            label: entry.label.clone(),
            mode: calibration.mode,
            slope: calibration.linear.slope.to_string(),
            intercept: calibration.linear.intercept.to_string(),
            measured_1: calibration.two_point.first.measured.to_string(),
            reference_1: calibration.two_point.first.reference.to_string(),
            measured_2: calibration.two_point.second.measured.to_string(),
            reference_2: calibration.two_point.second.reference.to_string(),
            unit: entry.unit_override.clone().unwrap_or_default(),
            focus: 0,
        }
    }

    /// Which calibration point a "read current value" row refers to.
    pub fn capture_point(&self) -> Option<usize> {
        match self.focus {
            Self::READ_POINT_1 => Some(0),
            Self::READ_POINT_2 => Some(1),
            _ => None,
        }
    }

    /// Store a captured raw reading in the measured field of `point`.
    pub fn set_measured(&mut self, point: usize, value: f64) {
        let field = if point == 0 {
            &mut self.measured_1
        } else {
            &mut self.measured_2
        };
        *field = value.to_string();
    }

    fn toggle_mode(&mut self) {
        if self.focus == 0 {
            self.mode = match self.mode {
                CalibrationMode::SlopeIntercept => CalibrationMode::TwoPoint,
                CalibrationMode::TwoPoint => CalibrationMode::SlopeIntercept,
            };
        }
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            1 => Some(&mut self.slope),
            2 => Some(&mut self.intercept),
            3 => Some(&mut self.measured_1),
            5 => Some(&mut self.reference_1),
            6 => Some(&mut self.measured_2),
            8 => Some(&mut self.reference_2),
            9 => Some(&mut self.unit),
            _ => None,
        }
    }

    /// Parse the draft into storable settings.
    ///
    /// Every numeric field must parse regardless of the selected mode, and
    /// two-point parameters are additionally checked for distinct measured
    /// values when that mode is active. The error string is ready for the
    /// status bar.
    pub fn parse(&self) -> Result<(CalibrationSettings, Option<String>), String> {
        let slope = parse_number("Slope", &self.slope)?;
        let intercept = parse_number("Intercept", &self.intercept)?;
        let measured_1 = parse_number("Point 1 measured", &self.measured_1)?;
        let reference_1 = parse_number("Point 1 reference", &self.reference_1)?;
        let measured_2 = parse_number("Point 2 measured", &self.measured_2)?;
        let reference_2 = parse_number("Point 2 reference", &self.reference_2)?;

        let two_point = TwoPointCalibration::from_pairs(
            (measured_1, reference_1),
            (measured_2, reference_2),
        );
        if self.mode == CalibrationMode::TwoPoint {
            two_point.to_linear().map_err(|e| e.to_string())?;
        }

        let settings = CalibrationSettings {
            mode: self.mode,
            linear: LinearCalibration::new(slope, intercept),
            two_point,
        };
        let unit = self.unit.trim();
        let unit = (!unit.is_empty()).then(|| unit.to_owned());
        Ok((settings, unit))
    }
}

/// Draft for the save-log dialog: just the target file name.
pub struct SaveLogForm {
    pub filename: String,
}

impl SaveLogForm {
    /// Prefill with a dated name like `mvlog-2026-08-22.csv`.
    pub fn with_default_name() -> Self {
        let date = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date();
        Self {
            filename: format!(
                "mvlog-{:04}-{:02}-{:02}.csv",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
        }
    }
}

/// Draft for the preferences dialog.
pub struct PreferencesForm {
    pub interval_secs: String,
    pub office_program: String,
    pub language: Language,
    /// 0 = interval, 1 = office program, 2 = language.
    pub focus: usize,
}

/// Parsed preferences, ready to store in the config.
pub struct Preferences {
    pub interval_secs: u64,
    pub office_program: Option<PathBuf>,
    pub language: Language,
}

impl PreferencesForm {
    pub const FIELDS: usize = 3;

    pub fn from_config(config: &Config) -> Self {
        Self {
            interval_secs: config.logging.interval_secs.to_string(),
            office_program: config
                .office
                .program
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            language: config.ui.language,
            focus: 0,
        }
    }

    fn cycle_language(&mut self) {
        if self.focus == 2 {
            self.language = self.language.next();
        }
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            0 => Some(&mut self.interval_secs),
            1 => Some(&mut self.office_program),
            _ => None,
        }
    }

    /// Parse the draft. The interval is floored at one second; a blank
    /// office program clears the setting.
    pub fn parse(&self) -> Result<Preferences, String> {
        let interval = self.interval_secs.trim();
        let interval: u64 = interval
            .parse()
            .map_err(|_| format!("Interval is not a whole number of seconds: '{interval}'"))?;
        let program = self.office_program.trim();
        let program = (!program.is_empty()).then(|| PathBuf::from(program));
        Ok(Preferences {
            interval_secs: interval.max(1),
            office_program: program,
            language: self.language,
        })
    }
}

fn parse_number(field: &str, input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| format!("{field} is not a number: '{trimmed}'"))
}
