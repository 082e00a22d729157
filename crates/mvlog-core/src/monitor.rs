//! The polling loop behind the dashboard.
//!
//! [`Monitor`] owns a [`DeviceManager`] and the [`Registry`] of display
//! entries, and advances both on every [`tick`](Monitor::tick): vanished
//! devices are dropped, fresh samples are pulled into their entries, and a
//! CSV row is appended whenever one is due. Ticks take the current instant
//! as a parameter, so a test can replay any timeline it likes.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mvlog_types::{DeviceId, Sample};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::log::LogSession;
use crate::manager::{DeviceConfig, DeviceManager};
use crate::registry::{DisplayEntry, Registry};

/// What a single [`Monitor::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Display entries dropped because their device vanished.
    pub removed: Vec<DeviceId>,
    /// Whether a CSV row was appended to the running log.
    pub row_appended: bool,
}

/// Drives sampling, display state, and logging for one device manager.
pub struct Monitor {
    manager: Box<dyn DeviceManager>,
    registry: Registry,
    logging_interval: Duration,
    session: Option<LogSession>,
    logging: bool,
}

impl Monitor {
    /// A monitor over `manager` that appends log rows every
    /// `logging_interval`.
    #[must_use]
    pub fn new(manager: Box<dyn DeviceManager>, logging_interval: Duration) -> Self {
        Self {
            manager,
            registry: Registry::new(),
            logging_interval,
            session: None,
            logging: false,
        }
    }

    /// The underlying device manager.
    #[must_use]
    pub fn manager(&self) -> &dyn DeviceManager {
        self.manager.as_ref()
    }

    /// The underlying device manager, for configuration calls.
    pub fn manager_mut(&mut self) -> &mut dyn DeviceManager {
        self.manager.as_mut()
    }

    /// The display entries in their fixed order.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the display entries, for editing labels and
    /// calibration settings.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The interval between appended log rows.
    #[must_use]
    pub fn logging_interval(&self) -> Duration {
        self.logging_interval
    }

    /// Change the log row interval. Takes effect from the next due check.
    pub fn set_logging_interval(&mut self, interval: Duration) {
        self.logging_interval = interval;
    }

    // --- Devices ---

    /// Open a device and, unless it is a multibox carrier, give it a
    /// display entry.
    ///
    /// Multibox parents hold subdevices but measure nothing themselves, so
    /// only their assigned channels appear on the dashboard.
    ///
    /// # Errors
    ///
    /// Fails when the manager rejects the configuration.
    pub fn add_device(&mut self, config: &DeviceConfig) -> Result<DeviceId> {
        let id = self.manager.open_device(config)?;
        if !self.is_multibox_type(config.device_type()) {
            self.register_entry(id);
        }
        Ok(id)
    }

    /// Close a device and drop its display entry.
    ///
    /// # Errors
    ///
    /// Fails when no device with the identifier is open.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<()> {
        self.manager.close_device(id)?;
        self.registry.remove(id);
        info!(%id, "device removed");
        Ok(())
    }

    fn is_multibox_type(&self, name: &str) -> bool {
        self.manager
            .valid_device_types()
            .iter()
            .any(|info| info.is_multibox() && info.name == name)
    }

    fn register_entry(&mut self, id: DeviceId) {
        let label = self
            .manager
            .describe_device(id)
            .unwrap_or_else(|| id.to_string());
        debug!(%id, label, "display entry registered");
        self.registry.insert(DisplayEntry::new(id, label));
    }

    // --- Measurement ---

    /// Start sampling on all open devices.
    pub fn start_measurement(&mut self) {
        self.manager.start();
        info!("measurement started");
    }

    /// Stop sampling. Entries keep showing their last value.
    pub fn stop_measurement(&mut self) {
        self.manager.stop();
        info!("measurement stopped");
    }

    /// Whether sampling is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.manager.is_running()
    }

    // --- Logging ---

    /// Begin a fresh log session at `now`, discarding any previous buffer.
    ///
    /// Callers confirm the discard with the user first when
    /// [`has_unsaved_log`](Self::has_unsaved_log) says there is something
    /// to lose.
    pub fn start_logging(&mut self, now: Instant) {
        self.session = Some(LogSession::begin(now));
        self.logging = true;
        info!(interval = ?self.logging_interval, "logging started");
    }

    /// Stop appending rows. The buffer stays available for a save.
    pub fn stop_logging(&mut self) {
        self.logging = false;
        info!("logging stopped");
    }

    /// Whether rows are currently being appended.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.logging
    }

    /// Whether a log buffer with at least one row is waiting to be saved.
    #[must_use]
    pub fn has_unsaved_log(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.is_empty())
    }

    /// The buffered CSV text, if a session exists.
    #[must_use]
    pub fn log_buffer(&self) -> Option<&str> {
        self.session.as_ref().map(LogSession::buffer)
    }

    /// Number of rows in the current buffer.
    #[must_use]
    pub fn log_row_count(&self) -> usize {
        self.session.as_ref().map_or(0, LogSession::row_count)
    }

    /// Write the buffered rows to `path` and clear the buffer.
    ///
    /// Returns the path actually written, which may have gained a `.csv`
    /// extension. A failed write leaves the buffer in place so the save
    /// can be retried.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NoLogRecorded`] when no row has been recorded,
    /// or with [`Error::LogWrite`] when the file cannot be written.
    pub fn save_log(&mut self, path: &Path) -> Result<PathBuf> {
        if !self.has_unsaved_log() {
            return Err(Error::NoLogRecorded);
        }
        let session = self.session.take().ok_or(Error::NoLogRecorded)?;
        match session.save_to(path) {
            Ok(written) => {
                self.logging = false;
                Ok(written)
            }
            Err(err) => {
                self.session = Some(session);
                Err(err)
            }
        }
    }

    // --- Ticking ---

    /// Advance one poll cycle at `now`.
    ///
    /// Reconciles the registry against the manager, refreshes every
    /// entry's latest sample while measurement runs, and appends a CSV row
    /// when logging and one is due. Entries that have never produced a
    /// sample log `0`.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let removed = self.registry.reconcile(self.manager.as_mut());
        let mut row_appended = false;

        if self.manager.is_running() {
            for entry in self.registry.iter_mut() {
                let calibration = entry.calibration.active();
                if let Some(sample) = self.manager.calibrated_last_raw_value(
                    entry.id,
                    &calibration,
                    entry.unit_override.as_deref(),
                ) {
                    entry.last = Some(sample);
                }
            }

            if self.logging
                && let Some(session) = self.session.as_mut()
                && session.row_due(now, self.logging_interval)
            {
                let values: Vec<f64> = self
                    .registry
                    .iter()
                    .map(|entry| entry.last.as_ref().map_or(0.0, Sample::base_value))
                    .collect();
                session.append_row(&values, now);
                row_appended = true;
            }
        }

        TickReport {
            removed,
            row_appended,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mvlog_types::{LinearCalibration, MetricPrefix};

    use super::*;
    use crate::manager::DeviceTypeInfo;
    use crate::registry::CalibrationSettings;

    #[derive(Debug, Default)]
    struct StubManager {
        ids: Vec<DeviceId>,
        samples: BTreeMap<DeviceId, Sample>,
        next_id: u32,
        running: bool,
    }

    impl StubManager {
        fn with_sample(value: f64, prefix: MetricPrefix, unit: &str) -> (Self, DeviceId) {
            let id = DeviceId::new(1);
            let mut samples = BTreeMap::new();
            samples.insert(id, Sample::new(value, prefix, unit));
            let manager = Self {
                ids: vec![id],
                samples,
                next_id: 2,
                running: false,
            };
            (manager, id)
        }
    }

    impl DeviceManager for StubManager {
        fn valid_device_types(&self) -> Vec<DeviceTypeInfo> {
            vec![
                DeviceTypeInfo::standalone("meter"),
                DeviceTypeInfo::multibox("mux", 3),
            ]
        }

        fn available_ports(&self) -> Vec<String> {
            vec!["p0".to_owned()]
        }

        fn open_device(&mut self, _config: &DeviceConfig) -> Result<DeviceId> {
            let id = DeviceId::new(self.next_id);
            self.next_id += 1;
            self.ids.push(id);
            Ok(id)
        }

        fn close_device(&mut self, id: DeviceId) -> Result<()> {
            let index = self
                .ids
                .iter()
                .position(|open| *open == id)
                .ok_or(Error::device_not_found(id))?;
            self.ids.remove(index);
            Ok(())
        }

        fn close_empty_multibox_devices(&mut self) {}

        fn device_ids(&self) -> Vec<DeviceId> {
            self.ids.clone()
        }

        fn describe_device(&self, id: DeviceId) -> Option<String> {
            self.ids
                .contains(&id)
                .then(|| format!("stub on {id}"))
        }

        fn last_raw_value(&self, id: DeviceId) -> Option<Sample> {
            self.samples.get(&id).cloned()
        }

        fn start(&mut self) {
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn monitor_with_sample(value: f64, prefix: MetricPrefix, unit: &str) -> (Monitor, DeviceId) {
        let (manager, id) = StubManager::with_sample(value, prefix, unit);
        let mut monitor = Monitor::new(Box::new(manager), Duration::from_secs(1));
        monitor.register_entry(id);
        (monitor, id)
    }

    // --- Ticking and row gating ---

    #[test]
    fn one_second_interval_yields_five_rows_over_five_point_four_seconds() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let start = Instant::now();
        monitor.start_measurement();
        monitor.start_logging(start);

        let mut appended = 0;
        for millis in (0..=5400).step_by(50) {
            let report = monitor.tick(start + Duration::from_millis(millis));
            appended += usize::from(report.row_appended);
        }

        assert_eq!(appended, 5);
        assert_eq!(monitor.log_row_count(), 5);
    }

    #[test]
    fn no_rows_append_while_measurement_is_stopped() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let start = Instant::now();
        monitor.start_logging(start);

        let report = monitor.tick(start + Duration::from_secs(2));

        assert!(!report.row_appended);
        assert_eq!(monitor.log_row_count(), 0);
    }

    #[test]
    fn no_rows_append_while_logging_is_stopped() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let start = Instant::now();
        monitor.start_measurement();
        monitor.start_logging(start);
        monitor.stop_logging();

        let report = monitor.tick(start + Duration::from_secs(2));

        assert!(!report.row_appended);
        assert!(!monitor.has_unsaved_log());
    }

    #[test]
    fn rows_hold_calibrated_base_values_with_zero_for_unsampled_entries() {
        let (mut monitor, id) = monitor_with_sample(5.0, MetricPrefix::Milli, "V");
        monitor
            .registry_mut()
            .insert(DisplayEntry::new(DeviceId::new(9), "silent"));
        monitor.start_measurement();
        if let Some(entry) = monitor.registry_mut().get_mut(id) {
            entry.calibration = CalibrationSettings {
                linear: LinearCalibration::new(2.0, 1.0),
                ..CalibrationSettings::default()
            };
        }

        let start = Instant::now();
        monitor.start_logging(start);
        let report = monitor.tick(start + Duration::from_secs(1));

        // The manager never issued id 9, so reconcile drops it before the
        // row is built and only the sampled column remains.
        assert_eq!(report.removed, vec![DeviceId::new(9)]);
        assert!(report.row_appended);
        // (5.0 * 2 + 1) mV = 11 mV = 0.011 in base units.
        assert_eq!(monitor.log_buffer(), Some("0.011,\n"));
    }

    #[test]
    fn never_sampled_entries_log_zero() {
        let mut manager = StubManager::default();
        manager.running = true;
        let config = DeviceConfig::port("meter", "p0");
        let mut monitor = Monitor::new(Box::new(manager), Duration::from_secs(1));
        monitor.add_device(&config).unwrap();

        let start = Instant::now();
        monitor.start_logging(start);
        let report = monitor.tick(start + Duration::from_secs(1));

        assert!(report.row_appended);
        assert_eq!(monitor.log_buffer(), Some("0,\n"));
    }

    #[test]
    fn tick_refreshes_the_latest_sample_of_each_entry() {
        let (mut monitor, id) = monitor_with_sample(42.5, MetricPrefix::Milli, "V");
        monitor.start_measurement();

        monitor.tick(Instant::now());

        let entry = monitor.registry().get(id).unwrap();
        let last = entry.last.as_ref().unwrap();
        assert_eq!(last.value, 42.5);
        assert_eq!(last.unit_label(), "mV");
    }

    #[test]
    fn vanished_devices_are_reported_once() {
        let (mut monitor, id) = monitor_with_sample(1.0, MetricPrefix::Base, "g");
        monitor
            .manager_mut()
            .close_device(id)
            .unwrap();

        let first = monitor.tick(Instant::now());
        let second = monitor.tick(Instant::now());

        assert_eq!(first.removed, vec![id]);
        assert!(second.removed.is_empty());
        assert!(monitor.registry().is_empty());
    }

    // --- Device lifecycle ---

    #[test]
    fn adding_a_standalone_device_creates_a_display_entry() {
        let mut monitor = Monitor::new(Box::new(StubManager::default()), Duration::from_secs(1));

        let id = monitor.add_device(&DeviceConfig::port("meter", "p0")).unwrap();

        assert!(monitor.registry().contains(id));
        assert_eq!(monitor.registry().get(id).unwrap().label, format!("stub on {id}"));
    }

    #[test]
    fn adding_a_multibox_carrier_leaves_the_dashboard_untouched() {
        let mut monitor = Monitor::new(Box::new(StubManager::default()), Duration::from_secs(1));

        let parent = monitor.add_device(&DeviceConfig::port("mux", "p0")).unwrap();
        let child = monitor
            .add_device(&DeviceConfig::channel("meter", parent, 1))
            .unwrap();

        assert!(!monitor.registry().contains(parent));
        assert!(monitor.registry().contains(child));
        assert_eq!(monitor.registry().len(), 1);
    }

    #[test]
    fn removing_a_device_drops_its_entry() {
        let (mut monitor, id) = monitor_with_sample(1.0, MetricPrefix::Base, "g");

        monitor.remove_device(id).unwrap();

        assert!(!monitor.registry().contains(id));
        assert!(monitor.remove_device(id).is_err());
    }

    // --- Saving ---

    #[test]
    fn save_without_any_recorded_row_is_refused() {
        let (mut monitor, _id) = monitor_with_sample(1.0, MetricPrefix::Base, "g");
        let dir = tempfile::tempdir().unwrap();

        let err = monitor.save_log(&dir.path().join("empty")).unwrap_err();
        assert!(matches!(err, Error::NoLogRecorded));

        // An open but still row-less session is just as unsaveable.
        monitor.start_logging(Instant::now());
        let err = monitor.save_log(&dir.path().join("empty")).unwrap_err();
        assert!(matches!(err, Error::NoLogRecorded));
    }

    #[test]
    fn save_clears_the_buffer_and_stops_logging() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        monitor.start_measurement();
        monitor.start_logging(start);
        monitor.tick(start + Duration::from_secs(1));

        let written = monitor.save_log(&dir.path().join("run")).unwrap();

        assert_eq!(written, dir.path().join("run.csv"));
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "50,\n");
        assert!(!monitor.is_logging());
        assert!(!monitor.has_unsaved_log());
        assert!(matches!(
            monitor.save_log(&dir.path().join("again")),
            Err(Error::NoLogRecorded)
        ));
    }

    #[test]
    fn failed_save_keeps_the_buffer_for_a_retry() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let start = Instant::now();
        monitor.start_measurement();
        monitor.start_logging(start);
        monitor.tick(start + Duration::from_secs(1));

        let result = monitor.save_log(Path::new("/definitely/not/here/run"));

        assert!(result.is_err());
        assert!(monitor.has_unsaved_log());
        assert_eq!(monitor.log_row_count(), 1);
    }

    #[test]
    fn starting_a_new_session_discards_the_old_buffer() {
        let (mut monitor, _id) = monitor_with_sample(50.0, MetricPrefix::Base, "g");
        let start = Instant::now();
        monitor.start_measurement();
        monitor.start_logging(start);
        monitor.tick(start + Duration::from_secs(1));
        assert_eq!(monitor.log_row_count(), 1);

        monitor.start_logging(start + Duration::from_secs(2));

        assert_eq!(monitor.log_row_count(), 0);
        assert!(monitor.is_logging());
    }
}
