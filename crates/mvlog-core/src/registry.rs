//! Per-device display state and its reconciliation with the device manager.
//!
//! The registry is the owned table mapping each open device to its
//! [`DisplayEntry`]: the label, calibration settings, unit override, and
//! the last sample rendered for it. The device manager stays authoritative
//! over which devices exist; [`Registry::reconcile`] runs once per tick and
//! drops entries whose devices have vanished.

use std::collections::BTreeMap;

use mvlog_types::{
    Calibration, CalibrationMode, DeviceId, LinearCalibration, Sample, TwoPointCalibration,
};
use tracing::debug;

use crate::manager::DeviceManager;

/// Calibration state of one device: the active mode plus both parameter
/// sets, so switching modes never loses entered values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationSettings {
    /// Which parameter set is active.
    pub mode: CalibrationMode,
    /// Slope/intercept parameters.
    pub linear: LinearCalibration,
    /// Two-point parameters.
    pub two_point: TwoPointCalibration,
}

impl CalibrationSettings {
    /// The calibration currently in effect.
    #[must_use]
    pub fn active(&self) -> Calibration {
        match self.mode {
            CalibrationMode::SlopeIntercept => Calibration::SlopeIntercept(self.linear),
            CalibrationMode::TwoPoint => Calibration::TwoPoint(self.two_point),
        }
    }
}

/// UI state for one displayed device.
#[derive(Debug, Clone)]
pub struct DisplayEntry {
    /// The device this entry displays.
    pub id: DeviceId,
    /// Human-readable label from the device manager.
    pub label: String,
    /// Calibration mode and parameters.
    pub calibration: CalibrationSettings,
    /// Unit replacing the device's own, when set.
    pub unit_override: Option<String>,
    /// Last calibrated sample rendered for this device.
    pub last: Option<Sample>,
}

impl DisplayEntry {
    /// Create an entry with identity calibration and no override.
    pub fn new(id: DeviceId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            calibration: CalibrationSettings::default(),
            unit_override: None,
            last: None,
        }
    }
}

/// Owned table of display entries, ordered by device identifier.
///
/// Identifier order is issuance order, so iteration (and with it the CSV
/// column order) stays stable for the life of a logging session.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<DeviceId, DisplayEntry>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous entry for the same device.
    pub fn insert(&mut self, entry: DisplayEntry) {
        self.entries.insert(entry.id, entry);
    }

    /// Remove the entry for `id`. Returns `None` if there was none; that
    /// is not an error, some device kinds never get an entry.
    pub fn remove(&mut self, id: DeviceId) -> Option<DisplayEntry> {
        self.entries.remove(&id)
    }

    /// The entry for `id`, if any.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&DisplayEntry> {
        self.entries.get(&id)
    }

    /// Mutable access to the entry for `id`.
    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut DisplayEntry> {
        self.entries.get_mut(&id)
    }

    /// Whether an entry for `id` exists.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked device identifiers in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<DeviceId> {
        self.entries.keys().copied().collect()
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &DisplayEntry> {
        self.entries.values()
    }

    /// Mutable entries in display order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DisplayEntry> {
        self.entries.values_mut()
    }

    /// Drop entries for devices the manager no longer reports.
    ///
    /// Between computing the stale set and removing it, the manager gets a
    /// chance to release multibox devices that lost their last subdevice.
    /// Identifiers without an entry are skipped silently. Returns the
    /// identifiers whose entries were removed.
    pub fn reconcile(&mut self, manager: &mut dyn DeviceManager) -> Vec<DeviceId> {
        let current = manager.device_ids();
        let stale: Vec<DeviceId> = self
            .entries
            .keys()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();

        manager.close_empty_multibox_devices();

        let mut removed = Vec::new();
        for id in stale {
            if self.remove(id).is_some() {
                debug!(device = %id, "display entry removed, device vanished");
                removed.push(id);
            }
        }
        removed
    }
}
