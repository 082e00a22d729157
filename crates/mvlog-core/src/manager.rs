//! The device-manager seam between the front-end and device I/O.
//!
//! Device discovery, port handling, and raw I/O live behind the
//! [`DeviceManager`] trait. The front-end only ever talks to this surface:
//! it enumerates what can be opened, opens and closes devices, and pulls the
//! latest sample per device once measurement is running. Every call is
//! synchronous and expected to return quickly; implementations that talk to
//! slow hardware are responsible for caching the latest sample themselves.
//!
//! The only implementation in this repository is the simulated manager in
//! [`crate::sim`], which is enough for development and tests.

use std::fmt;

use mvlog_types::{Calibration, DeviceId, Sample};
use tracing::warn;

use crate::error::Result;

/// Description of a device type a manager can open.
///
/// Multibox types are multi-channel carriers: opening one yields a headless
/// parent device whose channels then host ordinary subdevices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTypeInfo {
    /// Type name as presented to the user, e.g. `"multimeter"`.
    pub name: String,
    /// Number of subdevice channels, for multibox types.
    pub multibox_channels: Option<u8>,
}

impl DeviceTypeInfo {
    /// Describe a standalone device type.
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multibox_channels: None,
        }
    }

    /// Describe a multibox device type with the given channel count.
    pub fn multibox(name: impl Into<String>, channels: u8) -> Self {
        Self {
            name: name.into(),
            multibox_channels: Some(channels),
        }
    }

    /// Whether this type hosts subdevice channels.
    #[must_use]
    pub fn is_multibox(&self) -> bool {
        self.multibox_channels.is_some()
    }
}

impl fmt::Display for DeviceTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.multibox_channels {
            Some(channels) => write!(f, "{} ({} channels)", self.name, channels),
            None => f.write_str(&self.name),
        }
    }
}

/// How to open a device: attached to a port, or as a subdevice on a
/// multibox channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceConfig {
    /// A device wired to a port.
    Port {
        /// Device type name, one of [`DeviceManager::valid_device_types`].
        device_type: String,
        /// Port name, one of [`DeviceManager::available_ports`].
        port: String,
    },
    /// A subdevice on a channel of an open multibox device.
    Channel {
        /// Device type name of the subdevice.
        device_type: String,
        /// The open multibox parent.
        parent: DeviceId,
        /// Channel number, starting at 1.
        channel: u8,
    },
}

impl DeviceConfig {
    /// Configuration for a port-attached device.
    pub fn port(device_type: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Port {
            device_type: device_type.into(),
            port: port.into(),
        }
    }

    /// Configuration for a multibox subdevice.
    pub fn channel(device_type: impl Into<String>, parent: DeviceId, channel: u8) -> Self {
        Self::Channel {
            device_type: device_type.into(),
            parent,
            channel,
        }
    }

    /// The device type this configuration opens.
    #[must_use]
    pub fn device_type(&self) -> &str {
        match self {
            Self::Port { device_type, .. } | Self::Channel { device_type, .. } => device_type,
        }
    }
}

/// Capability surface of an external device manager.
///
/// The front-end owns exactly one manager and calls it from its periodic
/// tick; nothing here blocks or runs concurrently.
pub trait DeviceManager {
    // --- Enumeration ---

    /// Device types this manager can open.
    fn valid_device_types(&self) -> Vec<DeviceTypeInfo>;

    /// Ports currently available for opening a device.
    fn available_ports(&self) -> Vec<String>;

    // --- Lifecycle ---

    /// Open a device and issue an identifier for it.
    ///
    /// # Errors
    ///
    /// Implementations reject unknown types, missing or occupied ports, and
    /// invalid multibox channel references.
    fn open_device(&mut self, config: &DeviceConfig) -> Result<DeviceId>;

    /// Close an open device. Closing a multibox parent closes its
    /// subdevices as well.
    ///
    /// # Errors
    ///
    /// Fails when no device with the identifier is open.
    fn close_device(&mut self, id: DeviceId) -> Result<()>;

    /// Release multibox devices whose last subdevice has been closed.
    fn close_empty_multibox_devices(&mut self);

    // --- Inspection ---

    /// Identifiers of all open devices, multibox parents included.
    fn device_ids(&self) -> Vec<DeviceId>;

    /// Human-readable label for an open device, or `None` if the
    /// identifier is unknown.
    fn describe_device(&self, id: DeviceId) -> Option<String>;

    // --- Sampling ---

    /// The latest raw sample a device reported, or `None` if the device has
    /// not produced a value yet (or is headless, like a multibox parent).
    fn last_raw_value(&self, id: DeviceId) -> Option<Sample>;

    /// The latest sample with `calibration` applied to its value and the
    /// unit replaced by `unit_override` when one is given.
    ///
    /// Returns `None` when there is no sample, and also when the
    /// calibration parameters are degenerate; the dialogs reject such
    /// parameters before they can be stored, so hitting that path only
    /// logs a warning.
    fn calibrated_last_raw_value(
        &self,
        id: DeviceId,
        calibration: &Calibration,
        unit_override: Option<&str>,
    ) -> Option<Sample> {
        let raw = self.last_raw_value(id)?;
        let value = match calibration.apply(raw.value) {
            Ok(value) => value,
            Err(err) => {
                warn!(device = %id, %err, "skipping sample with unusable calibration");
                return None;
            }
        };
        let mut sample = Sample::new(value, raw.prefix, raw.unit);
        if let Some(unit) = unit_override {
            sample.unit = unit.to_owned();
        }
        Some(sample)
    }

    // --- Measurement control ---

    /// Start sampling on all open devices.
    fn start(&mut self);

    /// Stop sampling. Devices keep reporting their last value.
    fn stop(&mut self);

    /// Whether sampling is active.
    fn is_running(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use mvlog_types::{LinearCalibration, MetricPrefix, TwoPointCalibration};

    use super::*;

    /// Minimal manager that always reports one fixed sample.
    struct OneSampleManager {
        sample: Sample,
    }

    impl DeviceManager for OneSampleManager {
        fn valid_device_types(&self) -> Vec<DeviceTypeInfo> {
            Vec::new()
        }

        fn available_ports(&self) -> Vec<String> {
            Vec::new()
        }

        fn open_device(&mut self, config: &DeviceConfig) -> Result<DeviceId> {
            Err(crate::Error::unknown_device_type(config.device_type()))
        }

        fn close_device(&mut self, id: DeviceId) -> Result<()> {
            Err(crate::Error::device_not_found(id))
        }

        fn close_empty_multibox_devices(&mut self) {}

        fn device_ids(&self) -> Vec<DeviceId> {
            vec![DeviceId::new(1)]
        }

        fn describe_device(&self, _id: DeviceId) -> Option<String> {
            Some("fixed".to_owned())
        }

        fn last_raw_value(&self, _id: DeviceId) -> Option<Sample> {
            Some(self.sample.clone())
        }

        fn start(&mut self) {}

        fn stop(&mut self) {}

        fn is_running(&self) -> bool {
            true
        }
    }

    #[test]
    fn calibrated_read_applies_transform_and_unit_override() {
        let manager = OneSampleManager {
            sample: Sample::new(5.0, MetricPrefix::Milli, "V"),
        };
        let calibration = Calibration::SlopeIntercept(LinearCalibration::new(2.0, 1.0));

        let sample = manager
            .calibrated_last_raw_value(DeviceId::new(1), &calibration, Some("A"))
            .unwrap();
        assert_eq!(sample.value, 11.0);
        assert_eq!(sample.prefix, MetricPrefix::Milli);
        assert_eq!(sample.unit, "A");

        let sample = manager
            .calibrated_last_raw_value(DeviceId::new(1), &calibration, None)
            .unwrap();
        assert_eq!(sample.unit, "V");
    }

    #[test]
    fn degenerate_calibration_yields_no_sample() {
        let manager = OneSampleManager {
            sample: Sample::new(5.0, MetricPrefix::Base, "V"),
        };
        let degenerate =
            Calibration::TwoPoint(TwoPointCalibration::from_pairs((1.0, 0.0), (1.0, 9.0)));
        assert!(
            manager
                .calibrated_last_raw_value(DeviceId::new(1), &degenerate, None)
                .is_none()
        );
    }

    #[test]
    fn device_config_reports_its_type() {
        assert_eq!(
            DeviceConfig::port("multimeter", "sim0").device_type(),
            "multimeter"
        );
        assert_eq!(
            DeviceConfig::channel("balance", DeviceId::new(3), 2).device_type(),
            "balance"
        );
    }

    #[test]
    fn type_info_display_mentions_channels() {
        assert_eq!(DeviceTypeInfo::standalone("balance").to_string(), "balance");
        assert_eq!(
            DeviceTypeInfo::multibox("multiplexer", 3).to_string(),
            "multiplexer (3 channels)"
        );
    }
}
