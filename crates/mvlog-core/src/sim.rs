//! Simulated device manager for development and tests.
//!
//! [`SimDeviceManager`] implements the full [`DeviceManager`] surface
//! against an in-memory device table: a handful of port-attached device
//! types, plus a multibox type whose channels host subdevices. While
//! measurement is running, each device produces a jittered reading around a
//! per-type base value on every poll.
//!
//! Test hooks:
//!
//! - [`SimDeviceManager::pin_value`] fixes a device's reported sample, which
//!   makes log rows deterministic.
//! - [`SimDeviceManager::unplug`] drops a device without going through
//!   [`DeviceManager::close_device`], the way a cable pull would, which is
//!   what registry reconciliation has to cope with.

use std::cell::RefCell;
use std::collections::BTreeMap;

use mvlog_types::{DeviceId, MetricPrefix, Sample};
use rand::Rng;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::manager::{DeviceConfig, DeviceManager, DeviceTypeInfo};

/// Ports the simulated manager exposes.
const PORTS: [&str; 4] = ["sim0", "sim1", "sim2", "sim3"];

/// The multibox type name and its channel count.
const MULTIBOX: (&str, u8) = ("multiplexer", 3);

/// Reading behavior of a standalone device type.
#[derive(Debug, Clone, Copy)]
struct ReadingProfile {
    base: f64,
    jitter: f64,
    prefix: MetricPrefix,
    unit: &'static str,
}

/// Per-type reading profiles for the standalone types.
fn profile(device_type: &str) -> Option<ReadingProfile> {
    match device_type {
        "multimeter" => Some(ReadingProfile {
            base: 330.0,
            jitter: 5.0,
            prefix: MetricPrefix::Milli,
            unit: "V",
        }),
        "thermometer" => Some(ReadingProfile {
            base: 21.5,
            jitter: 0.4,
            prefix: MetricPrefix::Base,
            unit: "°C",
        }),
        "balance" => Some(ReadingProfile {
            base: 250.0,
            jitter: 0.8,
            prefix: MetricPrefix::Base,
            unit: "g",
        }),
        _ => None,
    }
}

/// Where a simulated device is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attachment {
    Port(String),
    Channel { parent: DeviceId, channel: u8 },
}

/// One open simulated device.
#[derive(Debug)]
struct SimDevice {
    type_name: String,
    attachment: Attachment,
    /// `None` for headless multibox parents.
    profile: Option<ReadingProfile>,
    /// `Some(channel count)` for multibox parents.
    multibox_channels: Option<u8>,
    /// Test hook: when set, reported instead of a generated reading.
    pinned: Option<Sample>,
    /// Latest reported sample; kept after measurement stops.
    last: RefCell<Option<Sample>>,
}

/// In-memory [`DeviceManager`] implementation.
///
/// Single-threaded like the front-end that owns it; the latest samples are
/// cached behind a `RefCell`, so the manager is not `Sync`.
#[derive(Debug, Default)]
pub struct SimDeviceManager {
    devices: BTreeMap<DeviceId, SimDevice>,
    next_id: u32,
    running: bool,
}

impl SimDeviceManager {
    /// Create a manager with no open devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a device's reported sample to a constant.
    ///
    /// # Errors
    ///
    /// Fails when no device with the identifier is open.
    pub fn pin_value(&mut self, id: DeviceId, sample: Sample) -> Result<()> {
        let device = self
            .devices
            .get_mut(&id)
            .ok_or_else(|| Error::device_not_found(id))?;
        device.pinned = Some(sample);
        Ok(())
    }

    /// Drop a device (and its subdevices) as if its cable were pulled.
    ///
    /// Unlike [`DeviceManager::close_device`] this never fails; unknown
    /// identifiers are ignored.
    pub fn unplug(&mut self, id: DeviceId) {
        if self.devices.remove(&id).is_some() {
            debug!(device = %id, "device unplugged");
            self.remove_children(id);
        }
    }

    fn remove_children(&mut self, parent: DeviceId) {
        let children: Vec<DeviceId> = self
            .devices
            .iter()
            .filter(|(_, d)| matches!(d.attachment, Attachment::Channel { parent: p, .. } if p == parent))
            .map(|(id, _)| *id)
            .collect();
        for child in children {
            self.devices.remove(&child);
            debug!(device = %child, %parent, "subdevice removed with its parent");
        }
    }

    fn port_claimed(&self, port: &str) -> bool {
        self.devices
            .values()
            .any(|d| matches!(&d.attachment, Attachment::Port(p) if p == port))
    }

    fn channel_claimed(&self, parent: DeviceId, channel: u8) -> bool {
        self.devices.values().any(|d| {
            matches!(d.attachment, Attachment::Channel { parent: p, channel: c } if p == parent && c == channel)
        })
    }

    fn issue_id(&mut self) -> DeviceId {
        self.next_id += 1;
        DeviceId::new(self.next_id)
    }

    /// Generate or replay the sample a device currently reports.
    fn current_sample(&self, device: &SimDevice) -> Option<Sample> {
        let profile = device.profile?;
        if let Some(pinned) = &device.pinned {
            return Some(pinned.clone());
        }
        let mut rng = rand::rng();
        let value = profile.base + rng.random_range(-profile.jitter..=profile.jitter);
        // Two decimals, like a device display.
        let value = (value * 100.0).round() / 100.0;
        Some(Sample::new(value, profile.prefix, profile.unit))
    }
}

impl DeviceManager for SimDeviceManager {
    fn valid_device_types(&self) -> Vec<DeviceTypeInfo> {
        vec![
            DeviceTypeInfo::standalone("multimeter"),
            DeviceTypeInfo::standalone("thermometer"),
            DeviceTypeInfo::standalone("balance"),
            DeviceTypeInfo::multibox(MULTIBOX.0, MULTIBOX.1),
        ]
    }

    fn available_ports(&self) -> Vec<String> {
        PORTS
            .iter()
            .filter(|port| !self.port_claimed(port))
            .map(ToString::to_string)
            .collect()
    }

    fn open_device(&mut self, config: &DeviceConfig) -> Result<DeviceId> {
        match config {
            DeviceConfig::Port { device_type, port } => {
                let is_multibox = device_type == MULTIBOX.0;
                let profile = profile(device_type);
                if !is_multibox && profile.is_none() {
                    return Err(Error::unknown_device_type(device_type));
                }
                if !PORTS.contains(&port.as_str()) {
                    return Err(Error::no_such_port(port));
                }
                if self.port_claimed(port) {
                    return Err(Error::port_in_use(port));
                }

                let id = self.issue_id();
                self.devices.insert(
                    id,
                    SimDevice {
                        type_name: device_type.clone(),
                        attachment: Attachment::Port(port.clone()),
                        profile: if is_multibox { None } else { profile },
                        multibox_channels: is_multibox.then_some(MULTIBOX.1),
                        pinned: None,
                        last: RefCell::new(None),
                    },
                );
                info!(device = %id, kind = %device_type, %port, "device opened");
                Ok(id)
            }
            DeviceConfig::Channel {
                device_type,
                parent,
                channel,
            } => {
                let Some(profile) = profile(device_type) else {
                    return Err(Error::unknown_device_type(device_type));
                };
                let channels = {
                    let parent_device = self
                        .devices
                        .get(parent)
                        .ok_or_else(|| Error::device_not_found(*parent))?;
                    parent_device
                        .multibox_channels
                        .ok_or_else(|| Error::not_multibox(*parent))?
                };
                if *channel == 0 || *channel > channels {
                    return Err(Error::no_such_channel(*parent, *channel));
                }
                if self.channel_claimed(*parent, *channel) {
                    return Err(Error::channel_in_use(*parent, *channel));
                }

                let id = self.issue_id();
                self.devices.insert(
                    id,
                    SimDevice {
                        type_name: device_type.clone(),
                        attachment: Attachment::Channel {
                            parent: *parent,
                            channel: *channel,
                        },
                        profile: Some(profile),
                        multibox_channels: None,
                        pinned: None,
                        last: RefCell::new(None),
                    },
                );
                info!(device = %id, kind = %device_type, parent = %*parent, channel = *channel, "subdevice opened");
                Ok(id)
            }
        }
    }

    fn close_device(&mut self, id: DeviceId) -> Result<()> {
        if self.devices.remove(&id).is_none() {
            return Err(Error::device_not_found(id));
        }
        self.remove_children(id);
        info!(device = %id, "device closed");
        Ok(())
    }

    fn close_empty_multibox_devices(&mut self) {
        let empty: Vec<DeviceId> = self
            .devices
            .iter()
            .filter(|(id, d)| {
                d.multibox_channels.is_some()
                    && !self.devices.values().any(|child| {
                        matches!(child.attachment, Attachment::Channel { parent, .. } if parent == **id)
                    })
            })
            .map(|(id, _)| *id)
            .collect();
        for id in empty {
            self.devices.remove(&id);
            debug!(device = %id, "empty multibox released");
        }
    }

    fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.keys().copied().collect()
    }

    fn describe_device(&self, id: DeviceId) -> Option<String> {
        let device = self.devices.get(&id)?;
        match &device.attachment {
            Attachment::Port(port) => Some(format!("{} on {}", device.type_name, port)),
            Attachment::Channel { parent, channel } => {
                let label = match self.devices.get(parent).map(|p| &p.attachment) {
                    Some(Attachment::Port(port)) => format!("{port}:{channel}"),
                    _ => format!("{parent} ch{channel}"),
                };
                Some(format!("{} on {}", device.type_name, label))
            }
        }
    }

    fn last_raw_value(&self, id: DeviceId) -> Option<Sample> {
        let device = self.devices.get(&id)?;
        if self.running
            && let Some(sample) = self.current_sample(device)
        {
            *device.last.borrow_mut() = Some(sample);
        }
        device.last.borrow().clone()
    }

    fn start(&mut self) {
        self.running = true;
        info!("measurement started");
    }

    fn stop(&mut self) {
        self.running = false;
        info!("measurement stopped");
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_port(manager: &mut SimDeviceManager, device_type: &str, port: &str) -> DeviceId {
        manager
            .open_device(&DeviceConfig::port(device_type, port))
            .unwrap()
    }

    // --- Enumeration ---

    #[test]
    fn type_list_contains_one_multibox() {
        let manager = SimDeviceManager::new();
        let types = manager.valid_device_types();
        assert_eq!(types.iter().filter(|t| t.is_multibox()).count(), 1);
        assert!(types.iter().any(|t| t.name == "multimeter"));
    }

    #[test]
    fn claimed_ports_disappear_from_the_port_list() {
        let mut manager = SimDeviceManager::new();
        assert_eq!(manager.available_ports().len(), PORTS.len());

        open_port(&mut manager, "multimeter", "sim0");
        let ports = manager.available_ports();
        assert_eq!(ports.len(), PORTS.len() - 1);
        assert!(!ports.contains(&"sim0".to_owned()));
    }

    // --- Opening ---

    #[test]
    fn identifiers_are_issued_in_opening_order() {
        let mut manager = SimDeviceManager::new();
        let first = open_port(&mut manager, "multimeter", "sim0");
        let second = open_port(&mut manager, "balance", "sim1");
        assert!(first < second);
        assert_eq!(manager.device_ids(), vec![first, second]);
    }

    #[test]
    fn open_rejects_bad_requests() {
        let mut manager = SimDeviceManager::new();
        open_port(&mut manager, "multimeter", "sim0");

        let err = manager
            .open_device(&DeviceConfig::port("gizmo", "sim1"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownDeviceType { .. }));

        let err = manager
            .open_device(&DeviceConfig::port("balance", "ttyS9"))
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchPort { .. }));

        let err = manager
            .open_device(&DeviceConfig::port("balance", "sim0"))
            .unwrap_err();
        assert!(matches!(err, Error::PortInUse { .. }));
    }

    #[test]
    fn describe_labels_devices_by_attachment() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim2");
        assert_eq!(
            manager.describe_device(meter).as_deref(),
            Some("multimeter on sim2")
        );
        assert_eq!(manager.describe_device(DeviceId::new(99)), None);
    }

    // --- Multibox lifecycle ---

    #[test]
    fn multibox_channels_host_subdevices() {
        let mut manager = SimDeviceManager::new();
        let parent = open_port(&mut manager, "multiplexer", "sim0");
        let child = manager
            .open_device(&DeviceConfig::channel("thermometer", parent, 2))
            .unwrap();

        assert_eq!(
            manager.describe_device(child).as_deref(),
            Some("thermometer on sim0:2")
        );

        let err = manager
            .open_device(&DeviceConfig::channel("balance", parent, 2))
            .unwrap_err();
        assert!(matches!(err, Error::ChannelInUse { .. }));

        let err = manager
            .open_device(&DeviceConfig::channel("balance", parent, 4))
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchChannel { .. }));
    }

    #[test]
    fn channel_open_requires_a_multibox_parent() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim0");
        let err = manager
            .open_device(&DeviceConfig::channel("balance", meter, 1))
            .unwrap_err();
        assert!(matches!(err, Error::NotMultibox { .. }));

        let err = manager
            .open_device(&DeviceConfig::channel("balance", DeviceId::new(42), 1))
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { .. }));
    }

    #[test]
    fn closing_a_parent_takes_its_subdevices_along() {
        let mut manager = SimDeviceManager::new();
        let parent = open_port(&mut manager, "multiplexer", "sim0");
        let child = manager
            .open_device(&DeviceConfig::channel("balance", parent, 1))
            .unwrap();

        manager.close_device(parent).unwrap();
        assert!(manager.device_ids().is_empty());
        assert!(manager.close_device(child).is_err());
    }

    #[test]
    fn empty_multiboxes_are_released_on_request() {
        let mut manager = SimDeviceManager::new();
        let parent = open_port(&mut manager, "multiplexer", "sim0");
        let child = manager
            .open_device(&DeviceConfig::channel("balance", parent, 1))
            .unwrap();

        // Still has a child: nothing happens.
        manager.close_empty_multibox_devices();
        assert_eq!(manager.device_ids().len(), 2);

        manager.close_device(child).unwrap();
        manager.close_empty_multibox_devices();
        assert!(manager.device_ids().is_empty());
    }

    // --- Sampling ---

    #[test]
    fn no_reading_before_measurement_starts() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim0");
        assert_eq!(manager.last_raw_value(meter), None);
    }

    #[test]
    fn running_devices_report_values_within_their_profile() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim0");
        manager.start();

        let sample = manager.last_raw_value(meter).unwrap();
        assert!((325.0..=335.0).contains(&sample.value));
        assert_eq!(sample.prefix, MetricPrefix::Milli);
        assert_eq!(sample.unit, "V");
    }

    #[test]
    fn last_value_sticks_after_stop() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim0");
        manager
            .pin_value(meter, Sample::new(50.0, MetricPrefix::Base, "V"))
            .unwrap();

        manager.start();
        assert_eq!(manager.last_raw_value(meter).unwrap().value, 50.0);

        manager.stop();
        assert_eq!(manager.last_raw_value(meter).unwrap().value, 50.0);
    }

    #[test]
    fn multibox_parents_are_headless() {
        let mut manager = SimDeviceManager::new();
        let parent = open_port(&mut manager, "multiplexer", "sim0");
        manager.start();
        assert_eq!(manager.last_raw_value(parent), None);
    }

    #[test]
    fn unplug_silently_forgets_devices() {
        let mut manager = SimDeviceManager::new();
        let meter = open_port(&mut manager, "multimeter", "sim0");
        manager.unplug(meter);
        manager.unplug(meter); // second pull is a no-op
        assert!(manager.device_ids().is_empty());
        assert!(manager.available_ports().contains(&"sim0".to_owned()));
    }
}
