//! Error types for device management and logging operations.

use std::io;
use std::path::PathBuf;

use mvlog_types::{CalibrationError, DeviceId};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the behavioral core.
#[derive(Debug, Error)]
pub enum Error {
    /// No open device with the given identifier.
    #[error("no open device {id}")]
    DeviceNotFound {
        /// The identifier that was looked up.
        id: DeviceId,
    },

    /// The requested device type is not supported by the manager.
    #[error("unknown device type '{name}'")]
    UnknownDeviceType {
        /// The rejected type name.
        name: String,
    },

    /// The requested port does not exist.
    #[error("no such port '{port}'")]
    NoSuchPort {
        /// The rejected port name.
        port: String,
    },

    /// The requested port is already claimed by an open device.
    #[error("port '{port}' is already in use")]
    PortInUse {
        /// The contested port name.
        port: String,
    },

    /// The parent device cannot host subdevices.
    #[error("device {id} is not a multibox device")]
    NotMultibox {
        /// The identifier of the non-multibox device.
        id: DeviceId,
    },

    /// The channel number is outside the parent's channel range.
    #[error("device {parent} has no channel {channel}")]
    NoSuchChannel {
        /// The multibox parent.
        parent: DeviceId,
        /// The rejected channel number.
        channel: u8,
    },

    /// The multibox channel is already claimed by a subdevice.
    #[error("channel {channel} of device {parent} is already in use")]
    ChannelInUse {
        /// The multibox parent.
        parent: DeviceId,
        /// The contested channel number.
        channel: u8,
    },

    /// A save was requested before any log row was recorded.
    #[error("no log has been recorded")]
    NoLogRecorded,

    /// Writing the log buffer to disk failed.
    #[error("failed to write log to '{}': {source}", path.display())]
    LogWrite {
        /// Destination the write was aimed at.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Spawning the office program failed.
    #[error("failed to launch '{}': {source}", program.display())]
    OfficeLaunch {
        /// The program that could not be started.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Calibration parameters were invalid.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

impl Error {
    /// Create a [`Error::DeviceNotFound`] error.
    #[must_use]
    pub fn device_not_found(id: DeviceId) -> Self {
        Self::DeviceNotFound { id }
    }

    /// Create an [`Error::UnknownDeviceType`] error.
    pub fn unknown_device_type(name: impl Into<String>) -> Self {
        Self::UnknownDeviceType { name: name.into() }
    }

    /// Create an [`Error::NoSuchPort`] error.
    pub fn no_such_port(port: impl Into<String>) -> Self {
        Self::NoSuchPort { port: port.into() }
    }

    /// Create an [`Error::PortInUse`] error.
    pub fn port_in_use(port: impl Into<String>) -> Self {
        Self::PortInUse { port: port.into() }
    }

    /// Create an [`Error::NotMultibox`] error.
    #[must_use]
    pub fn not_multibox(id: DeviceId) -> Self {
        Self::NotMultibox { id }
    }

    /// Create an [`Error::NoSuchChannel`] error.
    #[must_use]
    pub fn no_such_channel(parent: DeviceId, channel: u8) -> Self {
        Self::NoSuchChannel { parent, channel }
    }

    /// Create an [`Error::ChannelInUse`] error.
    #[must_use]
    pub fn channel_in_use(parent: DeviceId, channel: u8) -> Self {
        Self::ChannelInUse { parent, channel }
    }

    /// Create an [`Error::LogWrite`] error.
    #[must_use]
    pub fn log_write(path: PathBuf, source: io::Error) -> Self {
        Self::LogWrite { path, source }
    }

    /// Create an [`Error::OfficeLaunch`] error.
    #[must_use]
    pub fn office_launch(program: PathBuf, source: io::Error) -> Self {
        Self::OfficeLaunch { program, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings_name_the_offending_input() {
        let err = Error::device_not_found(DeviceId::new(7));
        assert_eq!(err.to_string(), "no open device #7");

        let err = Error::unknown_device_type("frobnicator");
        assert_eq!(err.to_string(), "unknown device type 'frobnicator'");

        let err = Error::channel_in_use(DeviceId::new(2), 3);
        assert_eq!(err.to_string(), "channel 3 of device #2 is already in use");

        let err = Error::port_in_use("sim0");
        assert_eq!(err.to_string(), "port 'sim0' is already in use");
    }

    #[test]
    fn io_errors_are_kept_as_sources() {
        let source = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = Error::log_write(PathBuf::from("/tmp/out.csv"), source);
        assert!(err.to_string().contains("/tmp/out.csv"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn calibration_errors_convert_transparently() {
        let err: Error = CalibrationError::coincident_points(1.0).into();
        assert!(err.to_string().contains("degenerate"));
    }
}
