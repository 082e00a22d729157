//! Device management, polling, and CSV logging for the measurement
//! dashboard.
//!
//! This crate is the headless half of the application. It knows how to talk
//! to a [`DeviceManager`], keeps the ordered [`Registry`] of display
//! entries, and drives both from the [`Monitor`] tick that the front-end
//! calls on its poll cadence. Log rows accumulate in a [`LogSession`] until
//! the user saves them as CSV.
//!
//! Everything is synchronous and single-threaded. Device I/O is expected to
//! be fast enough to answer inside one poll cycle, which holds for the
//! serial-style instruments this targets and trivially for the bundled
//! [`SimDeviceManager`].
//!
//! ## Quick Start
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use mvlog_core::{DeviceConfig, Monitor, SimDeviceManager};
//!
//! # fn main() -> mvlog_core::Result<()> {
//! let manager = SimDeviceManager::new();
//! let mut monitor = Monitor::new(Box::new(manager), Duration::from_secs(1));
//!
//! let id = monitor.add_device(&DeviceConfig::port("multimeter", "sim0"))?;
//! monitor.start_measurement();
//!
//! let start = Instant::now();
//! monitor.start_logging(start);
//! monitor.tick(start + Duration::from_secs(1));
//!
//! let entry = monitor.registry().get(id).ok_or(mvlog_core::Error::device_not_found(id))?;
//! assert!(entry.last.is_some());
//! assert_eq!(monitor.log_row_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod log;
pub mod manager;
pub mod monitor;
pub mod office;
pub mod registry;
pub mod sim;

pub use error::{Error, Result};
pub use log::{force_csv_extension, LogSession};
pub use manager::{DeviceConfig, DeviceManager, DeviceTypeInfo};
pub use monitor::{Monitor, TickReport};
pub use office::open_log_file;
pub use registry::{CalibrationSettings, DisplayEntry, Registry};
pub use sim::SimDeviceManager;
