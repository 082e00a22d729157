//! Shared value types for the mvlog measurement logger.
//!
//! This crate holds the plain data types that the rest of the workspace is
//! built on: device identifiers, measurement samples with metric prefixes,
//! and the calibration transforms that turn a raw device reading into a
//! displayed value.
//!
//! Everything here is pure data with no I/O, so the types can be used from
//! the behavioral core, the front-end, and tests alike.
//!
//! # Quick Start
//!
//! ```
//! use mvlog_types::{Calibration, LinearCalibration, MetricPrefix, Sample};
//!
//! // A multimeter reporting 1.25 mV.
//! let raw = Sample::new(1.25, MetricPrefix::Milli, "V");
//! assert_eq!(raw.base_value(), 0.00125);
//!
//! // Display it through a slope/intercept calibration.
//! let cal = Calibration::SlopeIntercept(LinearCalibration::new(2.0, 0.5));
//! assert_eq!(cal.apply(raw.value).unwrap(), 3.0);
//! ```

pub mod calibration;
pub mod error;
pub mod value;

pub use calibration::{
    Calibration, CalibrationMode, CalibrationPoint, LinearCalibration, TwoPointCalibration,
};
pub use error::CalibrationError;
pub use value::{DeviceId, MetricPrefix, Sample};
