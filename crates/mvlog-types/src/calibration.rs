//! Calibration transforms from raw device readings to displayed values.
//!
//! A calibration maps the value a device reports to the value the user
//! wants to see, e.g. correcting a sensor that reads 2% high or mapping a
//! load cell's voltage onto grams. Two entry modes exist:
//!
//! - [`LinearCalibration`]: slope and intercept entered directly.
//! - [`TwoPointCalibration`]: two (measured, reference) pairs; the line
//!   through them is fitted when the parameters are confirmed.
//!
//! Slope/intercept is the canonical representation. Two-point parameters
//! are a convenience for entry and are converted via
//! [`TwoPointCalibration::to_linear`]; conversion fails if both points
//! share the same measured value, so a division by zero can never reach the
//! displayed value.

use std::fmt;

use crate::error::CalibrationError;

/// A linear transform `displayed = raw * slope + intercept`.
///
/// # Examples
///
/// ```
/// use mvlog_types::LinearCalibration;
///
/// let cal = LinearCalibration::new(2.0, 0.5);
/// assert_eq!(cal.apply(3.0), 6.5);
///
/// // The identity calibration leaves readings untouched.
/// assert_eq!(LinearCalibration::IDENTITY.apply(-7.25), -7.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    /// Multiplier applied to the raw value.
    pub slope: f64,
    /// Offset added after the multiplication.
    pub intercept: f64,
}

impl LinearCalibration {
    /// The identity transform: slope 1, intercept 0.
    pub const IDENTITY: Self = Self {
        slope: 1.0,
        intercept: 0.0,
    };

    /// Create a calibration from slope and intercept.
    #[must_use]
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Apply the transform to a raw value.
    #[must_use]
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.slope + self.intercept
    }
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for LinearCalibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {}·x + {}", self.slope, self.intercept)
    }
}

/// One reference measurement: the value the device displayed and the value
/// it should have displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// What the device reported.
    pub measured: f64,
    /// What the reading should be.
    pub reference: f64,
}

impl CalibrationPoint {
    /// Create a calibration point.
    #[must_use]
    pub const fn new(measured: f64, reference: f64) -> Self {
        Self {
            measured,
            reference,
        }
    }
}

/// Two reference points that define a linear calibration.
///
/// # Examples
///
/// ```
/// use mvlog_types::{CalibrationPoint, TwoPointCalibration};
///
/// // 0 should read 0, 10 should read 100.
/// let cal = TwoPointCalibration::new(
///     CalibrationPoint::new(0.0, 0.0),
///     CalibrationPoint::new(10.0, 100.0),
/// );
/// let linear = cal.to_linear().unwrap();
/// assert_eq!(linear.apply(5.0), 50.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPointCalibration {
    /// First reference point.
    pub first: CalibrationPoint,
    /// Second reference point.
    pub second: CalibrationPoint,
}

impl TwoPointCalibration {
    /// Create a calibration from two reference points.
    #[must_use]
    pub const fn new(first: CalibrationPoint, second: CalibrationPoint) -> Self {
        Self { first, second }
    }

    /// Create a calibration from `(measured, reference)` tuples.
    #[must_use]
    pub const fn from_pairs(first: (f64, f64), second: (f64, f64)) -> Self {
        Self::new(
            CalibrationPoint::new(first.0, first.1),
            CalibrationPoint::new(second.0, second.1),
        )
    }

    /// Fit the line through both points.
    ///
    /// The resulting transform reproduces each reference value exactly at
    /// its measured point.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::CoincidentPoints`] when both points have
    /// the same measured value, which leaves the slope undefined.
    pub fn to_linear(&self) -> Result<LinearCalibration, CalibrationError> {
        if self.first.measured == self.second.measured {
            return Err(CalibrationError::coincident_points(self.first.measured));
        }
        let slope = (self.second.reference - self.first.reference)
            / (self.second.measured - self.first.measured);
        let intercept = self.first.reference - slope * self.first.measured;
        Ok(LinearCalibration::new(slope, intercept))
    }
}

impl Default for TwoPointCalibration {
    /// The identity line through (0, 0) and (1, 1).
    fn default() -> Self {
        Self::from_pairs((0.0, 0.0), (1.0, 1.0))
    }
}

/// Which entry mode a device's calibration is using.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalibrationMode {
    /// Slope and intercept entered directly.
    #[default]
    SlopeIntercept,
    /// Two (measured, reference) pairs.
    TwoPoint,
}

impl fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlopeIntercept => f.write_str("slope/intercept"),
            Self::TwoPoint => f.write_str("two-point"),
        }
    }
}

/// The active calibration for a device, in whichever mode it was entered.
///
/// # Examples
///
/// ```
/// use mvlog_types::{Calibration, LinearCalibration, TwoPointCalibration};
///
/// let direct = Calibration::SlopeIntercept(LinearCalibration::new(1.0, 0.0));
/// assert_eq!(direct.apply(7.25).unwrap(), 7.25);
///
/// let fitted = Calibration::TwoPoint(TwoPointCalibration::from_pairs(
///     (0.0, 0.0),
///     (10.0, 100.0),
/// ));
/// assert_eq!(fitted.apply(5.0).unwrap(), 50.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Calibration {
    /// Direct slope/intercept parameters.
    SlopeIntercept(LinearCalibration),
    /// Two-point parameters, fitted on application.
    TwoPoint(TwoPointCalibration),
}

impl Calibration {
    /// The identity calibration in slope/intercept form.
    #[must_use]
    pub fn identity() -> Self {
        Self::SlopeIntercept(LinearCalibration::IDENTITY)
    }

    /// The entry mode this calibration was created in.
    #[must_use]
    pub fn mode(&self) -> CalibrationMode {
        match self {
            Self::SlopeIntercept(_) => CalibrationMode::SlopeIntercept,
            Self::TwoPoint(_) => CalibrationMode::TwoPoint,
        }
    }

    /// The effective slope/intercept form of this calibration.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::CoincidentPoints`] for degenerate
    /// two-point parameters.
    pub fn to_linear(&self) -> Result<LinearCalibration, CalibrationError> {
        match self {
            Self::SlopeIntercept(linear) => Ok(*linear),
            Self::TwoPoint(points) => points.to_linear(),
        }
    }

    /// Transform a raw value into its displayed value.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::CoincidentPoints`] for degenerate
    /// two-point parameters; no value is computed in that case.
    pub fn apply(&self, raw: f64) -> Result<f64, CalibrationError> {
        Ok(self.to_linear()?.apply(raw))
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}
