//! Error types for calibration parameter validation.

use thiserror::Error;

/// Errors produced when validating or applying a calibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// Two-point calibration where both points share the same measured
    /// value. The fitted slope would be undefined, so the parameters are
    /// rejected instead of dividing by zero.
    #[error("two-point calibration is degenerate: both points have measured value {measured}")]
    CoincidentPoints {
        /// The measured value both points share.
        measured: f64,
    },
}

impl CalibrationError {
    /// Create a [`CalibrationError::CoincidentPoints`] error.
    #[must_use]
    pub fn coincident_points(measured: f64) -> Self {
        Self::CoincidentPoints { measured }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_display_includes_value() {
        let err = CalibrationError::coincident_points(4.5);
        assert!(err.to_string().contains("4.5"));
        assert!(err.to_string().contains("degenerate"));
    }
}
