//! Device identifiers and measurement samples.

use std::fmt;

/// Opaque identifier issued by a device manager for an open device.
///
/// Identifiers are issued monotonically, so sorting by `DeviceId` reproduces
/// the order in which devices were opened. That ordering is what keeps CSV
/// columns stable across log rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Create an identifier from its raw numeric value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw numeric value of this identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metric prefix attached to a displayed value.
///
/// A device reporting `1.25` with [`MetricPrefix::Milli`] and unit `"V"`
/// is displaying 1.25 mV; the value in base units is `0.00125`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MetricPrefix {
    /// 10⁻⁶
    Micro,
    /// 10⁻³
    Milli,
    /// No prefix; the displayed value is already in base units.
    #[default]
    Base,
    /// 10³
    Kilo,
    /// 10⁶
    Mega,
}

impl MetricPrefix {
    /// Multiplier that converts a displayed value into base units.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Micro => 1e-6,
            Self::Milli => 1e-3,
            Self::Base => 1.0,
            Self::Kilo => 1e3,
            Self::Mega => 1e6,
        }
    }

    /// SI symbol for this prefix; empty for [`MetricPrefix::Base`].
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Micro => "µ",
            Self::Milli => "m",
            Self::Base => "",
            Self::Kilo => "k",
            Self::Mega => "M",
        }
    }
}

impl fmt::Display for MetricPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One measurement as a device reports it: a displayed value, the metric
/// prefix of the display range, and the unit symbol.
///
/// # Examples
///
/// ```
/// use mvlog_types::{MetricPrefix, Sample};
///
/// let sample = Sample::new(21.7, MetricPrefix::Base, "°C");
/// assert_eq!(sample.base_value(), 21.7);
/// assert_eq!(sample.unit_label(), "°C");
///
/// let sample = Sample::new(330.0, MetricPrefix::Milli, "V");
/// assert_eq!(sample.base_value(), 0.33);
/// assert_eq!(sample.unit_label(), "mV");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The value as shown on the device's own display.
    pub value: f64,
    /// Metric prefix of the display range.
    pub prefix: MetricPrefix,
    /// Unit symbol, e.g. `"V"` or `"g"`. May be empty for unitless devices.
    pub unit: String,
}

impl Sample {
    /// Create a sample.
    pub fn new(value: f64, prefix: MetricPrefix, unit: impl Into<String>) -> Self {
        Self {
            value,
            prefix,
            unit: unit.into(),
        }
    }

    /// The value converted to base units (`value * prefix factor`).
    ///
    /// This is what log rows record, so that a reading of 330 mV and one of
    /// 0.33 V produce the same logged number.
    #[must_use]
    pub fn base_value(&self) -> f64 {
        self.value * self.prefix.factor()
    }

    /// Prefix symbol and unit joined for display, e.g. `"mV"`.
    #[must_use]
    pub fn unit_label(&self) -> String {
        format!("{}{}", self.prefix.symbol(), self.unit)
    }

    /// Replace the unit symbol, keeping value and prefix.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.unit_label();
        if label.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, label)
        }
    }
}
