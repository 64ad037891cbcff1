//! Defines the temperature unit a series is requested in, together with the
//! input ranges and defaults that make sense for that unit.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// The unit the archive should report temperatures in.
///
/// Switching the unit changes every value of a series, so it is part of the
/// identity of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// The value of the archive's `temperature_unit` request parameter.
    pub(crate) fn query_value(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Celsius => "celsius",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }

    /// Range offered for the plot threshold.
    pub fn threshold_range(&self) -> RangeInclusive<i32> {
        match self {
            TemperatureUnit::Fahrenheit => -15..=50,
            TemperatureUnit::Celsius => -25..=10,
        }
    }

    /// Plot threshold used when the caller does not pick one.
    pub fn default_threshold(&self) -> i32 {
        match self {
            TemperatureUnit::Fahrenheit => 5,
            TemperatureUnit::Celsius => -15,
        }
    }

    /// Range offered for the threshold table bounds.
    pub fn table_range(&self) -> RangeInclusive<i32> {
        match self {
            TemperatureUnit::Fahrenheit => -25..=60,
            TemperatureUnit::Celsius => -30..=15,
        }
    }

    /// Threshold table bounds `(low, high)` used when the caller does not pick them.
    pub fn default_table_bounds(&self) -> (i32, i32) {
        match self {
            TemperatureUnit::Fahrenheit => (0, 15),
            TemperatureUnit::Celsius => (-20, -10),
        }
    }
}

/// # Examples
///
/// ```
/// use heatpump::TemperatureUnit;
///
/// assert_eq!(TemperatureUnit::Celsius.to_string(), "celsius");
/// ```
impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_value())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            other => Err(format!("unknown temperature unit '{}'", other)),
        }
    }
}
