// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TemperatureUnit {
    #[serde(alias = "c", alias = "C")]
    Celsius,

    #[serde(alias = "f", alias = "F")]
    Fahrenheit,
}

impl Default for TemperatureUnit {
    fn default() -> Self {
        Self::Celsius
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Temperature {
    Celsius(f32),
    Fahrenheit(f32),
}

impl Temperature {
    /// Get the temperature in Celsius.
    pub(crate) fn in_celsius(&self) -> f32 {
        match self {
            Self::Celsius(c) => *c,
            Self::Fahrenheit(f) => (f - 32.0) * 5.0 / 9.0,
        }
    }

    /// Get the temperature in Fahrenheit.
    pub(crate) fn in_fahrenheit(&self) -> f32 {
        match self {
            Self::Celsius(c) => c * 1.8 + 32.0,
            Self::Fahrenheit(f) => *f,
        }
    }

    pub(crate) fn as_unit(self, unit: &TemperatureUnit) -> Self {
        match unit {
            TemperatureUnit::Celsius => Self::Celsius(self.in_celsius()),
            TemperatureUnit::Fahrenheit => Self::Fahrenheit(self.in_fahrenheit()),
        }
    }

    pub(crate) fn unit(&self) -> TemperatureUnit {
        match self {
            Temperature::Celsius(_) => TemperatureUnit::Celsius,
            Temperature::Fahrenheit(_) => TemperatureUnit::Fahrenheit,
        }
    }

    fn value(&self) -> f32 {
        match self {
            Temperature::Celsius(c) => *c,
            Temperature::Fahrenheit(f) => *f,
        }
    }
}

impl fmt::Display for Temperature {
    /// Format the temperature value like a numeric value. If the alternate formatting flag (`#`)
    /// is specified, the degree symbol and the unit (ex: `°C`) are also printed, with no space
    /// between the value and the degree symbol.
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value(), fmt)?;
        if fmt.alternate() {
            write!(fmt, "°{}", self.unit())?;
        }
        Ok(())
    }
}
