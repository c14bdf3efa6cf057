// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::{Infallible, TryFrom};
use std::path::PathBuf;
use std::str::FromStr;

use i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::I2cdev;
use serde::Deserialize;

use crate::util::parse_int_decimal_hex;

/// The I2C bus a camera is attached to.
///
/// Either the bus number (`1` for `/dev/i2c-1`) or a full path to the device node.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Bus {
    Number(u32),
    Path(PathBuf),
}

impl Default for Bus {
    /// The bus exposed on the GPIO header of a Raspberry Pi.
    fn default() -> Self {
        Self::Number(1)
    }
}

impl From<u32> for Bus {
    fn from(bus: u32) -> Self {
        Self::Number(bus)
    }
}

impl FromStr for Bus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_int_decimal_hex(s) {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Path(PathBuf::from(s)),
        })
    }
}

impl TryFrom<&Bus> for I2cdev {
    type Error = LinuxI2CError;

    fn try_from(bus: &Bus) -> Result<Self, Self::Error> {
        let device_path = match bus {
            Bus::Number(n) => PathBuf::from(format!("/dev/i2c-{}", n)),
            Bus::Path(p) => p.clone(),
        };
        I2cdev::new(device_path)
    }
}
