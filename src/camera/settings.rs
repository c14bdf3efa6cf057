// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use anyhow::Context as _;
use linux_embedded_hal::I2cdev;
use serde::de::{Deserialize, Deserializer, Error};
use tracing::info;

use super::i2c::Bus;
use super::mock_camera::{MockCamera, RepeatMode};
use super::thermal_camera::{Mlx90640, ThermalCamera};

/// The default I2C address of an MLX90640.
const DEFAULT_ADDRESS: u8 = 0x33;

fn default_address() -> u8 {
    DEFAULT_ADDRESS
}

/// 4Hz is the fastest refresh rate that a Raspberry Pi can reliably keep up with on a 400kHz bus.
fn default_frame_rate() -> mlx9064x::FrameRate {
    mlx9064x::FrameRate::Four
}

fn default_mock_frame_rate() -> f32 {
    2.0
}

struct TryFromNum<U>(PhantomData<U>);

impl<U> TryFromNum<U> {
    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<U>,
        <T as TryFrom<U>>::Error: fmt::Display,
        U: Deserialize<'de>,
    {
        let value: U = U::deserialize(deserializer)?;
        T::try_from(value).map_err(|err| D::Error::custom(err))
    }
}

type TryFromF32 = TryFromNum<f32>;

#[derive(Clone, Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub(crate) enum CameraSettings {
    Mlx90640 {
        #[serde(default)]
        bus: Bus,

        #[serde(default = "default_address")]
        address: u8,

        #[serde(default = "default_frame_rate", with = "TryFromF32")]
        frame_rate: mlx9064x::FrameRate,
    },
    #[serde(rename = "mock")]
    MockCamera {
        path: PathBuf,

        #[serde(default = "default_mock_frame_rate")]
        frame_rate: f32,

        #[serde(default)]
        repeat_mode: RepeatMode,
    },
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::Mlx90640 {
            bus: Bus::default(),
            address: DEFAULT_ADDRESS,
            frame_rate: default_frame_rate(),
        }
    }
}

impl CameraSettings {
    /// Replace the I2C bus. Returns `false` if this camera isn't connected over I2C.
    pub(crate) fn set_bus(&mut self, new_bus: Bus) -> bool {
        match self {
            Self::Mlx90640 { bus, .. } => {
                *bus = new_bus;
                true
            }
            Self::MockCamera { .. } => false,
        }
    }

    /// Replace the I2C address. Returns `false` if this camera isn't connected over I2C.
    pub(crate) fn set_address(&mut self, new_address: u8) -> bool {
        match self {
            Self::Mlx90640 { address, .. } => {
                *address = new_address;
                true
            }
            Self::MockCamera { .. } => false,
        }
    }

    /// Open the camera and apply the configured refresh rate.
    pub(crate) fn create_camera(&self) -> anyhow::Result<Box<dyn ThermalCamera>> {
        Ok(match self {
            Self::Mlx90640 {
                bus,
                address,
                frame_rate,
            } => {
                let i2c_bus = I2cdev::try_from(bus).context("Unable to connect to I2C bus")?;
                let driver = mlx9064x::Mlx90640Driver::new(i2c_bus, *address)
                    .context("Unable to initialize MLX90640")?;
                let mut camera = Mlx90640::new(driver);
                camera.set_frame_rate(*frame_rate)?;
                info!(
                    ?bus,
                    address,
                    frame_rate = f32::from(*frame_rate),
                    "connected to MLX90640"
                );
                Box::new(camera)
            }
            Self::MockCamera {
                path,
                frame_rate,
                repeat_mode,
            } => Box::new(MockCamera::from_path(path, *repeat_mode, *frame_rate)?),
        })
    }
}
