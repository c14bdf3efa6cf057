// SPDX-License-Identifier: GPL-3.0-or-later
mod i2c;
mod mock_camera;
mod settings;
mod thermal_camera;

pub(crate) use i2c::Bus;
pub(crate) use settings::CameraSettings;
pub(crate) use thermal_camera::ThermalCamera;
