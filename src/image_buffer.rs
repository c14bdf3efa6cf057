// SPDX-License-Identifier: GPL-3.0-or-later
use image::{ImageBuffer, Luma};

/// Images where each point is a temperature in degrees Celsius.
pub(crate) type ThermalImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Columns in an MLX90640 frame.
pub(crate) const FRAME_WIDTH: u32 = 32;

/// Rows in an MLX90640 frame.
pub(crate) const FRAME_HEIGHT: u32 = 24;

/// The number of temperatures in a single frame.
pub(crate) const FRAME_PIXELS: usize = (FRAME_WIDTH * FRAME_HEIGHT) as usize;

/// A zeroed frame buffer, sized for an MLX90640.
pub(crate) fn empty_frame() -> ThermalImage {
    ThermalImage::new(FRAME_WIDTH, FRAME_HEIGHT)
}
