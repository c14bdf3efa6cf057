// SPDX-License-Identifier: GPL-3.0-or-later
use image::{Rgb, RgbImage};
use itertools::{Itertools, MinMaxResult};

use crate::image_buffer::ThermalImage;

/// The temperature range the gradient is stretched across for a single frame.
///
/// Both limits are taken from the frame being drawn, so every frame uses its full color range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ColorScale {
    min: f32,
    max: f32,
}

impl ColorScale {
    pub(crate) fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Find the coldest and hottest values in a frame. Returns `None` for an empty image.
    pub(crate) fn from_image(image: &ThermalImage) -> Option<Self> {
        match image.iter().copied().minmax_by(|l, r| l.total_cmp(r)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(value) => Some(Self::new(value, value)),
            MinMaxResult::MinMax(min, max) => Some(Self::new(min, max)),
        }
    }

    pub(crate) fn min(&self) -> f32 {
        self.min
    }

    pub(crate) fn max(&self) -> f32 {
        self.max
    }

    /// Map a temperature onto `[0, 1]`.
    ///
    /// A degenerate scale (every pixel the same temperature) maps everything to the middle of the
    /// gradient.
    pub(crate) fn normalize(&self, value: f32) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 || !range.is_finite() {
            0.5
        } else {
            (((value - self.min) / range) as f64).clamp(0.0, 1.0)
        }
    }

    pub(crate) fn color_for(&self, gradient: &colorous::Gradient, value: f32) -> Rgb<u8> {
        let color = gradient.eval_continuous(self.normalize(value));
        Rgb([color.r, color.g, color.b])
    }

    /// Convert a frame of temperatures into colors, one pixel per temperature.
    pub(crate) fn map_colors(&self, gradient: &colorous::Gradient, image: &ThermalImage) -> RgbImage {
        RgbImage::from_fn(image.width(), image.height(), |x, y| {
            self.color_for(gradient, image.get_pixel(x, y).0[0])
        })
    }

    /// Draw a vertical strip of the gradient, with the hottest color at the top.
    pub(crate) fn color_bar(gradient: &colorous::Gradient, width: u32, height: u32) -> RgbImage {
        let last_row = height.saturating_sub(1).max(1) as f64;
        RgbImage::from_fn(width, height, |_, y| {
            let color = gradient.eval_continuous(1.0 - (y as f64 / last_row));
            Rgb([color.r, color.g, color.b])
        })
    }
}
