// SPDX-License-Identifier: GPL-3.0-or-later
use image::{imageops, RgbImage};
use serde::Deserialize;

/// Different resizing methods
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Method {
    /// Nearest neighbor sampling. Each camera pixel becomes a solid square.
    Nearest,

    /// Triangle (aka linear) sampling.
    #[serde(alias = "linear")]
    Triangle,

    /// Catmull-Rom (aka bicubic) sampling.
    #[serde(alias = "bicubic")]
    CatmullRom,

    /// Lanczos sampling with a window size of 3.
    #[serde(alias = "lanczos")]
    Lanczos3,
}

impl Default for Method {
    fn default() -> Self {
        Self::Nearest
    }
}

/// Enlarge a map of colors so each source pixel covers `grid_size` × `grid_size` pixels.
pub(crate) fn enlarge(colors: &RgbImage, grid_size: u32, method: Method) -> RgbImage {
    let grid_size = grid_size.max(1);
    let new_width = colors.width() * grid_size;
    let new_height = colors.height() * grid_size;
    let filter_type = match method {
        // Exact pixel replication, imageops::resize can be off by one at the tile edges.
        Method::Nearest => {
            return RgbImage::from_fn(new_width, new_height, |x, y| {
                *colors.get_pixel(x / grid_size, y / grid_size)
            });
        }
        Method::Triangle => imageops::Triangle,
        Method::CatmullRom => imageops::CatmullRom,
        Method::Lanczos3 => imageops::Lanczos3,
    };
    imageops::resize(colors, new_width, new_height, filter_type)
}
