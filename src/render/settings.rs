// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use serde::Deserialize;

use crate::settings::gradient;
use crate::temperature::TemperatureUnit;

use super::resize::Method;

fn default_grid_size() -> u32 {
    20
}

fn default_colors() -> colorous::Gradient {
    colorous::TURBO
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RenderSettings {
    /// The size (in pixels) each camera pixel should be rendered as.
    #[serde(default = "default_grid_size")]
    pub(crate) grid_size: u32,

    /// The unit used for the color scale labels.
    #[serde(default)]
    pub(crate) units: TemperatureUnit,

    #[serde(default = "default_colors", deserialize_with = "gradient::deserialize")]
    pub(crate) colors: colorous::Gradient,

    #[serde(default)]
    pub(crate) scaling_method: Method,

    /// A TrueType font used to label the color scale. Without one, the scale is drawn unlabeled.
    #[serde(default)]
    pub(crate) font_path: Option<PathBuf>,

    /// If set, every redraw replaces this file with the current image.
    #[serde(default)]
    pub(crate) live_path: Option<PathBuf>,
}

impl PartialEq for RenderSettings {
    fn eq(&self, other: &Self) -> bool {
        self.grid_size == other.grid_size
            && self.units == other.units
            && self.scaling_method == other.scaling_method
            && self.font_path == other.font_path
            && self.live_path == other.live_path
            // colorous::Gradient doesn't implement PartialEq
            && format!("{:?}", self.colors) == format!("{:?}", other.colors)
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            units: TemperatureUnit::default(),
            colors: default_colors(),
            scaling_method: Method::default(),
            font_path: None,
            live_path: None,
        }
    }
}
