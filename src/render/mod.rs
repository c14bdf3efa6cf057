// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Context as _;
use image::{imageops, GenericImage, GrayImage, Rgb, RgbImage};
use tracing::{debug, trace};

use crate::image_buffer::ThermalImage;
use crate::temperature::Temperature;

mod color;
mod color_map;
mod font;
mod jpeg;
mod resize;
mod settings;

pub(crate) use self::settings::RenderSettings;

use self::color::Color;
use self::color_map::ColorScale;
use self::font::LabelRenderer;

/// Space between the heat map and the color bar.
const BAR_GAP: u32 = 8;

const BAR_WIDTH: u32 = 24;

/// Size of the boxes the color scale limits are written in.
const LABEL_WIDTH: u32 = 72;
const LABEL_HEIGHT: u32 = 20;

/// Something that can present thermal frames and persist what it's currently showing.
pub(crate) trait ThermalDisplay {
    /// Show a new frame, replacing whatever was shown before.
    ///
    /// The frame is mirrored left-right, and the color scale is stretched to cover exactly the
    /// coldest and hottest values in `frame`. The display has been redrawn when this returns.
    fn show(&mut self, frame: &ThermalImage) -> anyhow::Result<()>;

    /// Write the currently displayed image as a JPEG to `path`.
    fn save(&self, path: &Path) -> anyhow::Result<()>;
}

/// A display drawing onto an in-memory canvas.
///
/// If a live preview path is configured, every redraw also replaces that file.
#[derive(Debug)]
pub(crate) struct CanvasDisplay {
    settings: RenderSettings,
    labels: LabelRenderer,
    scale: Option<ColorScale>,
    canvas: Option<RgbImage>,
}

impl CanvasDisplay {
    pub(crate) fn new(settings: RenderSettings) -> anyhow::Result<Self> {
        let labels = match &settings.font_path {
            Some(font_path) => {
                LabelRenderer::from_path(font_path).context("Unable to load the color scale font")?
            }
            None => {
                debug!("no font configured, looking for a system sans-serif font");
                LabelRenderer::from_system().context("Unable to find a color scale font")?
            }
        };
        Ok(Self {
            settings,
            labels,
            scale: None,
            canvas: None,
        })
    }

    /// The color scale limits used for the most recent frame.
    #[cfg(test)]
    pub(crate) fn scale(&self) -> Option<ColorScale> {
        self.scale
    }

    #[cfg(test)]
    pub(crate) fn canvas(&self) -> Option<&RgbImage> {
        self.canvas.as_ref()
    }

    fn compose(&mut self, heat_map: &RgbImage, scale: &ColorScale) -> anyhow::Result<RgbImage> {
        let height = heat_map.height();
        let bar_x = heat_map.width() + BAR_GAP;
        let label_x = bar_x + BAR_WIDTH;
        let mut canvas = RgbImage::new(label_x + LABEL_WIDTH, height);
        canvas.copy_from(heat_map, 0, 0)?;
        let bar = ColorScale::color_bar(&self.settings.colors, BAR_WIDTH, height);
        canvas.copy_from(&bar, bar_x, 0)?;
        let label_height = LABEL_HEIGHT.min(height / 2);
        let limits = [
            (scale.max(), 0, 1.0),
            (scale.min(), height - label_height, 0.0),
        ];
        for (temperature, y, gradient_position) in limits.iter() {
            let temperature = Temperature::Celsius(*temperature).as_unit(&self.settings.units);
            let text = format!("{:#.1}", temperature);
            let mask = self.labels.render(&text, LABEL_WIDTH, label_height);
            let background = Color::from(self.settings.colors.eval_continuous(*gradient_position));
            draw_label(&mut canvas, &mask, label_x, *y, background);
        }
        Ok(canvas)
    }
}

/// Fill a box with `background`, then blend text (as an opacity mask) on top in a contrasting
/// color.
fn draw_label(canvas: &mut RgbImage, mask: &GrayImage, x: u32, y: u32, background: Color) {
    let background = Rgb::from(background);
    let foreground = Rgb::from(Color::from(&background).foreground_color());
    for (mask_x, mask_y, alpha) in mask.enumerate_pixels() {
        let alpha = alpha.0[0] as u32;
        let mut blended = [0u8; 3];
        for (channel, out) in blended.iter_mut().enumerate() {
            let fg = foreground.0[channel] as u32;
            let bg = background.0[channel] as u32;
            *out = ((fg * alpha + bg * (255 - alpha)) / 255) as u8;
        }
        let (canvas_x, canvas_y) = (x + mask_x, y + mask_y);
        if canvas_x < canvas.width() && canvas_y < canvas.height() {
            canvas.put_pixel(canvas_x, canvas_y, Rgb(blended));
        }
    }
}

impl ThermalDisplay for CanvasDisplay {
    fn show(&mut self, frame: &ThermalImage) -> anyhow::Result<()> {
        let mirrored = imageops::flip_horizontal(frame);
        let scale = ColorScale::from_image(&mirrored).context("Cannot display an empty frame")?;
        let colors = scale.map_colors(&self.settings.colors, &mirrored);
        let heat_map = resize::enlarge(
            &colors,
            self.settings.grid_size,
            self.settings.scaling_method,
        );
        let canvas = self.compose(&heat_map, &scale)?;
        if let Some(live_path) = &self.settings.live_path {
            jpeg::replace_jpeg(&canvas, live_path).context("Unable to update live preview")?;
        }
        trace!(min = scale.min(), max = scale.max(), "redrew display");
        self.scale = Some(scale);
        self.canvas = Some(canvas);
        Ok(())
    }

    fn save(&self, path: &Path) -> anyhow::Result<()> {
        let (canvas, scale) = self
            .canvas
            .as_ref()
            .zip(self.scale)
            .context("No frame has been displayed yet")?;
        debug!(
            path = %path.display(),
            min = scale.min(),
            max = scale.max(),
            "saving displayed image"
        );
        jpeg::write_jpeg(canvas, path)
    }
}
