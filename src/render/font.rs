// SPDX-License-Identifier: GPL-3.0-or-later
//! Text rendering for the color scale labels, using the [fontdue] crate.
use std::fmt;
use std::fs;
use std::iter;
use std::path::Path;

use anyhow::{anyhow, Context as _};
use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign,
};
use fontdue::{Font, FontSettings};
use image::imageops::overlay;
use image::GrayImage;

pub(crate) const FONT_SIZE: f32 = 14.0;

/// Sans-serif families tried after the generic family. fontdb maps the generic one to Arial, which
/// most Linux installs don't have.
const SANS_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Noto Sans", "FreeSans"];

pub(crate) struct LabelRenderer {
    font: Font,
    layout: Layout,
}

impl LabelRenderer {
    pub(crate) fn from_bytes(font_data: &[u8]) -> anyhow::Result<Self> {
        Self::from_collection(font_data, 0)
    }

    fn from_collection(font_data: &[u8], index: u32) -> anyhow::Result<Self> {
        let settings = FontSettings {
            collection_index: index,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(font_data, settings)
            .map_err(|err| anyhow!("Unable to parse font: {}", err))?;
        Ok(Self {
            font,
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        })
    }

    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let font_data =
            fs::read(path).with_context(|| format!("Unable to read font {}", path.display()))?;
        Self::from_bytes(&font_data)
    }

    /// Use a sans-serif font installed on the system.
    pub(crate) fn from_system() -> anyhow::Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        let id = find_sans_serif(&db).ok_or_else(|| {
            anyhow!(
                "No system font found in {} faces, set render.font_path",
                db.len()
            )
        })?;
        db.with_face_data(id, Self::from_collection)
            .ok_or_else(|| anyhow!("Unable to read the system font data"))?
    }

    /// Render `text` centered in a `width` × `height` box.
    ///
    /// The returned image is an opacity mask; the caller picks the color.
    pub(crate) fn render(&mut self, text: &str, width: u32, height: u32) -> GrayImage {
        self.layout.reset(&LayoutSettings {
            x: 0.0,
            y: 0.0,
            max_width: Some(width as f32),
            max_height: Some(height as f32),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            ..LayoutSettings::default()
        });
        let style = TextStyle::new(text, FONT_SIZE, 0);
        self.layout.append(&[&self.font], &style);
        let mut mask = GrayImage::new(width, height);
        for glyph in self.layout.glyphs().iter() {
            let (metrics, bitmap) = self.font.rasterize_config(glyph.key);
            // Whitespace has an empty bitmap
            if let Some(bitmap) =
                GrayImage::from_vec(metrics.width as u32, metrics.height as u32, bitmap)
            {
                overlay(&mut mask, &bitmap, glyph.x.max(0.0) as u32, glyph.y.max(0.0) as u32);
            }
        }
        mask
    }
}

/// The generic sans-serif family, then well known sans-serif families, then any proportional face.
fn find_sans_serif(db: &Database) -> Option<ID> {
    iter::once(Family::SansSerif)
        .chain(SANS_FAMILIES.iter().map(|name| Family::Name(name)))
        .find_map(|family| {
            db.query(&Query {
                families: &[family],
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            })
        })
        .or_else(|| {
            db.faces()
                .iter()
                .find(|face| !face.monospaced)
                .map(|face| face.id)
        })
}

impl fmt::Debug for LabelRenderer {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // fontdue::layout::Layout doesn't implement Debug
        fmt.debug_struct("LabelRenderer")
            .field("font", &self.font)
            .field("layout", &"Layout{ opaque }")
            .finish()
    }
}
