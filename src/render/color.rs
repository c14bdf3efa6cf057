// SPDX-License-Identifier: GPL-3.0-or-later
use std::cmp::Ordering;

use image::Rgb;

/// An sRGB color, used to pick label colors that stand out against the color scale.
///
/// Contrast is measured with the WCAG 2.0 definitions of "relative luminance" and "contrast
/// ratio". They're not perfect, but they're good enough for choosing between black and white text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl From<colorous::Color> for Color {
    fn from(other_color: colorous::Color) -> Self {
        Color {
            red: other_color.r,
            green: other_color.g,
            blue: other_color.b,
        }
    }
}

impl From<&Rgb<u8>> for Color {
    fn from(pixel: &Rgb<u8>) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb([color.red, color.green, color.blue])
    }
}

impl Color {
    pub(crate) const BLACK: Self = Self {
        red: u8::MIN,
        green: u8::MIN,
        blue: u8::MIN,
    };

    pub(crate) const WHITE: Self = Self {
        red: u8::MAX,
        green: u8::MAX,
        blue: u8::MAX,
    };

    pub(crate) fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    fn unit_components(&self) -> [f32; 3] {
        let max = u8::MAX as f32;
        [
            self.red as f32 / max,
            self.green as f32 / max,
            self.blue as f32 / max,
        ]
    }

    /// The relative luminance of the color in the sRGB colorspace, as [defined by the
    /// W3C][w3c-lum].
    ///
    /// [w3c-lum]: https://www.w3.org/TR/2008/REC-WCAG20-20081211/#relativeluminancedef
    pub(crate) fn luminance(&self) -> f32 {
        let linear = self.unit_components().map(|c| {
            // 0.03928 in the WCAG text comes from a draft of the sRGB standard, 0.04045 is correct.
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        });
        let coefficients: [f32; 3] = [0.2126, 0.7152, 0.0722];
        coefficients
            .iter()
            .zip(linear.iter())
            .map(|(coefficient, value)| coefficient * value)
            .sum()
    }

    /// The [W3C contrast ratio][w3c-contrast] between two colors, ranging from 1 to 21.
    ///
    /// [w3c-contrast]: https://www.w3.org/TR/WCAG20/#contrast-ratiodef
    pub(crate) fn contrast_ratio(&self, other: &Self) -> f32 {
        let lum = self.luminance();
        let other_lum = other.luminance();
        let (lighter, darker) = if lum > other_lum {
            (lum, other_lum)
        } else {
            (other_lum, lum)
        };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Treating this color as the background, pick black or white, whichever contrasts more.
    pub(crate) fn foreground_color(&self) -> Self {
        [Self::WHITE, Self::BLACK]
            .iter()
            .copied()
            .max_by(|l, r| {
                self.contrast_ratio(l)
                    .partial_cmp(&self.contrast_ratio(r))
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(Self::WHITE)
    }
}
