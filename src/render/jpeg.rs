// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use bytes::{BufMut, Bytes, BytesMut};
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::RgbImage;
use tracing::trace;

#[cfg(feature = "mozjpeg")]
use mozjpeg::{ColorSpace, Compress};

const JPEG_QUALITY: u8 = 90;

#[cfg(feature = "mozjpeg")]
fn encode_jpeg_mozjpeg(image: &RgbImage) -> anyhow::Result<Bytes> {
    trace!("using mozjpeg to encode JPEG image");
    let mut jpeg_encoder = Compress::new(ColorSpace::JCS_RGB);
    jpeg_encoder.set_fastest_defaults();
    jpeg_encoder.set_quality(JPEG_QUALITY as f32);
    jpeg_encoder.set_mem_dest();
    jpeg_encoder.set_size(image.width() as usize, image.height() as usize);
    jpeg_encoder.start_compress();
    if !jpeg_encoder.write_scanlines(image) {
        anyhow::bail!("mozjpeg was unable to write every scanline");
    }
    jpeg_encoder.finish_compress();
    let data = jpeg_encoder
        .data_to_vec()
        .map_err(|_| anyhow::anyhow!("mozjpeg did not produce any output"))?;
    Ok(Bytes::from(data))
}

fn encode_jpeg_image(image: &RgbImage) -> anyhow::Result<Bytes> {
    trace!("using image crate to encode JPEG image");
    let mut jpeg_buf = BytesMut::new().writer();
    let mut encoder = ImageJpegEncoder::new_with_quality(&mut jpeg_buf, JPEG_QUALITY);
    encoder
        .encode_image(image)
        .context("Unable to encode image as JPEG")?;
    Ok(jpeg_buf.into_inner().freeze())
}

#[cfg(not(feature = "mozjpeg"))]
pub(crate) fn encode_jpeg(image: &RgbImage) -> anyhow::Result<Bytes> {
    encode_jpeg_image(image)
}

#[cfg(feature = "mozjpeg")]
pub(crate) fn encode_jpeg(image: &RgbImage) -> anyhow::Result<Bytes> {
    encode_jpeg_mozjpeg(image).or_else(|err| {
        trace!(error = ?err, "falling back to the image crate for JPEG encoding");
        encode_jpeg_image(image)
    })
}

/// Encode an image and write it to `path`, replacing anything already there.
pub(crate) fn write_jpeg(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    let data = encode_jpeg(image)?;
    fs::write(path, &data).with_context(|| format!("Unable to write {}", path.display()))
}

/// Like [write_jpeg], but readers of `path` never see a partially written file.
pub(crate) fn replace_jpeg(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    write_jpeg(image, &temp_path)?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Unable to move new image into {}", path.display()))
}
