// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context as _;
use embedded_hal::blocking::i2c;
use tracing::trace;

use crate::error::ReadError;
use crate::image_buffer::ThermalImage;

/// The coldest object temperature an MLX90640 reports, in degrees Celsius.
pub(crate) const MIN_TEMPERATURE: f32 = -40.0;

/// The hottest object temperature an MLX90640 reports, in degrees Celsius.
pub(crate) const MAX_TEMPERATURE: f32 = 300.0;

/// The operations a thermal camera needs to have to be used by therm-timelapse.
pub(crate) trait ThermalCamera {
    /// Read one complete frame into `frame`.
    ///
    /// `frame` is only written to once a complete, valid frame has been read. On error the
    /// previous contents are left untouched.
    fn fetch(&mut self, frame: &mut ThermalImage) -> Result<(), ReadError>;
}

impl<C> ThermalCamera for Box<C>
where
    C: ThermalCamera + ?Sized,
{
    fn fetch(&mut self, frame: &mut ThermalImage) -> Result<(), ReadError> {
        (**self).fetch(frame)
    }
}

/// Check that every temperature is one the camera could have measured.
pub(crate) fn validate_frame(temperatures: &[f32]) -> Result<(), ReadError> {
    let valid = temperatures
        .iter()
        .all(|t| t.is_finite() && (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(t));
    if valid {
        Ok(())
    } else {
        Err(ReadError::InvalidFrame)
    }
}

#[derive(Debug)]
pub(crate) struct Mlx90640<I2C> {
    camera: mlx9064x::Mlx90640Driver<I2C>,
    temperature_buffer: Vec<f32>,
    poll_delay: Duration,
}

impl<I2C> Mlx90640<I2C>
where
    I2C: 'static + i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    /// The MLX90640 reads out one subpage (half of the pixels, in a chessboard pattern) each
    /// refresh. A complete frame needs both.
    const SUBPAGES_PER_FRAME: u8 = 2;

    /// How many times per refresh period to check for new data.
    const POLLS_PER_REFRESH: f32 = 4.0;

    pub(crate) fn new(camera: mlx9064x::Mlx90640Driver<I2C>) -> Self {
        let num_pixels = camera.height() * camera.width();
        Self {
            camera,
            temperature_buffer: vec![0f32; num_pixels],
            // 2Hz is the power-on refresh rate
            poll_delay: Self::poll_delay(mlx9064x::FrameRate::Two),
        }
    }

    pub(crate) fn set_frame_rate(&mut self, frame_rate: mlx9064x::FrameRate) -> anyhow::Result<()> {
        self.camera
            .set_frame_rate(frame_rate)
            .context("Error setting camera frame rate")?;
        self.poll_delay = Self::poll_delay(frame_rate);
        Ok(())
    }

    fn poll_delay(frame_rate: mlx9064x::FrameRate) -> Duration {
        Duration::from_secs_f32(1.0 / (f32::from(frame_rate) * Self::POLLS_PER_REFRESH))
    }
}

impl<I2C> ThermalCamera for Mlx90640<I2C>
where
    I2C: 'static + i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    fn fetch(&mut self, frame: &mut ThermalImage) -> Result<(), ReadError> {
        let mut subpages_read = 0;
        while subpages_read < Self::SUBPAGES_PER_FRAME {
            let ready = self
                .camera
                .generate_image_if_ready(&mut self.temperature_buffer)
                .context("Unable to read subpage from MLX90640")?;
            if ready {
                subpages_read += 1;
                trace!(subpages_read, "read MLX90640 subpage");
            } else {
                sleep(self.poll_delay);
            }
        }
        validate_frame(&self.temperature_buffer)?;
        // mlx9064x uses row-major ordering, same as ThermalImage.
        frame.copy_from_slice(&self.temperature_buffer);
        Ok(())
    }
}
