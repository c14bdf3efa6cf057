// SPDX-License-Identifier: GPL-3.0-or-later
//! Play back previously recorded frames instead of reading from hardware.
//!
//! Recordings are TOML files with one `[[frames]]` table per frame, each holding the 768
//! temperatures of a frame in row-major order:
//!
//! ```toml
//! [[frames]]
//! values = [21.5, 21.7, ...]
//! ```
//!
//! Values outside of what an MLX90640 can measure (or `nan`) are allowed in a recording, and
//! are reported as invalid frames when played back. This makes it possible to exercise the retry
//! handling without a flaky I2C bus.
use std::fmt;
use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _};
use serde::Deserialize;
use tracing::{debug, trace};

use super::thermal_camera::{validate_frame, ThermalCamera};
use crate::error::ReadError;
use crate::image_buffer::{ThermalImage, FRAME_PIXELS};

#[derive(Debug, Deserialize)]
struct Recording {
    frames: Vec<RecordedFrame>,
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    values: Vec<f32>,
}

/// Controls how frames are repeated by [`MockCamera`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RepeatMode {
    /// Don't repeat.
    ///
    /// Once the end of the frames has been reached, every fetch fails.
    None,

    /// Loop over the frames, restarting from the beginning once the end has been reached. This
    /// is the default mode.
    Loop,

    /// Alternate between forward and reverse playback.
    ///
    /// The frames at either end of the recording are *not* repeated.
    Bounce,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::Loop
    }
}

pub(crate) struct MockCamera {
    frames: Vec<Vec<f32>>,
    index: Box<dyn Iterator<Item = usize> + Send>,
    frame_delay: Duration,
}

impl MockCamera {
    pub(crate) fn new(frames: Vec<Vec<f32>>, repeat: RepeatMode, frame_delay: Duration) -> Self {
        let num_frames = frames.len();
        let index: Box<dyn Iterator<Item = usize> + Send> = match repeat {
            RepeatMode::None => Box::new(0..num_frames),
            RepeatMode::Loop => Box::new((0..num_frames).cycle()),
            RepeatMode::Bounce => {
                let forwards = 0..num_frames;
                let backwards = (1..num_frames.saturating_sub(1)).rev();
                Box::new(forwards.chain(backwards).cycle())
            }
        };
        Self {
            frames,
            index,
            frame_delay,
        }
    }

    /// Load a recording from a TOML file, playing it back at `frame_rate` frames per second.
    pub(crate) fn from_path(
        path: &Path,
        repeat: RepeatMode,
        frame_rate: f32,
    ) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Unable to read recording {}", path.display()))?;
        let recording: Recording = toml::from_str(&data)
            .with_context(|| format!("Invalid recording in {}", path.display()))?;
        if recording.frames.is_empty() {
            bail!("The recording in {} has no frames", path.display());
        }
        let frames = recording
            .frames
            .into_iter()
            .enumerate()
            .map(|(n, frame)| {
                if frame.values.len() == FRAME_PIXELS {
                    Ok(frame.values)
                } else {
                    Err(anyhow!(
                        "Frame {} has {} values, expected {}",
                        n,
                        frame.values.len(),
                        FRAME_PIXELS
                    ))
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let frame_delay = if frame_rate > 0.0 {
            Duration::try_from_secs_f32(1.0 / frame_rate)
                .with_context(|| format!("Mock camera frame rate {} is too low", frame_rate))?
        } else {
            Duration::default()
        };
        debug!(
            num_frames = frames.len(),
            ?repeat,
            "loaded recording from {}",
            path.display()
        );
        Ok(Self::new(frames, repeat, frame_delay))
    }
}

impl fmt::Debug for MockCamera {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("MockCamera")
            .field("num_frames", &self.frames.len())
            .field("frame_delay", &self.frame_delay)
            .finish()
    }
}

impl ThermalCamera for MockCamera {
    fn fetch(&mut self, frame: &mut ThermalImage) -> Result<(), ReadError> {
        sleep(self.frame_delay);
        let index = self
            .index
            .next()
            .ok_or_else(|| anyhow!("Reached the end of the recorded frames"))?;
        trace!(index, "playing back recorded frame");
        let values = &self.frames[index];
        validate_frame(values)?;
        frame.copy_from_slice(values);
        Ok(())
    }
}
