// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;

use anyhow::Context as _;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod acquisition;
mod camera;
mod error;
mod image_buffer;
mod render;
mod settings;
mod temperature;
mod util;

use crate::acquisition::{AcquisitionLoop, SystemClock};
use crate::render::CanvasDisplay;
use crate::settings::{Args, Settings};

fn main() -> anyhow::Result<()> {
    // RUST_LOG takes precedence, info otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::from_args();
    let settings = Settings::load(&args)?;
    fs::create_dir_all(&settings.snapshot.directory).with_context(|| {
        format!(
            "Unable to create snapshot directory {}",
            settings.snapshot.directory.display()
        )
    })?;
    let camera = settings.camera.create_camera()?;
    let display = CanvasDisplay::new(settings.render.clone())?;
    let mut acquisition = AcquisitionLoop::new(
        camera,
        display,
        SystemClock,
        &settings.acquisition,
        &settings.snapshot,
    );
    let result = acquisition.run();
    if let Some(rate) = acquisition.sample_rate().current() {
        info!(
            samples = acquisition.sample_rate().count(),
            total = ?acquisition.sample_rate().total(),
            "Average sample rate before stopping: {:.1}fps", rate
        );
    }
    result
}
