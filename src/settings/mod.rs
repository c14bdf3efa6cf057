// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use tracing::{debug, warn};

mod cli;
pub(crate) mod gradient;

use crate::acquisition::{AcquisitionSettings, SnapshotSettings};
use crate::camera::CameraSettings;
use crate::render::RenderSettings;
pub(crate) use cli::Args;

/// The configuration file used when one isn't given on the command line.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
pub(crate) struct Settings {
    /// Camera-specific settings.
    #[serde(default)]
    pub(crate) camera: CameraSettings,

    /// Settings related to how frames are rendered.
    #[serde(default)]
    pub(crate) render: RenderSettings,

    /// When and where snapshots are saved.
    #[serde(default)]
    pub(crate) snapshot: SnapshotSettings,

    /// Sampling loop settings.
    #[serde(default)]
    pub(crate) acquisition: AcquisitionSettings,
}

impl Settings {
    /// Load the settings from the configuration file and apply any command line overrides.
    pub(crate) fn load(args: &Args) -> anyhow::Result<Self> {
        let mut settings = match &args.config_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No configuration file found, using the defaults");
                    Self::default()
                }
            }
        };
        settings.apply_args(args);
        Ok(settings)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config_data = fs::read_to_string(path)
            .with_context(|| format!("Unable to read configuration file {}", path.display()))?;
        toml::from_str(&config_data)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(bus) = &args.bus {
            if !self.camera.set_bus(bus.clone()) {
                warn!("Ignoring --bus, the configured camera does not use I2C");
            }
        }
        if let Some(address) = args.address {
            if !self.camera.set_address(address) {
                warn!("Ignoring --address, the configured camera does not use I2C");
            }
        }
        if let Some(interval) = args.interval {
            self.snapshot.interval = interval;
        }
        if let Some(output_dir) = &args.output_dir {
            self.snapshot.directory = output_dir.clone();
        }
    }
}
