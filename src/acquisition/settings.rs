// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::retry::DEFAULT_MAX_ATTEMPTS;

fn default_max_retries() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    "thermal_image".to_string()
}

fn default_interval() -> u64 {
    60
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct AcquisitionSettings {
    /// How many times reading a frame can fail before the current cycle is given up on.
    #[serde(default = "default_max_retries")]
    pub(crate) max_retries: u32,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct SnapshotSettings {
    #[serde(default = "default_directory")]
    pub(crate) directory: PathBuf,

    /// Snapshots are named `<prefix>_<YYYYMMDD_HHMMSS>.jpg`.
    #[serde(default = "default_prefix")]
    pub(crate) prefix: String,

    /// Minimum number of seconds between snapshots.
    #[serde(default = "default_interval")]
    pub(crate) interval: u64,
}

impl SnapshotSettings {
    pub(crate) fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            prefix: default_prefix(),
            interval: default_interval(),
        }
    }
}
