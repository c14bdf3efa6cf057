// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use super::settings::SnapshotSettings;

/// `strftime` format for the timestamp in snapshot file names.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Decides when the displayed image should be saved, and where.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SnapshotPolicy {
    directory: PathBuf,
    prefix: String,
    interval: Duration,
    last_save: Instant,
}

impl SnapshotPolicy {
    /// Create a policy. `start` counts as the most recent save, so the first snapshot is taken a
    /// full interval later.
    pub(crate) fn new(settings: &SnapshotSettings, start: Instant) -> Self {
        Self {
            directory: settings.directory.clone(),
            prefix: settings.prefix.clone(),
            interval: settings.interval_duration(),
            last_save: start,
        }
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_save) >= self.interval
    }

    /// Restart the interval from `now`.
    pub(crate) fn mark_saved(&mut self, now: Instant) {
        self.last_save = now;
    }

    pub(crate) fn path_for(&self, timestamp: &DateTime<Local>) -> PathBuf {
        self.directory.join(format!(
            "{}_{}.jpg",
            self.prefix,
            timestamp.format(TIMESTAMP_FORMAT)
        ))
    }

    pub(crate) fn directory(&self) -> &Path {
        &self.directory
    }
}
