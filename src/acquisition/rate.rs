// SPDX-License-Identifier: GPL-3.0-or-later
use std::time::Duration;

/// Average sampling rate over every recorded cycle.
///
/// Only the number of samples and their summed duration are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SampleRate {
    count: u64,
    total: Duration,
}

impl SampleRate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record one cycle and return the new average rate in samples per second.
    pub(crate) fn update(&mut self, elapsed: Duration) -> f64 {
        self.count += 1;
        self.total += elapsed;
        self.rate()
    }

    /// The current average rate, or `None` if nothing has been recorded yet.
    pub(crate) fn current(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.rate())
        }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn total(&self) -> Duration {
        self.total
    }

    fn rate(&self) -> f64 {
        let seconds = self.total.as_secs_f64();
        if seconds == 0.0 {
            f64::INFINITY
        } else {
            self.count as f64 / seconds
        }
    }
}
