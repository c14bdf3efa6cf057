// SPDX-License-Identifier: GPL-3.0-or-later
use std::time::Instant;

use chrono::{DateTime, Local};

/// A source of time for the acquisition loop.
///
/// Elapsed time is measured with [Instant]s, while snapshot names use local wall-clock time.
pub(crate) trait Clock {
    fn now(&self) -> Instant;

    fn local_time(&self) -> DateTime<Local>;
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_time(&self) -> DateTime<Local> {
        Local::now()
    }
}
