// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;

use tracing::{debug, trace};

use crate::error::ReadError;

pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Bounds how many failed attempts are made before giving up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RetryPolicy {
    max_attempts: u32,
}

/// Every attempt allowed by a [RetryPolicy] failed.
#[derive(Debug)]
pub(crate) struct Exhausted {
    pub(crate) attempts: u32,
    pub(crate) last_error: ReadError,
}

impl Exhausted {
    /// The message from the final failure, if it had one.
    pub(crate) fn message(&self) -> Option<String> {
        self.last_error.message()
    }
}

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.message() {
            Some(message) => write!(
                f,
                "Failed after {} retries with error: {}",
                self.attempts, message
            ),
            None => write!(f, "Failed after {} retries", self.attempts),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy. At least one attempt is always made.
    pub(crate) fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub(crate) fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Call `attempt` until it succeeds or the attempt limit is reached.
    ///
    /// There is no delay between attempts.
    pub(crate) fn run<T, F>(&self, mut attempt: F) -> Result<T, Exhausted>
    where
        F: FnMut() -> Result<T, ReadError>,
    {
        let mut failures = 0;
        loop {
            match attempt() {
                Ok(value) => {
                    if failures > 0 {
                        debug!(failures, "read frame after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    failures += 1;
                    match &err {
                        // Invalid frames are retried without reporting their contents
                        ReadError::InvalidFrame => trace!(failures, "invalid frame"),
                        ReadError::Transport(_) => {
                            debug!(failures, error = %err, "unable to read frame")
                        }
                    }
                    if failures >= self.max_attempts {
                        return Err(Exhausted {
                            attempts: failures,
                            last_error: err,
                        });
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
