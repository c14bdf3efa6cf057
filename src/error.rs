// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;

/// Recoverable failures when reading a frame from a camera.
///
/// Both kinds count towards the same retry limit, but only transport failures carry a message
/// that is reported when a sampling cycle is abandoned.
pub(crate) enum ReadError {
    /// A complete frame was read, but it contains values the camera cannot produce.
    InvalidFrame,

    /// Communicating with the camera failed.
    Transport(anyhow::Error),
}

impl ReadError {
    /// The message to report for this error, if there is one.
    pub(crate) fn message(&self) -> Option<String> {
        match self {
            Self::InvalidFrame => None,
            Self::Transport(err) => Some(format!("{:#}", err)),
        }
    }
}

impl fmt::Debug for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidFrame => f.debug_tuple("InvalidFrame").finish(),
            Self::Transport(e) => f.debug_tuple("Transport").field(e).finish(),
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidFrame => write!(f, "Invalid frame data"),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for ReadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidFrame => None,
            Self::Transport(e) => Some(e.as_ref()),
        }
    }
}

impl From<anyhow::Error> for ReadError {
    fn from(e: anyhow::Error) -> Self {
        Self::Transport(e)
    }
}
