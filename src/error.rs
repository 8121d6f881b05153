//! Error types returned by the chunked reader.

use std::io;

use thiserror::Error;

use crate::chunk::ScheduleError;

/// Errors produced by [`ChunkedReader`](crate::ChunkedReader) and friends.
#[derive(Error, Debug)]
pub enum Error {
    /// The reader was closed; every further operation fails with this.
    #[error("file already closed")]
    Closed,

    /// A seek resolved to a position outside `[0, size)`.
    #[error("invalid seek position {offset}")]
    InvalidSeek { offset: i128 },

    /// Failure reported by the remote object or one of its streams.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Malformed multiplier schedule.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl Error {
    /// Returns true for [`Error::Closed`].
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// Returns true for [`Error::InvalidSeek`].
    pub fn is_invalid_seek(&self) -> bool {
        matches!(self, Error::InvalidSeek { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
