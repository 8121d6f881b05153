//! Chunk-size strategies.
//!
//! A [`ChunkSizeIterator`] decides how many bytes the reader requests from
//! the remote object for each successive chunk. Two strategies ship with the
//! crate:
//!
//! - [`DoublingIterator`]: starts at a minimum and doubles up to a maximum.
//! - [`MultiplierList`]: an explicit schedule of anchors, optionally grown
//!   between anchors by a multiplier (`"2M,x2,64M"`).
//!
//! [`ChunkStrategy`] is the configuration form of either one.

mod doubling;
mod multiplier;

pub use doubling::DoublingIterator;
pub use multiplier::{MultiplierList, MultiplierListIter, ScheduleError};

use crate::size::SizeSuffix;

/// Default first chunk size.
pub const DEFAULT_CHUNK_SIZE: SizeSuffix = SizeSuffix::mib(128);

/// Yields the size of each chunk to request.
pub trait ChunkSizeIterator: Send {
    /// Size of the next chunk. `None` or `Some(0)` means read to the end of
    /// the object.
    fn next_chunk_size(&mut self) -> Option<u64>;

    /// Restart the sequence. Called after every seek with the explicit
    /// length the caller asked for, if any.
    fn reset(&mut self, length: Option<u64>);
}

impl<T: ChunkSizeIterator + ?Sized> ChunkSizeIterator for Box<T> {
    fn next_chunk_size(&mut self) -> Option<u64> {
        (**self).next_chunk_size()
    }

    fn reset(&mut self, length: Option<u64>) {
        (**self).reset(length)
    }
}

/// How a reader sizes its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Start at `min` and double every chunk up to `max`. A `min` that is
    /// zero or off disables chunking; a `max` that is off means no cap.
    Doubling { min: SizeSuffix, max: SizeSuffix },
    /// Follow an explicit schedule. An empty schedule disables chunking.
    Schedule(MultiplierList),
}

impl ChunkStrategy {
    /// Build a fresh iterator for one reader.
    pub fn iterator(&self) -> Box<dyn ChunkSizeIterator> {
        match self {
            ChunkStrategy::Doubling { min, max } => Box::new(DoublingIterator::new(
                min.bytes().unwrap_or(0),
                max.bytes(),
            )),
            ChunkStrategy::Schedule(list) => Box::new(list.iter()),
        }
    }

    /// True when every chunk extends to the end of the object.
    pub fn is_disabled(&self) -> bool {
        match self {
            ChunkStrategy::Doubling { min, .. } => min.bytes().unwrap_or(0) == 0,
            ChunkStrategy::Schedule(list) => list.is_empty(),
        }
    }
}

impl Default for ChunkStrategy {
    fn default() -> Self {
        ChunkStrategy::Doubling {
            min: DEFAULT_CHUNK_SIZE,
            max: SizeSuffix::OFF,
        }
    }
}
