mod http;
mod local;

pub use http::HttpObject;
pub use local::LocalObject;

use async_trait::async_trait;
use std::fmt;
use std::io;

/// Byte range of an object to open. `end` is inclusive; `None` reads to the
/// end of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOption {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeOption {
    /// `length` bytes starting at `start`. `length` must be positive.
    pub fn bounded(start: u64, length: u64) -> Self {
        Self {
            start,
            end: Some(start.saturating_add(length - 1)),
        }
    }

    /// From `start` to the end of the object.
    pub fn to_end(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Number of bytes covered, `None` when open ended.
    pub fn length(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start) + 1)
    }
}

/// Formats as an HTTP `Range` header value.
impl fmt::Display for RangeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "bytes={}-{}", self.start, end),
            None => write!(f, "bytes={}-", self.start),
        }
    }
}

/// A remote object that can be opened at arbitrary byte ranges.
#[async_trait]
pub trait RemoteObject: Send + Sync {
    /// Total size of the object in bytes.
    fn size(&self) -> u64;

    /// Open a stream over `range`, or over the whole object when `None`.
    async fn open(&self, range: Option<RangeOption>) -> io::Result<Box<dyn ObjectStream>>;
}

/// An open stream over (part of) a remote object.
#[async_trait]
pub trait ObjectStream: Send {
    /// Read into `buf`, returning 0 at the end of the stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the underlying connection or handle.
    async fn close(&mut self) -> io::Result<()>;

    /// Streams that can move to another range without reopening return
    /// themselves here.
    fn range_seeker(&mut self) -> Option<&mut dyn RangeSeeker> {
        None
    }
}

/// In-place repositioning of an open stream.
#[async_trait]
pub trait RangeSeeker: Send {
    /// Move to `offset`, expecting about `length` bytes to be read from
    /// there (`None` for the rest of the object). Returns the position
    /// actually reached.
    async fn range_seek(&mut self, offset: u64, length: Option<u64>) -> io::Result<u64>;
}
