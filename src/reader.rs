//! Chunked reading over a [`RemoteObject`].
//!
//! [`ChunkedReader`] serves sequential reads and seeks while fetching the
//! object in byte ranges whose sizes come from a [`ChunkSizeIterator`].
//! Small reads near the start stay cheap, long sequential reads grow into
//! large requests, and a seek restarts the size sequence at the new
//! position.
//!
//! ## Range acquisition
//!
//! When a read needs a new range, the currently open stream is asked for
//! in-place repositioning first (see [`ObjectStream::range_seeker`]). If the
//! stream cannot seek, the seek fails, or it lands somewhere else, the
//! stream is closed and the object is opened again at the new range.
//!
//! ## Locking
//!
//! All state sits behind one async mutex, held for the full duration of
//! each operation including the I/O it performs. Operations on one reader
//! never interleave; separate readers over the same object are independent.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::chunk::{ChunkSizeIterator, ChunkStrategy, DoublingIterator, MultiplierList};
use crate::error::{Error, Result};
use crate::io::{ObjectStream, RangeOption, RemoteObject};

/// Buffer size used by [`ChunkedReader::read_to_end`].
const DRAIN_BUFFER_SIZE: usize = 64 * 1024;

/// Where the next read starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// No stream is positioned for the pending chunk; acquire before reading.
    Reacquire,
    /// The open stream delivers the byte at this offset next.
    At(u64),
    /// Terminal.
    Closed,
}

struct ReaderState {
    /// Stream for the current chunk. Kept across seeks for in-place reuse.
    stream: Option<Box<dyn ObjectStream>>,
    position: Position,
    /// Start of the current or next chunk.
    chunk_offset: u64,
    /// Length of the current or next chunk, `None` to the end of the object.
    chunk_size: Option<u64>,
    sizes: Box<dyn ChunkSizeIterator>,
    /// I/O error hit after some bytes were already returned.
    deferred: Option<io::Error>,
}

/// Zero means unbounded, same as `None`.
fn bounded(size: Option<u64>) -> Option<u64> {
    size.filter(|&size| size > 0)
}

/// Fill `buf` completely. Hitting the end of the stream first reports
/// `UnexpectedEof` along with the number of bytes read.
async fn read_full(stream: &mut dyn ObjectStream, buf: &mut [u8]) -> (usize, io::Result<()>) {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => return (filled, Err(io::ErrorKind::UnexpectedEof.into())),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (filled, Err(err)),
        }
    }
    (filled, Ok(()))
}

impl ReaderState {
    fn chunk_end(&self) -> Option<u64> {
        self.chunk_size.map(|size| self.chunk_offset.saturating_add(size))
    }

    /// The offset a `SeekFrom::Current` is relative to.
    fn logical_offset(&self) -> u64 {
        match self.position {
            Position::At(offset) => offset,
            Position::Reacquire | Position::Closed => self.chunk_offset,
        }
    }

    /// Report `err` now, or defer it if `total` bytes are already on their
    /// way to the caller.
    fn fail(&mut self, total: usize, err: Error) -> Result<usize> {
        match err {
            Error::Io(err) if total > 0 => {
                debug!(%err, total, "deferring read error");
                self.deferred = Some(err);
                Ok(total)
            }
            err => Err(err),
        }
    }

    /// Position a stream at `chunk_offset` for `chunk_size` bytes and
    /// return the offset reached.
    async fn open_range<O>(&mut self, object: &O) -> Result<u64>
    where
        O: RemoteObject + ?Sized,
    {
        let (offset, length) = (self.chunk_offset, self.chunk_size);
        debug!(offset, ?length, "open range");

        if self.position == Position::Closed {
            return Err(Error::Closed);
        }

        if let Some(seeker) = self.stream.as_mut().and_then(|stream| stream.range_seeker()) {
            match seeker.range_seek(offset, length).await {
                Ok(landed) if landed == offset => {
                    self.position = Position::At(offset);
                    return Ok(offset);
                }
                Ok(landed) => {
                    debug!(wanted = offset, landed, "range seek landed elsewhere, reopening");
                }
                Err(err) => debug!(%err, "range seek failed, reopening"),
            }
        }

        self.position = Position::Reacquire;
        self.release_stream().await?;

        let range = match length {
            None if offset == 0 => None,
            None => Some(RangeOption::to_end(offset)),
            Some(length) => Some(RangeOption::bounded(offset, length)),
        };
        self.stream = Some(object.open(range).await?);
        self.position = Position::At(offset);
        Ok(offset)
    }

    /// Close the open stream, if any. The handle is dropped even when
    /// closing fails.
    async fn release_stream(&mut self) -> io::Result<()> {
        match self.stream.take() {
            Some(mut stream) => {
                debug!("closing stream");
                stream.close().await
            }
            None => Ok(()),
        }
    }
}

/// Reads a [`RemoteObject`] in progressively sized chunks.
///
/// ```no_run
/// use std::sync::Arc;
/// use chunkread::{ChunkedReader, HttpObject};
///
/// # async fn demo() -> chunkread::Result<()> {
/// let object = Arc::new(HttpObject::new("https://example.com/big.bin".to_string()).await?);
/// // 1 MiB first, doubling up to 64 MiB per request.
/// let reader = ChunkedReader::new(object, 1 << 20, Some(64 << 20));
/// let mut buf = vec![0u8; 4096];
/// let n = reader.read(&mut buf).await?;
/// assert!(n <= buf.len());
/// # Ok(())
/// # }
/// ```
pub struct ChunkedReader<O: RemoteObject + ?Sized> {
    object: Arc<O>,
    state: Mutex<ReaderState>,
}

impl<O: RemoteObject + ?Sized> ChunkedReader<O> {
    /// Chunks start at `initial_chunk_size` and double after each chunk up
    /// to `max_chunk_size` (`None` for no cap). An initial size of 0
    /// disables chunking. Seeking restarts at the initial size.
    pub fn new(object: Arc<O>, initial_chunk_size: u64, max_chunk_size: Option<u64>) -> Self {
        Self::with_iterator(object, DoublingIterator::new(initial_chunk_size, max_chunk_size))
    }

    /// Chunk sizes follow `schedule`. An empty schedule disables chunking.
    pub fn with_schedule(object: Arc<O>, schedule: &MultiplierList) -> Self {
        Self::with_iterator(object, schedule.iter())
    }

    /// Chunk sizes follow the doubling or schedule `strategy`.
    pub fn with_strategy(object: Arc<O>, strategy: &ChunkStrategy) -> Self {
        Self::with_iterator(object, strategy.iterator())
    }

    /// Chunk sizes come from `sizes`. A size of `None` or 0 disables
    /// chunking for that chunk.
    pub fn with_iterator<I>(object: Arc<O>, mut sizes: I) -> Self
    where
        I: ChunkSizeIterator + 'static,
    {
        let chunk_size = bounded(sizes.next_chunk_size());
        Self {
            object,
            state: Mutex::new(ReaderState {
                stream: None,
                position: Position::Reacquire,
                chunk_offset: 0,
                chunk_size,
                sizes: Box::new(sizes),
                deferred: None,
            }),
        }
    }

    /// The object being read.
    pub fn object(&self) -> &Arc<O> {
        &self.object
    }

    /// Offset of the next byte a read returns, `None` once closed.
    pub async fn position(&self) -> Option<u64> {
        let state = self.state.lock().await;
        match state.position {
            Position::Closed => None,
            _ => Some(state.logical_offset()),
        }
    }

    /// Read up to `buf.len()` bytes, fetching new chunks as boundaries are
    /// crossed. Returns 0 at the end of the object.
    ///
    /// The buffer is filled completely unless the object ends or an error
    /// occurs. An error after some bytes were read is reported by the next
    /// call.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().await;

        if state.position == Position::Closed {
            return Err(Error::Closed);
        }
        if let Some(err) = state.deferred.take() {
            return Err(err.into());
        }

        let size = self.object.size();
        let mut total = 0;
        while total < buf.len() {
            debug!(
                position = ?state.position,
                want = buf.len() - total,
                chunk_offset = state.chunk_offset,
                chunk_size = ?state.chunk_size,
                "read"
            );

            if let Position::At(offset) = state.position {
                if state.chunk_end() == Some(offset) {
                    state.chunk_offset = offset;
                    state.chunk_size = bounded(state.sizes.next_chunk_size());
                    state.position = Position::Reacquire;
                }
            }

            let offset = match state.position {
                Position::At(offset) => offset,
                Position::Reacquire => {
                    if state.chunk_offset >= size {
                        break;
                    }
                    match state.open_range(&*self.object).await {
                        Ok(offset) => offset,
                        Err(err) => return state.fail(total, err),
                    }
                }
                Position::Closed => return Err(Error::Closed),
            };

            let rest = &mut buf[total..];
            let want = match state.chunk_end() {
                Some(end) => rest
                    .len()
                    .min(usize::try_from(end.saturating_sub(offset)).unwrap_or(usize::MAX)),
                None => rest.len(),
            };

            let (n, result) = match state.stream.as_mut() {
                Some(stream) => read_full(stream.as_mut(), &mut rest[..want]).await,
                None => (0, Err(io::ErrorKind::NotConnected.into())),
            };
            total += n;
            state.position = Position::At(offset + n as u64);

            match result {
                Ok(()) => {}
                // A short chunk means the object ended.
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(err) => return state.fail(total, err.into()),
            }
        }

        Ok(total)
    }

    /// Read everything from the current position to the end of the object.
    pub async fn read_to_end(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; DRAIN_BUFFER_SIZE];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    /// Move to `pos`. Same as [`range_seek`](Self::range_seek) without a
    /// length hint.
    pub async fn seek(&self, pos: SeekFrom) -> Result<u64> {
        self.range_seek(pos, None).await
    }

    /// Move to `pos`; the next chunk is `length` bytes long when given,
    /// otherwise the chunk-size sequence restarts.
    ///
    /// Nothing is opened until the next read. A target outside
    /// `[0, size)` fails with [`Error::InvalidSeek`] and leaves the reader
    /// at offset 0.
    pub async fn range_seek(&self, pos: SeekFrom, length: Option<u64>) -> Result<u64> {
        let mut state = self.state.lock().await;
        debug!(from = ?state.position, to = ?pos, ?length, "range seek");

        if state.position == Position::Closed {
            return Err(Error::Closed);
        }

        let size = self.object.size();
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(delta) => i128::from(size) + i128::from(delta),
            SeekFrom::Current(delta) => i128::from(state.logical_offset()) + i128::from(delta),
        };

        state.position = Position::Reacquire;
        state.deferred = None;
        state.sizes.reset(length);
        state.chunk_size = match bounded(length) {
            Some(length) => Some(length),
            None => bounded(state.sizes.next_chunk_size()),
        };

        if target < 0 || target >= i128::from(size) {
            state.chunk_offset = 0;
            return Err(Error::InvalidSeek { offset: target });
        }
        state.chunk_offset = target as u64;
        Ok(state.chunk_offset)
    }

    /// Acquire the pending range now instead of on the next read. Does
    /// nothing when a stream is already positioned.
    pub async fn open(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.stream.is_some() && matches!(state.position, Position::At(_)) {
            return Ok(());
        }
        state.open_range(&*self.object).await.map(|_| ())
    }

    /// Close the open stream. Every later call, including another `close`,
    /// fails with [`Error::Closed`].
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.position == Position::Closed {
            return Err(Error::Closed);
        }
        state.position = Position::Closed;
        state.deferred = None;
        state.release_stream().await?;
        Ok(())
    }
}
