//! In-memory remote object that records every range it is opened with.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chunkread::{ObjectStream, RangeOption, RangeSeeker, RemoteObject};

/// Deterministic test content.
pub fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[derive(Default)]
pub struct Counters {
    pub opens: Mutex<Vec<Option<RangeOption>>>,
    pub seeks: AtomicUsize,
    pub closes: AtomicUsize,
    /// Fail the next close once.
    pub fail_next_close: AtomicBool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekMode {
    /// Streams have no range-seek capability.
    Unsupported,
    /// Streams seek in place correctly.
    Exact,
    /// Streams report landing one byte past the target.
    Misplaced,
    /// Streams fail every range seek.
    Failing,
}

pub struct MockObject {
    data: Arc<Vec<u8>>,
    seek_mode: SeekMode,
    /// Reads fail when they reach this absolute offset.
    fail_read_at: Option<u64>,
    pub counters: Arc<Counters>,
}

impl MockObject {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            seek_mode: SeekMode::Unsupported,
            fail_read_at: None,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_seek_mode(mut self, mode: SeekMode) -> Self {
        self.seek_mode = mode;
        self
    }

    pub fn with_read_failure_at(mut self, offset: u64) -> Self {
        self.fail_read_at = Some(offset);
        self
    }

    pub fn opens(&self) -> Vec<Option<RangeOption>> {
        self.counters.opens.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.counters.opens.lock().unwrap().len()
    }

    pub fn seek_count(&self) -> usize {
        self.counters.seeks.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn fail_next_close(&self) {
        self.counters.fail_next_close.store(true, Ordering::SeqCst);
    }

    fn end_of(&self, start: u64, length: Option<u64>) -> u64 {
        let size = self.data.len() as u64;
        match length {
            Some(length) => start.saturating_add(length).min(size),
            None => size,
        }
    }
}

#[async_trait]
impl RemoteObject for MockObject {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open(&self, range: Option<RangeOption>) -> io::Result<Box<dyn ObjectStream>> {
        self.counters.opens.lock().unwrap().push(range);

        let (start, end) = match range {
            None => (0, self.size()),
            Some(range) => {
                if range.start >= self.size() {
                    return Err(io::Error::other("range not satisfiable"));
                }
                (range.start, self.end_of(range.start, range.length()))
            }
        };

        Ok(Box::new(MockStream {
            data: self.data.clone(),
            pos: start,
            end,
            seek_mode: self.seek_mode,
            fail_read_at: self.fail_read_at,
            counters: self.counters.clone(),
        }))
    }
}

struct MockStream {
    data: Arc<Vec<u8>>,
    pos: u64,
    /// Exclusive end of the open range.
    end: u64,
    seek_mode: SeekMode,
    fail_read_at: Option<u64>,
    counters: Arc<Counters>,
}

#[async_trait]
impl ObjectStream for MockStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut end = self.end;
        if let Some(fail_at) = self.fail_read_at {
            if self.pos == fail_at {
                return Err(io::Error::other("injected read failure"));
            }
            if self.pos < fail_at {
                end = end.min(fail_at);
            }
        }

        let n = buf.len().min((end - self.pos) as usize);
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_next_close.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("injected close failure"));
        }
        Ok(())
    }

    fn range_seeker(&mut self) -> Option<&mut dyn RangeSeeker> {
        match self.seek_mode {
            SeekMode::Unsupported => None,
            _ => Some(self),
        }
    }
}

#[async_trait]
impl RangeSeeker for MockStream {
    async fn range_seek(&mut self, offset: u64, length: Option<u64>) -> io::Result<u64> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        let size = self.data.len() as u64;
        match self.seek_mode {
            SeekMode::Failing => Err(io::Error::other("seek not possible")),
            SeekMode::Misplaced => Ok(offset + 1),
            _ => {
                self.pos = offset.min(size);
                self.end = match length {
                    Some(length) => offset.saturating_add(length).min(size),
                    None => size,
                };
                Ok(self.pos)
            }
        }
    }
}
