use async_trait::async_trait;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::{ObjectStream, RangeOption, RangeSeeker, RemoteObject};

/// A local file exposed as a remote object.
///
/// Every `open` creates a new file handle. Its streams support in-place
/// range seeks, so a chunked reader over a local file reuses one handle.
pub struct LocalObject {
    path: PathBuf,
    size: u64,
    opens: AtomicU64,
}

impl LocalObject {
    pub fn new(path: &Path) -> io::Result<Self> {
        let size = std::fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            size,
            opens: AtomicU64::new(0),
        })
    }

    /// Number of times the file was opened.
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RemoteObject for LocalObject {
    fn size(&self) -> u64 {
        self.size
    }

    async fn open(&self, range: Option<RangeOption>) -> io::Result<Box<dyn ObjectStream>> {
        debug!(path = %self.path.display(), ?range, "opening local file");
        let mut file = File::open(&self.path).await?;
        self.opens.fetch_add(1, Ordering::Relaxed);

        let mut remaining = None;
        if let Some(range) = range {
            if range.start > 0 {
                file.seek(SeekFrom::Start(range.start)).await?;
            }
            remaining = range.length();
        }

        Ok(Box::new(LocalStream { file, remaining }))
    }
}

struct LocalStream {
    file: File,
    /// Bytes left in the current range, `None` for unlimited.
    remaining: Option<u64>,
}

#[async_trait]
impl ObjectStream for LocalStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = match self.remaining {
            Some(remaining) => buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX)),
            None => buf.len(),
        };
        if limit == 0 {
            return Ok(0);
        }

        let n = self.file.read(&mut buf[..limit]).await?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= n as u64;
        }
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.remaining = Some(0);
        Ok(())
    }

    fn range_seeker(&mut self) -> Option<&mut dyn RangeSeeker> {
        Some(self)
    }
}

#[async_trait]
impl RangeSeeker for LocalStream {
    async fn range_seek(&mut self, offset: u64, length: Option<u64>) -> io::Result<u64> {
        let position = self.file.seek(SeekFrom::Start(offset)).await?;
        self.remaining = length.filter(|&length| length > 0);
        Ok(position)
    }
}
