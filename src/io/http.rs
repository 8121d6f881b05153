use async_trait::async_trait;
use bytes::{Buf, Bytes};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::{ObjectStream, RangeOption, RemoteObject};

/// A remote object served over HTTP with Range request support.
///
/// Each `open` issues one GET; there are no retries.
pub struct HttpObject {
    client: Client,
    url: String,
    size: u64,
    requests: AtomicU64,
    transferred_bytes: Arc<AtomicU64>,
}

impl HttpObject {
    /// Create a new HTTP object.
    ///
    /// This will send a HEAD request to verify Range support and get file size
    pub async fn new(url: String) -> io::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(io::Error::other)?;

        let resp = client.head(&url).send().await.map_err(io::Error::other)?;

        if !resp.status().is_success() {
            return Err(io::Error::other(format!(
                "HTTP request failed with status: {}",
                resp.status()
            )));
        }

        // Check if server supports Range requests
        let accept_ranges = resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "Remote server does not support Range requests",
            ));
        }

        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| io::Error::other("Remote server did not return Content-Length"))?;

        debug!(%url, size, "remote object");

        Ok(Self {
            client,
            url,
            size,
            requests: AtomicU64::new(0),
            transferred_bytes: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of GET requests issued.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RemoteObject for HttpObject {
    fn size(&self) -> u64 {
        self.size
    }

    async fn open(&self, range: Option<RangeOption>) -> io::Result<Box<dyn ObjectStream>> {
        let mut request = self.client.get(&self.url);
        if let Some(range) = range {
            request = request.header(RANGE, range.to_string());
        }

        debug!(url = %self.url, ?range, "sending GET");
        self.requests.fetch_add(1, Ordering::Relaxed);
        let resp = request.send().await.map_err(io::Error::other)?;

        let status = resp.status();
        let accepted = match range {
            Some(_) => status == StatusCode::PARTIAL_CONTENT,
            None => status.is_success(),
        };
        if !accepted {
            return Err(io::Error::other(format!(
                "HTTP request failed with status: {}",
                status
            )));
        }

        Ok(Box::new(HttpStream {
            response: Some(resp),
            pending: Bytes::new(),
            transferred_bytes: self.transferred_bytes.clone(),
        }))
    }
}

/// Body of one GET, pulled lazily.
struct HttpStream {
    /// `None` once the body is exhausted or the stream closed.
    response: Option<Response>,
    pending: Bytes,
    transferred_bytes: Arc<AtomicU64>,
}

#[async_trait]
impl ObjectStream for HttpStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if !self.pending.is_empty() {
                let n = buf.len().min(self.pending.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok(n);
            }

            let Some(resp) = self.response.as_mut() else {
                return Ok(0);
            };
            match resp.chunk().await.map_err(io::Error::other)? {
                Some(chunk) => {
                    self.transferred_bytes
                        .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                    self.pending = chunk;
                }
                None => {
                    self.response = None;
                    return Ok(0);
                }
            }
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        // Dropping the response releases the connection.
        self.response = None;
        self.pending.clear();
        Ok(())
    }
}
