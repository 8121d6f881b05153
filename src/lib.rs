//! # chunkread
//!
//! Adaptive chunked reading over remote objects.
//!
//! Object stores and remote filesystems answer byte-range requests but
//! charge a fixed latency for each one. Fetching a whole object wastes
//! bandwidth when only the start is read; fetching tiny ranges wastes round
//! trips. [`ChunkedReader`] sits between the two: it serves ordinary reads
//! and seeks while requesting ranges whose size grows as reading continues,
//! either by doubling ([`DoublingIterator`]) or along an explicit schedule
//! ([`MultiplierList`]).
//!
//! ## Features
//!
//! - Sequential and random access reads with lazy range acquisition
//! - Doubling chunk sizes between a minimum and a maximum
//! - Chunk-size schedules such as `"2M,x2,64M,x4"`
//! - In-place repositioning of streams that support it, reopening otherwise
//! - HTTP backend using Range requests, and a local file backend
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chunkread::{ChunkedReader, HttpObject, MultiplierList};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let object = Arc::new(HttpObject::new("https://example.com/archive.bin".to_string()).await?);
//!
//!     // 2 MiB, then doubling up to 64 MiB, then 64 MiB requests.
//!     let schedule: MultiplierList = "2M,x2,64M".parse()?;
//!     let reader = ChunkedReader::with_schedule(object.clone(), &schedule);
//!
//!     let data = reader.read_to_end().await?;
//!     println!("{} bytes in {} requests", data.len(), object.requests());
//!
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod cli;
pub mod error;
pub mod io;
pub mod reader;
pub mod size;

pub use chunk::{
    ChunkSizeIterator, ChunkStrategy, DoublingIterator, MultiplierList, MultiplierListIter,
    ScheduleError,
};
pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{HttpObject, LocalObject, ObjectStream, RangeOption, RangeSeeker, RemoteObject};
pub use reader::ChunkedReader;
pub use size::{SizeError, SizeSuffix};
