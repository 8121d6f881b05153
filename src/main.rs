//! Main entry point for the chunkcat CLI application.
//!
//! Streams a local file or HTTP URL through a [`ChunkedReader`] to stdout
//! or a file, then reports how many range requests it took.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use chunkread::{ChunkedReader, Cli, HttpObject, LocalObject, RemoteObject};

/// Size of the copy buffer.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Application entry point.
///
/// Parses command-line arguments and dispatches on whether the source is a
/// local file or an HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.is_http_url() {
        let object = Arc::new(HttpObject::new(cli.source.clone()).await?);
        let copied = cat(object.clone(), &cli).await?;

        if !cli.quiet {
            eprintln!(
                "\n{} copied in {} requests, {} transferred",
                format_size(copied),
                object.requests(),
                format_size(object.transferred_bytes())
            );
        }
    } else {
        let object = Arc::new(
            LocalObject::new(Path::new(&cli.source))
                .with_context(|| format!("cannot open {}", cli.source))?,
        );
        let copied = cat(object.clone(), &cli).await?;

        if !cli.quiet {
            eprintln!("\n{} copied in {} opens", format_size(copied), object.opens());
        }
    }

    Ok(())
}

/// Copy the selected part of `object` to the configured output.
///
/// Returns the number of bytes copied.
async fn cat<O: RemoteObject + 'static>(object: Arc<O>, cli: &Cli) -> Result<u64> {
    let reader = ChunkedReader::with_strategy(object, &cli.strategy());

    if cli.offset > 0 || cli.count.is_some() {
        // The count becomes the length of the first chunk.
        reader
            .range_seek(SeekFrom::Start(cli.offset), cli.count)
            .await
            .with_context(|| format!("cannot seek to {}", cli.offset))?;
    }

    let copied = match &cli.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {path}"))?;
            copy(&reader, &mut file, cli.count).await?
        }
        None => copy(&reader, &mut tokio::io::stdout(), cli.count).await?,
    };

    reader.close().await?;
    Ok(copied)
}

/// Copy from `reader` to `out` until the object ends or `limit` bytes
/// were written.
async fn copy<O, W>(reader: &ChunkedReader<O>, out: &mut W, limit: Option<u64>) -> Result<u64>
where
    O: RemoteObject + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;

    loop {
        let want = match limit {
            Some(limit) => {
                let left = limit - copied;
                if left == 0 {
                    break;
                }
                buf.len().min(usize::try_from(left).unwrap_or(usize::MAX))
            }
            None => buf.len(),
        };

        let n = reader.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
        copied += n as u64;
    }

    out.flush().await?;
    Ok(copied)
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
