use clap::Parser;

use crate::chunk::{ChunkStrategy, DEFAULT_CHUNK_SIZE, MultiplierList};
use crate::size::SizeSuffix;

#[derive(Parser, Debug)]
#[command(name = "chunkcat")]
#[command(version)]
#[command(about = "Stream a local file or HTTP URL through an adaptive chunked reader", long_about = None)]
#[command(after_help = "Examples:\n  \
  chunkcat https://example.com/big.bin -o big.bin           doubling from 128M\n  \
  chunkcat --chunk-size 1M --chunk-size-limit 64M data.bin   1M doubling up to 64M\n  \
  chunkcat --chunk-schedule 2M,x2,64M https://example.com/f  explicit schedule\n  \
  chunkcat --offset 1000 --count 500 https://example.com/f   500 bytes from offset 1000")]
pub struct Cli {
    /// File path or HTTP URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// First chunk size; doubles after each chunk ("off" reads whole ranges)
    #[arg(long, value_name = "SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: SizeSuffix,

    /// Upper limit for the doubled chunk size ("off" for no limit)
    #[arg(long, value_name = "SIZE", default_value_t = SizeSuffix::OFF)]
    pub chunk_size_limit: SizeSuffix,

    /// Explicit chunk-size schedule, e.g. "2M,x2,64M,x4"
    #[arg(long, value_name = "LIST", conflicts_with_all = ["chunk_size", "chunk_size_limit"])]
    pub chunk_schedule: Option<MultiplierList>,

    /// Start reading at this byte offset
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub offset: u64,

    /// Stop after this many bytes
    #[arg(long, value_name = "BYTES")]
    pub count: Option<u64>,

    /// Write to this file instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Quiet mode, no statistics
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    /// Chunking configuration selected by the flags.
    pub fn strategy(&self) -> ChunkStrategy {
        match &self.chunk_schedule {
            Some(schedule) => ChunkStrategy::Schedule(schedule.clone()),
            None => ChunkStrategy::Doubling {
                min: self.chunk_size,
                max: self.chunk_size_limit,
            },
        }
    }

    /// Default `tracing` filter for the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "chunkread=debug",
            _ => "trace",
        }
    }
}
