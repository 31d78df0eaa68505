//! The concurrent bulk loader pipeline: a glob pattern of gzipped TSV files
//! goes in, one `set` per device record comes out the other side in a
//! sharded store, driven by a bounded, backpressured graph of threads.

mod config;
mod consumed;
mod parse_worker;
mod reader;
mod router;
mod stats;
mod supervisor;
mod writer;

pub use config::{ConfigError, LoaderConfig, ShardSpec, DEFAULT_STORE_TIMEOUT, DEVICE_TYPES, ERROR_RATE_THRESHOLD};
pub use stats::{StatsTally, Verdict};
pub use supervisor::{run_batch, BatchReport, PipelineError};
