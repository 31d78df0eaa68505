//! CLI surface.

use std::path::PathBuf;

use clap::Parser;

/// Bulk-load gzipped installed-apps TSV dumps into a sharded store.
#[derive(Debug, Parser)]
#[command(name = "memload", version, about)]
pub struct Cli {
    /// Glob pattern of input files, matched against the current directory.
    #[arg(long, default_value = "*.tsv.gz")]
    pub pattern: String,

    /// `idfa` shard endpoint, `host:port`. Required unless `--test` is given.
    #[arg(long, required_unless_present = "test")]
    pub idfa: Option<String>,

    /// `gaid` shard endpoint, `host:port`. Required unless `--test` is given.
    #[arg(long, required_unless_present = "test")]
    pub gaid: Option<String>,

    /// `adid` shard endpoint, `host:port`. Required unless `--test` is given.
    #[arg(long, required_unless_present = "test")]
    pub adid: Option<String>,

    /// `dvid` shard endpoint, `host:port`. Required unless `--test` is given.
    #[arg(long, required_unless_present = "test")]
    pub dvid: Option<String>,

    /// Total shard-writer workers, split evenly across the four shards.
    #[arg(long, default_value_t = 200)]
    pub mworkers: usize,

    /// Parse/route worker pool size.
    #[arg(long, default_value_t = 4)]
    pub lworkers: usize,

    /// Capacity applied to every bounded queue in the pipeline.
    #[arg(long, default_value_t = 100_000)]
    pub bufsize: usize,

    /// Skip store sends; parse workers log intended keys instead.
    #[arg(long)]
    pub dry: bool,

    /// Run the encode/decode self-check and exit without touching any file.
    #[arg(long)]
    pub test: bool,

    /// Append log output to this file instead of (in addition to) stderr.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Raise the default log level to debug.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit file log output as JSON lines instead of plain text.
    #[arg(long)]
    pub log_json: bool,
}
