//! Process-wide configuration frozen at startup (component C10/C2's data).

use std::time::Duration;
use thiserror::Error;

/// The four device-type tags the loader recognizes, in the order the source
/// variant iterates them (used to break remainder ties when splitting
/// writer workers across shards).
pub const DEVICE_TYPES: [&str; 4] = ["idfa", "gaid", "adid", "dvid"];

/// Default store-connect/IO timeout. The design allows a 1-2s range; this
/// crate fixes it at the low end and does not expose a flag for it).
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(1500);

/// File-level error rate at or above which a batch is declared failed.
pub const ERROR_RATE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// `devType -> host:port`, one endpoint per recognized device type.
#[derive(Debug, Clone)]
pub struct ShardSpec {
    pub idfa: String,
    pub gaid: String,
    pub adid: String,
    pub dvid: String,
}

impl ShardSpec {
    /// The endpoint configured for `dev_type`, in the canonical order.
    pub fn endpoints(&self) -> [(&'static str, &str); 4] {
        [
            ("idfa", self.idfa.as_str()),
            ("gaid", self.gaid.as_str()),
            ("adid", self.adid.as_str()),
            ("dvid", self.dvid.as_str()),
        ]
    }
}

/// The loader's full runtime configuration, assembled from CLI args.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub pattern: String,
    pub shards: ShardSpec,
    /// Size of the fixed parse/route worker pool.
    pub line_workers: usize,
    /// Total shard-writer workers, split across 4 shards.
    pub store_workers: usize,
    /// Capacity applied to every bounded queue.
    pub queue_capacity: usize,
    /// Skip store sends; parse workers log intended keys instead.
    pub dry_run: bool,
    pub store_timeout: Duration,
}

impl LoaderConfig {
    /// Validate the glob pattern eagerly so a bad pattern is a
    /// `startup_failure`, not a silent empty file list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        glob::Pattern::new(&self.pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })?;
        Ok(())
    }

    /// Per-shard writer pool sizes, in `DEVICE_TYPES` order. `store_workers`
    /// is split evenly; any remainder is assigned to the first shards in
    /// iteration order (see DESIGN.md).
    pub fn writers_per_shard(&self) -> [usize; 4] {
        let base = self.store_workers / DEVICE_TYPES.len();
        let remainder = self.store_workers % DEVICE_TYPES.len();
        let mut sizes = [base; 4];
        for slot in sizes.iter_mut().take(remainder) {
            *slot += 1;
        }
        sizes
    }
}
