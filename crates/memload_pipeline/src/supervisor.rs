//! Pipeline supervisor (component C6): builds the reader/parser/writer
//! graph for one batch run, drives it through the shutdown state machine
//! and aggregates the final verdict.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::sync_channel;
use std::sync::Mutex;

use glob::glob;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, LoaderConfig, ERROR_RATE_THRESHOLD};
use crate::consumed::mark_consumed;
use crate::parse_worker;
use crate::reader;
use crate::router::ShardRouter;
use crate::stats::{StatsTally, Verdict};
use crate::writer;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to evaluate glob pattern {pattern:?}: {source}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Outcome of one complete batch run: every file discovered by the glob
/// pattern, processed through a single shared pipeline graph.
#[derive(Debug)]
pub struct BatchReport {
    pub files: Vec<PathBuf>,
    pub tally: StatsTally,
    pub verdict: Verdict,
}

/// Run one full batch: discover input files, build the pipeline graph,
/// drive readers -> parsers -> writers to completion, aggregate, and mark
/// every input file consumed unless the verdict is `NoDataProcessed`
/// (see DESIGN.md).
pub fn run_batch(config: &LoaderConfig) -> Result<BatchReport, PipelineError> {
    config.validate()?;

    let files = discover_files(&config.pattern)?;
    info!(count = files.len(), pattern = %config.pattern, "discovered input files");

    let writers_per_shard = config.writers_per_shard();
    info!(
        idfa = writers_per_shard[0],
        gaid = writers_per_shard[1],
        adid = writers_per_shard[2],
        dvid = writers_per_shard[3],
        "writer pool split across shards"
    );

    // BuildingGraph: every bounded queue in the graph, sized by `bufsize`.
    let (line_tx, line_rx) = sync_channel::<(u64, String)>(config.queue_capacity);
    let line_rx = Mutex::new(line_rx);

    let mut shard_tx_map = HashMap::new();
    let mut shard_rx_map = HashMap::new();
    for (tag, _) in config.shards.endpoints() {
        let (tx, rx) = sync_channel(config.queue_capacity);
        shard_tx_map.insert(tag.to_string(), tx);
        shard_rx_map.insert(tag.to_string(), Mutex::new(rx));
    }
    // The one master `ShardRouter`; every parse worker gets its own clone
    // and dropping this one (after parsers join) is what closes each shard
    // queue once the worker-held clones are already gone.
    let router = ShardRouter::new(shard_tx_map);

    let (stats_tx, stats_rx) = sync_channel::<StatsTally>(config.line_workers + config.store_workers + 4);

    std::thread::scope(|scope| {
        // Running: start parse workers, then writer pools, then readers.
        let parser_handles: Vec<_> = (0..config.line_workers)
            .map(|_| {
                let worker_router = router.clone();
                let worker_stats = stats_tx.clone();
                let line_rx = &line_rx;
                let dry_run = config.dry_run;
                scope.spawn(move || {
                    parse_worker::run(line_rx, &worker_router, &worker_stats, dry_run);
                })
            })
            .collect();

        let mut writer_handles = Vec::new();
        for (idx, (tag, endpoint)) in config.shards.endpoints().into_iter().enumerate() {
            let rx_mutex = shard_rx_map.get(tag).expect("shard queue built above");
            for _ in 0..writers_per_shard[idx] {
                let worker_stats = stats_tx.clone();
                let endpoint = endpoint.to_string();
                let timeout = config.store_timeout;
                writer_handles.push(scope.spawn(move || {
                    writer::run(rx_mutex, &endpoint, timeout, &worker_stats);
                }));
            }
        }

        let reader_handles: Vec<_> = files
            .iter()
            .map(|file| {
                let tx = line_tx.clone();
                let path = file.clone();
                scope.spawn(move || reader::read_file(&path, tx))
            })
            .collect();

        // Running -> DrainingReaders
        for handle in reader_handles {
            handle.join().expect("reader thread panicked");
        }

        // DrainingReaders -> DrainingParsers: close lineQ, then wait.
        drop(line_tx);
        for handle in parser_handles {
            handle.join().expect("parser thread panicked");
        }

        // DrainingParsers -> DrainingWriters: close every shard queue, then wait.
        drop(router);
        for handle in writer_handles {
            handle.join().expect("writer thread panicked");
        }
    });

    // DrainingWriters -> Aggregating: close statsQ, drain, sum.
    drop(stats_tx);
    let mut tally = StatsTally::default();
    while let Ok(partial) = stats_rx.recv() {
        tally.add(partial);
    }

    let verdict = Verdict::from_tally(tally, ERROR_RATE_THRESHOLD);
    info!(processed = tally.processed, errors = tally.errors, ?verdict, "batch aggregated");

    // Aggregating -> Done: mark every input file consumed, regardless of
    // success or failure, unless no data was processed at all.
    if verdict.should_rename() {
        for file in &files {
            mark_consumed(file);
        }
    } else {
        warn!("no data processed, leaving input files untouched");
    }

    Ok(BatchReport { files, tally, verdict })
}

fn discover_files(pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let paths = glob(pattern).map_err(|source| PipelineError::GlobPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => files.push(path),
            Err(err) => warn!(error = %err, "skipping unreadable glob entry"),
        }
    }
    files.sort();
    Ok(files)
}
