mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use memload_codec::{decode_payload, encode_payload, parse_line};
use memload_logging::{init_logging, LogConfig};
use memload_pipeline::{LoaderConfig, ShardSpec, Verdict, DEFAULT_STORE_TIMEOUT};

/// Hardcoded two-line sample used by `--test`.
const SELF_TEST_LINES: [&str; 2] = [
    "idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1423,43,567,3,7,23",
    "gaid\tB\t3.0\t4.0\t2,3",
];

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        verbose: cli.verbose,
        log_file: cli.log.as_deref(),
        log_json: cli.log_json,
    };
    if let Err(err) = init_logging(log_config) {
        eprintln!("failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    if cli.test {
        return match run_self_test() {
            Ok(()) => {
                info!("self-test passed");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(error = %err, "self-test failed");
                ExitCode::FAILURE
            }
        };
    }

    match run_load(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup failure");
            ExitCode::FAILURE
        }
    }
}

fn run_self_test() -> anyhow::Result<()> {
    for line in SELF_TEST_LINES {
        let record = parse_line(line).with_context(|| format!("sample line failed to parse: {line:?}"))?;
        let payload = encode_payload(record.lat, record.lon, &record.apps);
        let (lat, lon, apps) = decode_payload(&payload).context("sample payload failed to decode")?;
        anyhow::ensure!(
            lat.to_bits() == record.lat.to_bits(),
            "lat round-trip mismatch for {line:?}: {lat} != {}",
            record.lat
        );
        anyhow::ensure!(
            lon.to_bits() == record.lon.to_bits(),
            "lon round-trip mismatch for {line:?}: {lon} != {}",
            record.lon
        );
        anyhow::ensure!(
            apps == record.apps,
            "apps round-trip mismatch for {line:?}: {apps:?} != {:?}",
            record.apps
        );
    }
    Ok(())
}

fn run_load(cli: &Cli) -> anyhow::Result<()> {
    let config = LoaderConfig {
        pattern: cli.pattern.clone(),
        shards: ShardSpec {
            idfa: cli.idfa.clone().context("--idfa is required")?,
            gaid: cli.gaid.clone().context("--gaid is required")?,
            adid: cli.adid.clone().context("--adid is required")?,
            dvid: cli.dvid.clone().context("--dvid is required")?,
        },
        line_workers: cli.lworkers,
        store_workers: cli.mworkers,
        queue_capacity: cli.bufsize,
        dry_run: cli.dry,
        store_timeout: DEFAULT_STORE_TIMEOUT,
    };

    let report = memload_pipeline::run_batch(&config).context("pipeline run failed")?;

    match report.verdict {
        Verdict::Success => info!(
            processed = report.tally.processed,
            errors = report.tally.errors,
            "successful load"
        ),
        Verdict::Failed => error!(
            processed = report.tally.processed,
            errors = report.tally.errors,
            "failed load"
        ),
        Verdict::NoDataProcessed => error!("no data processed"),
    }

    Ok(())
}
