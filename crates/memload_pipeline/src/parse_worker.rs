//! Parse/route worker pool (component C4).

use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Mutex;

use memload_codec::{encode_item, parse_line};
use tracing::{debug, error};

use crate::router::ShardRouter;
use crate::stats::StatsTally;

/// Drain `lines` (shared by the whole pool behind a mutex, the classic
/// thread-pool-over-one-queue shape) until it closes, parsing, routing and
/// encoding each line. Never sends to the store directly and never closes
/// any queue — that is the supervisor's job alone.
pub fn run(
    lines: &Mutex<Receiver<(u64, String)>>,
    router: &ShardRouter,
    stats_tx: &SyncSender<StatsTally>,
    dry_run: bool,
) {
    let mut errors: u64 = 0;

    loop {
        let next = {
            let guard = lines.lock().expect("line queue mutex poisoned");
            guard.recv()
        };
        let Ok((line_num, line)) = next else {
            break;
        };

        match parse_line(&line) {
            Err(err) => {
                errors += 1;
                debug!(line_num, error = %err, "parse failure");
            }
            Ok(record) => {
                let item = encode_item(line_num, &record);
                if dry_run {
                    debug!(key = %item.key, "dry-run: would store");
                    continue;
                }
                if let Err(err) = router.send(&record.dev_type, item) {
                    errors += 1;
                    error!(line_num, error = %err, "routing failure");
                }
            }
        }
    }

    let _ = stats_tx.send(StatsTally::new(0, errors));
}
