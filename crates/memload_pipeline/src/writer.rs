//! Shard writer pool (component C5): one pool per configured device type.

use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Mutex;
use std::time::Duration;

use memload_codec::EncodedItem;
use memload_store::StoreClient;
use tracing::{error, info};

use crate::stats::StatsTally;

/// Drain `items` until the shard queue closes, issuing one blocking store
/// write per item. No retries: a transport or protocol error just counts as
/// an error and the item is dropped.
///
/// The store client is connected once, up front, and owned solely by this
/// worker — never shared across threads. If the initial connect fails, the
/// worker still drains its queue (so the pipeline can shut down cleanly)
/// but every item it would have written counts as an error.
pub fn run(
    items: &Mutex<Receiver<EncodedItem>>,
    addr: &str,
    timeout: Duration,
    stats_tx: &SyncSender<StatsTally>,
) {
    let mut client = match StoreClient::connect(addr, timeout) {
        Ok(client) => Some(client),
        Err(err) => {
            error!(addr, error = %err, "failed to connect to shard store, items will be counted as errors");
            None
        }
    };

    let mut tally = StatsTally::default();

    loop {
        let next = {
            let guard = items.lock().expect("item queue mutex poisoned");
            guard.recv()
        };
        let Ok(item) = next else {
            break;
        };

        match client.as_mut() {
            Some(store) => match store.set(&item.key, &item.payload) {
                Ok(()) => {
                    tally.processed += 1;
                    info!(key = %item.key, "stored");
                }
                Err(err) => {
                    tally.errors += 1;
                    error!(key = %item.key, error = %err, "store write failed");
                }
            },
            None => {
                tally.errors += 1;
            }
        }

        if tally.should_flush() {
            let _ = stats_tx.send(tally);
            tally = StatsTally::default();
        }
    }

    let _ = stats_tx.send(tally);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc::sync_channel;
    use std::thread;

    fn spawn_fake_store(reply: &'static str, expected_sets: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                for _ in 0..expected_sets {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    let _ = stream.write_all(reply.as_bytes());
                }
            }
        });
        addr
    }

    fn item(key: &str) -> EncodedItem {
        EncodedItem {
            line_num: 0,
            key: key.to_string(),
            payload: b"payload".to_vec(),
        }
    }

    #[test]
    fn successful_writes_are_tallied_as_processed() {
        let addr = spawn_fake_store("STORED\r\n", 2);
        let (item_tx, item_rx) = sync_channel(4);
        let (stats_tx, stats_rx) = sync_channel(4);

        item_tx.send(item("idfa:a")).unwrap();
        item_tx.send(item("idfa:b")).unwrap();
        drop(item_tx);

        run(&Mutex::new(item_rx), &addr, Duration::from_millis(500), &stats_tx);

        let tally = stats_rx.try_recv().unwrap();
        assert_eq!(tally, StatsTally::new(2, 0));
    }

    #[test]
    fn store_errors_are_tallied_as_errors() {
        let addr = spawn_fake_store("ERROR\r\n", 1);
        let (item_tx, item_rx) = sync_channel(4);
        let (stats_tx, stats_rx) = sync_channel(4);

        item_tx.send(item("idfa:a")).unwrap();
        drop(item_tx);

        run(&Mutex::new(item_rx), &addr, Duration::from_millis(500), &stats_tx);

        let tally = stats_rx.try_recv().unwrap();
        assert_eq!(tally, StatsTally::new(0, 1));
    }

    #[test]
    fn unreachable_store_counts_every_item_as_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener); // nobody listening

        let (item_tx, item_rx) = sync_channel(4);
        let (stats_tx, stats_rx) = sync_channel(4);
        item_tx.send(item("idfa:a")).unwrap();
        drop(item_tx);

        run(&Mutex::new(item_rx), &addr, Duration::from_millis(200), &stats_tx);

        let tally = stats_rx.try_recv().unwrap();
        assert_eq!(tally, StatsTally::new(0, 1));
    }
}
