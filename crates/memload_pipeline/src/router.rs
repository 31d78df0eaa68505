//! Shard router (component C2): `devType` -> the shard queue's sender.

use std::collections::HashMap;
use std::sync::mpsc::SyncSender;
use thiserror::Error;

use memload_codec::EncodedItem;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown device type: {0:?}")]
pub struct UnknownDeviceType(pub String);

/// A read-only, per-worker view of the shard queues. Built once from the
/// supervisor's senders and cloned into every parse worker; the map itself
/// never mutates after construction so no synchronization is needed on the
/// read path.
#[derive(Clone)]
pub struct ShardRouter {
    queues: HashMap<String, SyncSender<EncodedItem>>,
}

impl ShardRouter {
    pub fn new(queues: HashMap<String, SyncSender<EncodedItem>>) -> Self {
        Self { queues }
    }

    /// Route `item` (carrying `dev_type`) to its shard queue, blocking if
    /// that queue is full.
    pub fn send(&self, dev_type: &str, item: EncodedItem) -> Result<(), UnknownDeviceType> {
        match self.queues.get(dev_type) {
            Some(sender) => {
                // A closed receiver here means the supervisor is shutting
                // down; dropping the item silently matches "no retry" policy.
                let _ = sender.send(item);
                Ok(())
            }
            None => Err(UnknownDeviceType(dev_type.to_string())),
        }
    }
}
