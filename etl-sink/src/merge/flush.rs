use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::TableId;

/// Requests that the staged entries of a destination are merged into its final table.
///
/// Requests are fire-and-forget: the caller neither waits for the merge nor observes its outcome.
/// A request may arrive for every registered record once the merge threshold is reached, and from
/// several threads at once, so implementations must be cheap when there is nothing new to merge
/// and must serialize the merges themselves.
pub trait MergeFlush {
    /// Requests a merge flush of `table_id`.
    fn merge_flush(&self, table_id: &TableId);
}

impl<T> MergeFlush for Arc<T>
where
    T: MergeFlush + ?Sized,
{
    fn merge_flush(&self, table_id: &TableId) {
        (**self).merge_flush(table_id)
    }
}

/// [`MergeFlush`] that forwards requests to an asynchronous merge worker over a channel.
///
/// A request for a table that is already waiting to be picked up is dropped, so the worker sees
/// each table at most once per pick-up no matter how many records crossed the threshold meanwhile.
#[derive(Debug, Clone)]
pub struct ChannelMergeFlush {
    tx: mpsc::UnboundedSender<TableId>,
    pending: Arc<Mutex<HashSet<TableId>>>,
}

/// Receiving half of a [`ChannelMergeFlush`], owned by the merge worker.
#[derive(Debug)]
pub struct MergeFlushReceiver {
    rx: mpsc::UnboundedReceiver<TableId>,
    pending: Arc<Mutex<HashSet<TableId>>>,
}

/// Creates a connected [`ChannelMergeFlush`] and [`MergeFlushReceiver`] pair.
pub fn merge_flush_channel() -> (ChannelMergeFlush, MergeFlushReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(Mutex::new(HashSet::new()));

    (
        ChannelMergeFlush {
            tx,
            pending: pending.clone(),
        },
        MergeFlushReceiver { rx, pending },
    )
}

impl MergeFlush for ChannelMergeFlush {
    fn merge_flush(&self, table_id: &TableId) {
        // A poisoned set only loses deduplication, requests still go through.
        let newly_pending = match self.pending.lock() {
            Ok(mut pending) => pending.insert(table_id.clone()),
            Err(_) => true,
        };

        if !newly_pending {
            debug!(table = %table_id, "merge flush already pending, skipping request");
            return;
        }

        if self.tx.send(table_id.clone()).is_err() {
            warn!(table = %table_id, "merge flush receiver is closed, dropping request");
        }
    }
}

impl MergeFlushReceiver {
    /// Waits for the next table to merge.
    ///
    /// Returns [`None`] once every [`ChannelMergeFlush`] has been dropped and all requests have
    /// been received.
    pub async fn recv(&mut self) -> Option<TableId> {
        let table_id = self.rx.recv().await?;

        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&table_id);
        }

        Some(table_id)
    }
}
