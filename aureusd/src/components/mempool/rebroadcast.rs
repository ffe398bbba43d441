//! Re-announcement of locally originated transactions.
//!
//! Until a locally broadcast transaction is seen confirmed or echoed
//! back by a peer, it is periodically re-sent to peers in case the
//! initial announcement was lost.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing_futures::Instrument;

use aureus_chain::transaction::Transaction;

use crate::{components::ledger::Ledger, BoxError};

use super::TransactionProcessor;

/// How old a transaction must be before it is re-announced, in seconds.
///
/// Young transactions are still propagating from their first
/// announcement.
const REBROADCAST_MIN_AGE: u32 = 30;

/// The periodic rebroadcast task.
pub struct Rebroadcaster<L: Ledger> {
    interval: Duration,
    processor: TransactionProcessor<L>,
}

impl<L: Ledger> Rebroadcaster<L> {
    /// Spawns an asynchronous task to run the rebroadcaster.
    pub fn spawn(
        interval: Duration,
        processor: TransactionProcessor<L>,
    ) -> JoinHandle<Result<(), BoxError>> {
        let rebroadcaster = Rebroadcaster {
            interval,
            processor,
        };
        tokio::spawn(rebroadcaster.run().in_current_span())
    }

    /// Periodically re-announces stale local transactions.
    async fn run(self) -> Result<(), BoxError> {
        info!("initializing transaction rebroadcast task");

        loop {
            sleep(self.interval).await;
            let stale = self.collect_stale();
            if !stale.is_empty() {
                debug!(count = stale.len(), "re-announcing local transactions");
                self.processor.send_to_some_peers(stale).await;
            }
        }
    }

    /// Drops tracked transactions that were confirmed or expired, and
    /// returns the ones old enough to re-announce.
    ///
    /// The blockchain lock is held only for the confirmed-id lookups,
    /// never across peer I/O.
    fn collect_stale(&self) -> Vec<Arc<Transaction>> {
        let now = self.processor.clock().epoch_time();
        let snapshot = self.processor.local_origin().snapshot();
        let mut stale = Vec::new();

        let chain = self
            .processor
            .chain()
            .lock()
            .expect("blockchain lock poisoned");
        for transaction in snapshot {
            let id = transaction.id();
            if chain.has_confirmed_transaction(id) || transaction.expiration() < now {
                self.processor.local_origin().remove(id);
            } else if transaction.timestamp < now.saturating_sub(REBROADCAST_MIN_AGE) {
                stale.push(transaction);
            }
        }
        stale
    }
}
