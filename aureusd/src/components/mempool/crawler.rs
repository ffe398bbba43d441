//! The mempool transaction crawler.
//!
//! Periodically asks a random connected peer for its unconfirmed
//! transactions and runs them through the processor, so this node's
//! mempool converges with the network's even when push gossip misses
//! it. A peer that replies with permanently invalid data is
//! blacklisted.

use std::{net::SocketAddr, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tower::{timeout::Timeout, Service, ServiceExt};
use tracing_futures::Instrument;

use crate::{
    components::{
        ledger::Ledger,
        peer_set::{PeerSetService, Request, Response},
    },
    BoxError,
};

use super::{MempoolError, TransactionProcessor};

/// The time to wait for a peer response.
///
/// # Correctness
///
/// If this timeout is removed or set too high, the crawler can hang
/// waiting for an unresponsive peer and stop pulling from the rest of
/// the network.
const PEER_RESPONSE_TIMEOUT: Duration = Duration::from_secs(6);

/// The periodic peer-pull task.
pub struct Crawler<L: Ledger> {
    interval: Duration,
    peer_set: Timeout<PeerSetService>,
    processor: TransactionProcessor<L>,
}

impl<L: Ledger> Crawler<L> {
    /// Spawns an asynchronous task to run the mempool crawler.
    pub fn spawn(
        interval: Duration,
        processor: TransactionProcessor<L>,
    ) -> JoinHandle<Result<(), BoxError>> {
        let crawler = Crawler {
            interval,
            peer_set: Timeout::new(processor.peers().clone(), PEER_RESPONSE_TIMEOUT),
            processor,
        };
        tokio::spawn(crawler.run().in_current_span())
    }

    /// Periodically pulls unconfirmed transactions from a random peer.
    async fn run(mut self) -> Result<(), BoxError> {
        info!("initializing mempool crawler task");

        loop {
            sleep(self.interval).await;
            if let Err(error) = self.crawl().await {
                debug!(%error, "error processing unconfirmed transactions from peer");
            }
        }
    }

    /// One crawl: pull from a random peer and process the reply.
    async fn crawl(&mut self) -> Result<(), BoxError> {
        let response = self
            .peer_set
            .ready()
            .await?
            .call(Request::PullUnconfirmedTransactions)
            .await?;

        let (peer, transactions) = match response {
            Response::UnconfirmedTransactions { peer, transactions } => (peer, transactions),
            Response::Nil => return Ok(()),
        };
        if transactions.is_empty() {
            return Ok(());
        }
        trace!(count = transactions.len(), %peer, "mempool crawler received transactions");

        match self.processor.process_peer_batch(&transactions, false).await {
            Ok(()) => Ok(()),
            Err(MempoolError::Validation(error)) if error.is_permanent() => {
                self.blacklist(peer, error.to_string()).await;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Sanctions a peer that supplied permanently invalid data.
    async fn blacklist(&mut self, peer: SocketAddr, reason: String) {
        warn!(%peer, %reason, "blacklisting peer for invalid transaction data");
        match self.peer_set.ready().await {
            Ok(service) => {
                if let Err(error) = service.call(Request::Blacklist(peer, reason)).await {
                    debug!(%error, "failed to blacklist peer");
                }
            }
            Err(error) => debug!(%error, "peer set unavailable"),
        }
    }
}
