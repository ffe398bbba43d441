//! The Aureus mempool.
//!
//! The mempool is the persistent set of transactions this node has
//! accepted but which have not yet been confirmed by a block. The
//! [`TransactionProcessor`] validates incoming transactions (locally
//! broadcast and gossiped), applies their unconfirmed state under the
//! process-wide blockchain lock, and reconciles the pool when blocks are
//! connected or disconnected.
//!
//! Three background workers keep the pool healthy:
//!
//! - the [`ExpirySweeper`] deletes entries whose deadline has passed,
//! - the [`Rebroadcaster`] re-announces local transactions until they
//!   are confirmed or echoed back by a peer,
//! - the [`Crawler`] pulls unconfirmed transactions from a random peer.
//!
//! The pool survives restarts: shutdown does not purge the database.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use aureus_chain::parameters::Network;

use crate::BoxError;

use super::{clock::Clock, ledger::Ledger, peer_set::PeerSetService};

mod config;
mod crawler;
mod error;
mod local_origin;
mod notify;
mod processor;
mod rebroadcast;
mod storage;
mod sweeper;


pub use config::Config;
pub use crawler::Crawler;
pub use error::MempoolError;
pub use local_origin::LocalOriginTracker;
pub use notify::{ListenerId, Listeners, MempoolChange, MempoolEvent};
pub use processor::TransactionProcessor;
pub use rebroadcast::Rebroadcaster;
pub use storage::{Storage, StorageError};
pub use sweeper::ExpirySweeper;

/// Builds the mempool subsystem and spawns its background workers.
///
/// Returns the processor handle and the worker join handles. The workers
/// run until aborted; a worker that resolves has hit a fatal failure and
/// the embedding node should shut the process down after logging it.
pub fn init<L>(
    config: Config,
    network: Network,
    chain: Arc<Mutex<L>>,
    peers: PeerSetService,
    clock: Arc<dyn Clock>,
) -> Result<
    (
        TransactionProcessor<L>,
        Vec<JoinHandle<Result<(), BoxError>>>,
    ),
    StorageError,
>
where
    L: Ledger,
{
    let storage = Storage::open(&config)?;
    let processor = TransactionProcessor::new(network, chain, storage, peers, clock);

    let tasks = vec![
        ExpirySweeper::spawn(config.sweep_interval, processor.clone()),
        Rebroadcaster::spawn(config.rebroadcast_interval, processor.clone()),
        Crawler::spawn(config.poll_interval, processor.clone()),
    ];

    Ok((processor, tasks))
}
