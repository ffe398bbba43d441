//! The unconfirmed-transaction processor.
//!
//! Orchestrates validation, mempool insertion and removal, peer gossip,
//! and fork reconciliation. Every path that mutates the mempool holds
//! the process-wide blockchain lock and commits through a storage
//! transaction; peer I/O happens strictly after the lock is released.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;
use tower::{Service, ServiceExt};

use aureus_chain::{
    block::{Block, Height},
    error::ValidationError,
    parameters::{Network, NetworkUpgrade, MAX_TRANSACTION_DEADLINE},
    transaction::{Transaction, TransactionId, UnconfirmedTx},
};

use crate::components::{
    clock::Clock,
    ledger::Ledger,
    peer_set::{PeerSetService, Request},
};

use super::{
    local_origin::LocalOriginTracker,
    notify::{ListenerId, Listeners, MempoolChange, MempoolEvent},
    storage::{Storage, StorageError},
    MempoolError,
};

/// How far in the future a transaction timestamp may lie, in seconds.
const TIMESTAMP_DRIFT_TOLERANCE: u32 = 15;

/// The transaction processor.
///
/// Cheap to clone: clones share the chain lock, the storage trees, the
/// local-origin tracker, and the listener registry, so the background
/// workers and the node's API surface can all hold one.
pub struct TransactionProcessor<L: Ledger> {
    network: Network,
    chain: Arc<Mutex<L>>,
    storage: Storage,
    local_origin: LocalOriginTracker,
    listeners: Listeners,
    peers: PeerSetService,
    clock: Arc<dyn Clock>,
}

impl<L: Ledger> Clone for TransactionProcessor<L> {
    fn clone(&self) -> Self {
        TransactionProcessor {
            network: self.network,
            chain: self.chain.clone(),
            storage: self.storage.clone(),
            local_origin: self.local_origin.clone(),
            listeners: self.listeners.clone(),
            peers: self.peers.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<L: Ledger> TransactionProcessor<L> {
    /// Builds a processor over an opened storage and a chain handle.
    pub fn new(
        network: Network,
        chain: Arc<Mutex<L>>,
        storage: Storage,
        peers: PeerSetService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        TransactionProcessor {
            network,
            chain,
            storage,
            local_origin: LocalOriginTracker::default(),
            listeners: Listeners::default(),
            peers,
            clock,
        }
    }

    /// The network this processor validates against.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Read access to the persistent unconfirmed pool.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Looks up an unconfirmed transaction by id.
    pub fn unconfirmed_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<UnconfirmedTx>, StorageError> {
        self.storage.get(id)
    }

    /// Registers a listener for mempool mutation batches.
    pub fn add_listener<F>(&self, event: MempoolEvent, callback: F) -> ListenerId
    where
        F: Fn(&MempoolChange) + Send + Sync + 'static,
    {
        self.listeners.add(event, callback)
    }

    /// Removes a previously registered listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// The transaction format version used at `height`.
    pub fn transaction_version(&self, height: Height) -> u8 {
        if NetworkUpgrade::V1Transactions.is_active_at(self.network, height) {
            1
        } else {
            0
        }
    }

    /// Broadcasts a locally created transaction.
    ///
    /// On acceptance the transaction is tracked for rebroadcast until it
    /// is confirmed or echoed back from the network.
    pub async fn broadcast(&self, transaction: Arc<Transaction>) -> Result<(), MempoolError> {
        if !transaction.verify_signature() {
            return Err(ValidationError::NotValid(
                "transaction signature verification failed".into(),
            )
            .into());
        }

        let id = transaction.id();
        let accepted = self
            .process_transactions(vec![transaction.clone()], true)
            .await?;
        if accepted.iter().any(|tx| tx.id() == id) {
            self.local_origin.put(transaction);
            debug!(%id, "accepted new transaction");
            Ok(())
        } else {
            debug!(%id, "rejecting double spending transaction");
            Err(ValidationError::NotValid("double spending transaction".into()).into())
        }
    }

    /// Handles a peer push message: `{"transactions": [...]}`.
    pub async fn process_peer_push(&self, message: &Value) -> Result<(), MempoolError> {
        let transactions = message
            .get("transactions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ValidationError::NotValid("peer message is missing the transactions array".into())
            })?;
        self.process_peer_batch(transactions, true).await
    }

    /// Processes a batch of peer-supplied transactions, still in their
    /// JSON wire form.
    ///
    /// Permanent validation failures propagate, so the caller can
    /// blacklist the supplying peer. Transient failures do not poison
    /// gossip: the transaction stays in the batch and
    /// `apply_unconfirmed` is the next correctness gate.
    pub async fn process_peer_batch(
        &self,
        transactions_json: &[Value],
        send_to_peers: bool,
    ) -> Result<(), MempoolError> {
        let mut transactions = Vec::with_capacity(transactions_json.len());
        {
            let chain = self.lock_chain();
            let height = chain.height();
            for value in transactions_json {
                let transaction = match Transaction::from_json(value) {
                    Ok(transaction) => transaction,
                    Err(error) => {
                        debug!(%error, "invalid transaction from peer");
                        return Err(error.into());
                    }
                };
                match transaction.validate(&*chain, height, self.network) {
                    Ok(()) => {}
                    Err(error) if error.is_permanent() => {
                        debug!(%error, "invalid transaction from peer");
                        return Err(error.into());
                    }
                    Err(_) => {}
                }
                transactions.push(Arc::new(transaction));
            }
        }

        let ids: Vec<TransactionId> = transactions.iter().map(|tx| tx.id()).collect();
        self.process_transactions(transactions, send_to_peers).await?;

        // peer-echo suppression: anything a peer sent us no longer needs
        // rebroadcasting
        for id in ids {
            self.local_origin.remove(id);
        }
        Ok(())
    }

    /// Validates and inserts a batch of transactions.
    ///
    /// Each transaction gets its own critical section and storage
    /// transaction, so a failing transaction does not roll back earlier
    /// accepted ones. Returns the accepted transactions.
    pub async fn process_transactions(
        &self,
        transactions: Vec<Arc<Transaction>>,
        send_to_peers: bool,
    ) -> Result<Vec<Arc<Transaction>>, MempoolError> {
        let mut forward = Vec::new();
        let mut added_unconfirmed = Vec::new();
        let mut added_double_spending = Vec::new();

        'batch: for transaction in transactions {
            // cheap drift gate, outside the lock; rejects are silent
            let now = self.clock.epoch_time();
            if transaction.timestamp > now + TIMESTAMP_DRIFT_TOLERANCE
                || transaction.expiration() < now
                || transaction.deadline > MAX_TRANSACTION_DEADLINE
            {
                continue;
            }
            if transaction.version < 1 {
                continue;
            }

            let result = {
                let mut chain = self.lock_chain();
                if chain.is_downloading()
                    || !NetworkUpgrade::V1Transactions
                        .is_active_at(self.network, chain.height())
                {
                    // not ready to process transactions
                    break 'batch;
                }

                self.accept_transaction(
                    &mut chain,
                    &transaction,
                    send_to_peers,
                    &mut forward,
                    &mut added_unconfirmed,
                    &mut added_double_spending,
                )
            };
            if let Err(error) = result {
                error!(%error, "error processing transaction");
            }
        }

        if !forward.is_empty() {
            self.send_to_some_peers(forward).await;
        }

        self.listeners
            .notify(MempoolEvent::AddedUnconfirmed, &added_unconfirmed);
        self.listeners
            .notify(MempoolEvent::AddedDoubleSpending, &added_double_spending);

        Ok(added_unconfirmed)
    }

    /// One transaction's critical section: the duplicate gate, the
    /// signature gate, the unconfirmed apply, and the mempool insert,
    /// committed as a unit.
    fn accept_transaction(
        &self,
        chain: &mut MutexGuard<'_, L>,
        transaction: &Arc<Transaction>,
        send_to_peers: bool,
        forward: &mut Vec<Arc<Transaction>>,
        added_unconfirmed: &mut Vec<Arc<Transaction>>,
        added_double_spending: &mut Vec<Arc<Transaction>>,
    ) -> Result<(), MempoolError> {
        let id = transaction.id();
        if chain.has_confirmed_transaction(id) || self.storage.contains(id) {
            return Ok(());
        }

        if !transaction.verify_signature() {
            // only log for known accounts; unknown senders are noise
            if chain.account_exists(transaction.sender_id()) {
                debug!(%id, "transaction failed signature verification");
            }
            return Ok(());
        }

        if chain.apply_unconfirmed(transaction) {
            let entry = UnconfirmedTx::from(transaction.clone());
            if let Err(error) = self.storage.insert(&entry) {
                // the row did not commit, so take back the unconfirmed state
                chain.undo_unconfirmed(transaction);
                return Err(error.into());
            }
            if send_to_peers {
                if self.local_origin.remove(id).is_some() {
                    debug!(%id, "received back transaction that we generated, will not forward to peers");
                } else {
                    forward.push(transaction.clone());
                }
            }
            metrics::counter!("mempool.added.transactions.total").increment(1);
            added_unconfirmed.push(transaction.clone());
        } else {
            added_double_spending.push(transaction.clone());
        }
        Ok(())
    }

    /// Reconciles the mempool with a newly connected block: confirmed
    /// transactions leave the pool.
    pub fn on_block_applied(&self, block: &Block) -> Result<(), MempoolError> {
        let mut added_confirmed = Vec::new();
        let mut removed_unconfirmed = Vec::new();
        {
            let _chain = self.lock_chain();
            for transaction in &block.transactions {
                added_confirmed.push(transaction.clone());
                if let Some(entry) = self.storage.delete(transaction.id())? {
                    removed_unconfirmed.push(entry.transaction);
                }
            }
        }

        metrics::gauge!("mempool.size").set(self.storage.len() as f64);
        self.listeners
            .notify(MempoolEvent::RemovedUnconfirmed, &removed_unconfirmed);
        self.listeners
            .notify(MempoolEvent::AddedConfirmed, &added_confirmed);
        Ok(())
    }

    /// Returns a disconnected block's transactions to the mempool.
    pub fn on_block_undone(&self, block: &Block) -> Result<(), MempoolError> {
        let mut added_unconfirmed = Vec::new();
        {
            let mut chain = self.lock_chain();
            for transaction in &block.transactions {
                chain.undo(transaction);
                self.storage
                    .insert(&UnconfirmedTx::from(transaction.clone()))?;
                added_unconfirmed.push(transaction.clone());
            }
        }

        self.listeners
            .notify(MempoolEvent::AddedUnconfirmed, &added_unconfirmed);
        Ok(())
    }

    /// Re-applies unconfirmed state for `ids` after the ledger dropped
    /// it, deleting entries whose state no longer applies.
    pub fn apply_unconfirmed_batch(
        &self,
        ids: &HashSet<TransactionId>,
    ) -> Result<(), MempoolError> {
        let mut removed_unconfirmed = Vec::new();
        {
            let mut chain = self.lock_chain();
            for &id in ids {
                let Some(entry) = self.storage.get(id)? else {
                    continue;
                };
                if !chain.apply_unconfirmed(&entry.transaction) {
                    self.storage.delete(id)?;
                    removed_unconfirmed.push(entry.transaction);
                }
            }
        }

        self.listeners
            .notify(MempoolEvent::RemovedUnconfirmed, &removed_unconfirmed);
        Ok(())
    }

    /// Undoes the unconfirmed state of everything in the mempool,
    /// returning the touched ids.
    ///
    /// Rows are kept: this is used when the ledger is about to re-apply
    /// them through [`TransactionProcessor::apply_unconfirmed_batch`].
    pub fn undo_all_unconfirmed(&self) -> Result<HashSet<TransactionId>, MempoolError> {
        let mut chain = self.lock_chain();
        let mut undone = HashSet::new();
        for entry in self.storage.iter() {
            let entry = entry?;
            chain.undo_unconfirmed(&entry.transaction);
            undone.insert(entry.id);
        }
        Ok(undone)
    }

    /// Removes the given transactions from the mempool, undoing their
    /// unconfirmed state.
    pub fn remove_unconfirmed(
        &self,
        transactions: &[Arc<Transaction>],
    ) -> Result<(), MempoolError> {
        let mut removed = Vec::new();
        {
            let mut chain = self.lock_chain();
            for transaction in transactions {
                if let Some(entry) = self.storage.delete(transaction.id())? {
                    chain.undo_unconfirmed(&entry.transaction);
                    removed.push(entry.transaction);
                }
            }
        }

        self.listeners
            .notify(MempoolEvent::RemovedUnconfirmed, &removed);
        Ok(())
    }

    /// Sweeps expired entries out of the mempool, undoing their
    /// unconfirmed state. Returns the number of removed entries.
    pub fn sweep_expired(&self) -> Result<usize, MempoolError> {
        let now = self.clock.epoch_time();
        let removed = {
            let mut chain = self.lock_chain();
            let removed = self.storage.sweep_expired(now)?;
            for entry in &removed {
                chain.undo_unconfirmed(&entry.transaction);
            }
            removed
        };

        if !removed.is_empty() {
            metrics::counter!("mempool.expired.transactions.total")
                .increment(removed.len() as u64);
        }
        let batch: Vec<_> = removed.into_iter().map(|entry| entry.transaction).collect();
        self.listeners
            .notify(MempoolEvent::RemovedUnconfirmed, &batch);
        Ok(batch.len())
    }

    /// Hands a forward batch to the peer layer.
    ///
    /// Failures are logged, not propagated: gossip is best-effort and
    /// the rebroadcaster retries local transactions anyway.
    pub(super) async fn send_to_some_peers(&self, transactions: Vec<Arc<Transaction>>) {
        let count = transactions.len();
        let mut peers = self.peers.clone();
        match peers.ready().await {
            Ok(service) => {
                if let Err(error) = service.call(Request::SendTransactions(transactions)).await {
                    debug!(%error, "failed to send transactions to peers");
                } else {
                    metrics::counter!("mempool.gossiped.transactions.total")
                        .increment(count as u64);
                }
            }
            Err(error) => debug!(%error, "peer set unavailable"),
        }
    }

    pub(super) fn local_origin(&self) -> &LocalOriginTracker {
        &self.local_origin
    }

    pub(super) fn peers(&self) -> &PeerSetService {
        &self.peers
    }

    pub(super) fn chain(&self) -> &Arc<Mutex<L>> {
        &self.chain
    }

    pub(super) fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    fn lock_chain(&self) -> MutexGuard<'_, L> {
        self.chain.lock().expect("blockchain lock poisoned")
    }
}
