//! Tracking of locally originated transactions.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use aureus_chain::transaction::{Transaction, TransactionId};

/// The set of transactions this node originated that have not yet been
/// observed confirmed or echoed back from the network.
///
/// Used only for gossip suppression and rebroadcast; never consulted for
/// validation decisions. An entry's lifetime ends when the transaction
/// is confirmed, echoed back by a peer, or expires.
#[derive(Clone, Default)]
pub struct LocalOriginTracker {
    inner: Arc<Mutex<HashMap<TransactionId, Arc<Transaction>>>>,
}

impl LocalOriginTracker {
    /// Starts tracking `transaction`.
    pub fn put(&self, transaction: Arc<Transaction>) {
        self.lock().insert(transaction.id(), transaction);
    }

    /// Stops tracking `id`, returning the transaction if it was tracked.
    pub fn remove(&self, id: TransactionId) -> Option<Arc<Transaction>> {
        self.lock().remove(&id)
    }

    /// Returns true if `id` is tracked.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// A point-in-time copy of the tracked transactions.
    pub fn snapshot(&self) -> Vec<Arc<Transaction>> {
        self.lock().values().cloned().collect()
    }

    /// The number of tracked transactions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TransactionId, Arc<Transaction>>> {
        self.inner.lock().expect("local origin tracker lock poisoned")
    }
}
