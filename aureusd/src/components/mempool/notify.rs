//! Typed notification fan-out for mempool mutations.
//!
//! Listeners run synchronously on the thread that completed the
//! mutation, after its storage transaction committed. Empty batches are
//! not emitted. A panicking listener is logged and isolated, so later
//! listeners still run and notification order is preserved.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, RwLock},
};

use aureus_chain::transaction::Transaction;

/// The kinds of mempool mutation events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MempoolEvent {
    /// Transactions entered the unconfirmed pool.
    AddedUnconfirmed,
    /// Transactions left the unconfirmed pool.
    RemovedUnconfirmed,
    /// Transactions were confirmed by a block.
    AddedConfirmed,
    /// Transactions were rejected as double spends.
    AddedDoubleSpending,
}

/// A batch of transactions attached to a [`MempoolEvent`].
#[derive(Clone, Debug)]
pub struct MempoolChange {
    /// What happened to the batch.
    pub event: MempoolEvent,
    /// The affected transactions; never empty.
    pub transactions: Vec<Arc<Transaction>>,
}

type Callback = Arc<dyn Fn(&MempoolChange) + Send + Sync>;

/// A handle identifying a registered listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ListenerId(u64);

/// A copy-on-write listener registry.
///
/// Registration and removal are rare; notification is frequent, so it
/// snapshots the listener list without holding the lock across
/// callbacks.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<RwLock<ListenerSet>>,
}

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    entries: Arc<Vec<(ListenerId, MempoolEvent, Callback)>>,
}

impl Listeners {
    /// Registers `callback` for `event` batches.
    pub fn add<F>(&self, event: MempoolEvent, callback: F) -> ListenerId
    where
        F: Fn(&MempoolChange) + Send + Sync + 'static,
    {
        let mut set = self.inner.write().expect("listener registry lock poisoned");
        let id = ListenerId(set.next_id);
        set.next_id += 1;

        let callback: Callback = Arc::new(callback);
        let mut entries = Vec::clone(&set.entries);
        entries.push((id, event, callback));
        set.entries = Arc::new(entries);
        id
    }

    /// Removes a listener. Returns true if it was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut set = self.inner.write().expect("listener registry lock poisoned");
        let mut entries = Vec::clone(&set.entries);
        let before = entries.len();
        entries.retain(|(entry_id, _, _)| *entry_id != id);
        let removed = entries.len() != before;
        set.entries = Arc::new(entries);
        removed
    }

    /// Notifies the listeners registered for `event`.
    ///
    /// Empty batches are not emitted.
    pub fn notify(&self, event: MempoolEvent, transactions: &[Arc<Transaction>]) {
        if transactions.is_empty() {
            return;
        }

        let entries = {
            let set = self.inner.read().expect("listener registry lock poisoned");
            Arc::clone(&set.entries)
        };
        let change = MempoolChange {
            event,
            transactions: transactions.to_vec(),
        };
        for (_, registered_event, callback) in entries.iter() {
            if *registered_event != event {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(&change))).is_err() {
                warn!(?event, "mempool listener panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn listeners_filter_by_event_and_skip_empty_batches() {
        let listeners = Listeners::default();
        let added = Arc::new(AtomicUsize::new(0));
        let removed = Arc::new(AtomicUsize::new(0));

        let added_count = added.clone();
        listeners.add(MempoolEvent::AddedUnconfirmed, move |change| {
            added_count.fetch_add(change.transactions.len(), Ordering::SeqCst);
        });
        let removed_count = removed.clone();
        let removed_id = listeners.add(MempoolEvent::RemovedUnconfirmed, move |change| {
            removed_count.fetch_add(change.transactions.len(), Ordering::SeqCst);
        });

        let tx = Arc::new(crate::components::mempool::tests::test_payment(0));
        listeners.notify(MempoolEvent::AddedUnconfirmed, &[tx.clone()]);
        listeners.notify(MempoolEvent::AddedUnconfirmed, &[]);
        listeners.notify(MempoolEvent::RemovedUnconfirmed, &[tx.clone()]);

        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert_eq!(removed.load(Ordering::SeqCst), 1);

        assert!(listeners.remove(removed_id));
        assert!(!listeners.remove(removed_id));
        listeners.notify(MempoolEvent::RemovedUnconfirmed, &[tx]);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_listeners_are_isolated() {
        let listeners = Listeners::default();
        let reached = Arc::new(AtomicUsize::new(0));

        listeners.add(MempoolEvent::AddedUnconfirmed, |_| {
            panic!("listener failure");
        });
        let reached_count = reached.clone();
        listeners.add(MempoolEvent::AddedUnconfirmed, move |_| {
            reached_count.fetch_add(1, Ordering::SeqCst);
        });

        let tx = Arc::new(crate::components::mempool::tests::test_payment(0));
        listeners.notify(MempoolEvent::AddedUnconfirmed, &[tx]);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }
}
