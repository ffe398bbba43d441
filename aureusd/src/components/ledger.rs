//! The confirmed-chain seam the mempool depends on.

use aureus_chain::{
    account::AccountId,
    block::Height,
    currency::CurrencyRegistry,
    transaction::{Transaction, TransactionId},
};

/// Confirmed-chain state and speculative balance tracking.
///
/// The block/consensus engine implements this trait. The mempool reaches
/// it only through the process-wide blockchain lock
/// (`Arc<Mutex<L: Ledger>>`), which serializes every mutation that must
/// stay consistent with the confirmed ledger.
pub trait Ledger: CurrencyRegistry + Send + 'static {
    /// The current best chain height.
    fn height(&self) -> Height;

    /// Returns true while the initial block download is still running.
    fn is_downloading(&self) -> bool;

    /// Returns true if the confirmed chain contains `id`.
    fn has_confirmed_transaction(&self, id: TransactionId) -> bool;

    /// Returns true if an account exists for `id`.
    fn account_exists(&self, id: AccountId) -> bool;

    /// Applies the speculative (unconfirmed) effects of `transaction` to
    /// balances and reservations.
    ///
    /// Returns false when the sender cannot cover the transaction: a
    /// double spend from the mempool's point of view.
    fn apply_unconfirmed(&mut self, transaction: &Transaction) -> bool;

    /// Reverses the speculative effects of an earlier successful
    /// [`Ledger::apply_unconfirmed`].
    fn undo_unconfirmed(&mut self, transaction: &Transaction);

    /// Reverses the confirmed effects of `transaction` after its block
    /// was disconnected from the chain.
    fn undo(&mut self, transaction: &Transaction);
}
