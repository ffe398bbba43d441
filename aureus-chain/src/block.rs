//! Blocks, as consumed by the unconfirmed-transaction processor.
//!
//! Block headers, consensus data, and block validation live in the block
//! processor. The mempool only reconciles its contents against the
//! transactions a block confirms or un-confirms, so this module carries
//! just enough of a block to do that.

use std::sync::Arc;

use crate::transaction::Transaction;

/// The height of a block in the chain.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Height(pub u32);

impl Height {
    /// The maximum representable height.
    pub const MAX: Height = Height(u32::MAX);
}

impl std::fmt::Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The parts of a confirmed block the mempool cares about.
#[derive(Clone, Debug)]
pub struct Block {
    /// The height the block was connected or disconnected at.
    pub height: Height,
    /// The transactions confirmed by the block.
    pub transactions: Vec<Arc<Transaction>>,
}
