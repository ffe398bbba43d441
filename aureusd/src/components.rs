//! Holds components of an Aureus node.

pub mod clock;
pub mod ledger;
pub mod mempool;
pub mod peer_set;
