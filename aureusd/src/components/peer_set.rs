//! A handle to the peer set.
//!
//! Peer connection management and wire framing live outside this crate;
//! the mempool reaches peers through this request/response seam. The
//! JSON message shapes exchanged on the wire are fixed here so both
//! sides of the seam agree on them.

use std::{net::SocketAddr, sync::Arc};

use serde_json::{json, Value};
use tower::{buffer::Buffer, util::BoxService, Service};

use aureus_chain::transaction::Transaction;

use crate::BoxError;

/// A request to the peer layer.
#[derive(Clone, Debug)]
pub enum Request {
    /// Ask a random connected peer for its unconfirmed transactions.
    PullUnconfirmedTransactions,

    /// Send transactions to some of the connected peers.
    SendTransactions(Vec<Arc<Transaction>>),

    /// Blacklist a peer that supplied permanently invalid data.
    Blacklist(SocketAddr, String),
}

/// A response from the peer layer.
#[derive(Clone, Debug)]
pub enum Response {
    /// The answering peer and its unconfirmed transactions, still in
    /// their JSON wire form.
    UnconfirmedTransactions {
        /// The peer that answered, so it can be blacklisted if the data
        /// turns out to be invalid.
        peer: SocketAddr,
        /// The `unconfirmedTransactions` array from the peer's reply.
        transactions: Vec<Value>,
    },

    /// An empty response: no connected peer, or nothing to report.
    Nil,
}

/// A shared, buffered handle to the peer set service.
pub type PeerSetService = Buffer<BoxService<Request, Response, BoxError>, Request>;

/// Wraps a peer set implementation in the shared handle type.
pub fn buffered<S>(service: S) -> PeerSetService
where
    S: Service<Request, Response = Response, Error = BoxError> + Send + 'static,
    S::Future: Send,
{
    Buffer::new(BoxService::new(service), 64)
}

/// The wire request asking a peer for its unconfirmed transactions.
pub fn get_unconfirmed_transactions_request() -> Value {
    json!({ "requestType": "getUnconfirmedTransactions" })
}

/// The wire response listing a node's unconfirmed transactions.
pub fn unconfirmed_transactions_response(transactions: &[Arc<Transaction>]) -> Value {
    json!({
        "unconfirmedTransactions": transactions
            .iter()
            .map(|tx| tx.to_json())
            .collect::<Vec<_>>(),
    })
}

/// The wire push message gossiping transactions to a peer.
pub fn push_transactions_message(transactions: &[Arc<Transaction>]) -> Value {
    json!({
        "transactions": transactions
            .iter()
            .map(|tx| tx.to_json())
            .collect::<Vec<_>>(),
    })
}
