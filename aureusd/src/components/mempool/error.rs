//! Errors that can occur when processing unconfirmed transactions.

use thiserror::Error;

use aureus_chain::error::ValidationError;

use super::storage::StorageError;

/// An error from the mempool component.
#[derive(Error, Debug)]
pub enum MempoolError {
    /// A transaction failed validation.
    ///
    /// Permanent failures on the peer path cause the supplying peer to be
    /// blacklisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The storage layer failed; the enclosing storage transaction was
    /// rolled back.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MempoolError {
    /// Returns true when the process should stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        match self {
            MempoolError::Storage(error) => error.is_fatal(),
            MempoolError::Validation(_) => false,
        }
    }
}
