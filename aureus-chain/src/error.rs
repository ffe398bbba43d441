//! Transaction validation errors.

use thiserror::Error;

/// An error validating a transaction.
///
/// The permanent/transient split is load-bearing for gossip: peers that
/// supply permanently invalid data get blacklisted, while transiently
/// invalid transactions are silently skipped and retried by ordinary
/// mempool churn.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ValidationError {
    /// The transaction can never become valid.
    #[error("invalid transaction: {0}")]
    NotValid(String),

    /// The transaction is not valid now, but may become valid after a
    /// rollback, a currency activation, or a registry change.
    #[error("transaction not currently valid: {0}")]
    NotCurrentlyValid(String),

    /// The transaction uses a feature that is not enabled yet.
    #[error("not yet enabled: {0}")]
    NotYetEnabled(String),
}

impl ValidationError {
    /// Returns true if this failure can never be resolved by chain growth
    /// or reorgs.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ValidationError::NotValid(_))
    }
}
