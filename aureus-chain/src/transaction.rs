//! Transactions and transaction identifiers.

use std::{fmt, sync::Arc};

use sha2::{Digest, Sha256};

use crate::{
    account::AccountId,
    block::Height,
    currency::CurrencyRegistry,
    error::ValidationError,
    monetary_system,
    parameters::{Network, MAX_TRANSACTION_DEADLINE},
    primitives::ed25519,
    serialization::AureusSerialize,
};

pub mod attachment;
mod json;
mod serialize;


pub use attachment::Attachment;

/// A transaction identifier, derived from the canonical transaction
/// bytes: the first 8 bytes of their SHA-256 digest, in little-endian
/// order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An economic-clustering anchor: a recent block the transaction pins to,
/// constraining replay across forks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EcAnchor {
    /// The height of the anchor block.
    pub height: Height,
    /// The id of the anchor block.
    pub block_id: u64,
}

/// An Aureus transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    /// The format version: `0` before the `V1Transactions` upgrade, `1`
    /// at and after it.
    pub version: u8,
    /// Creation time, in epoch seconds.
    pub timestamp: u32,
    /// Lifetime past `timestamp`, in minutes.
    pub deadline: u16,
    /// The sender's ed25519 verification key.
    pub sender_public_key: [u8; 32],
    /// The recipient account, for transaction types that have one.
    pub recipient: Option<AccountId>,
    /// The amount of base coin moved, in quanta.
    pub amount: u64,
    /// The fee, in quanta of the base coin.
    pub fee: u64,
    /// The economic-clustering anchor; present exactly when `version >= 1`.
    pub ec_anchor: Option<EcAnchor>,
    /// The typed payload, fixing the transaction's type and subtype.
    pub attachment: Attachment,
    /// The sender's signature over the canonical bytes with this field
    /// zeroed.
    pub signature: [u8; 64],
}

impl Transaction {
    /// Computes the transaction id from the canonical bytes.
    pub fn id(&self) -> TransactionId {
        let bytes = self
            .aureus_serialize_to_vec()
            .expect("serialization into a vec can't fail");
        let digest = Sha256::digest(&bytes);
        let bytes: [u8; 8] = digest[..8].try_into().expect("digest is at least 8 bytes");
        TransactionId(u64::from_le_bytes(bytes))
    }

    /// The absolute expiry time, in epoch seconds.
    pub fn expiration(&self) -> u32 {
        self.timestamp
            .saturating_add(u32::from(self.deadline) * 60)
    }

    /// The sender account id, derived from the sender public key.
    pub fn sender_id(&self) -> AccountId {
        AccountId::from_public_key(&self.sender_public_key)
    }

    /// Verifies the signature over the unsigned canonical bytes.
    pub fn verify_signature(&self) -> bool {
        let Ok(key) = ed25519::VerificationKey::try_from(self.sender_public_key) else {
            return false;
        };
        let signature = ed25519::Signature::from(self.signature);
        key.verify(&signature, &self.unsigned_bytes()).is_ok()
    }

    /// Signs the transaction with `key`, replacing the sender public key
    /// and signature.
    pub fn sign(&mut self, key: &ed25519::SigningKey) {
        self.sender_public_key = ed25519::VerificationKey::from(key).into();
        self.signature = key.sign(&self.unsigned_bytes()).into();
    }

    /// Validates the transaction against its own fields and the Monetary
    /// System rules for its attachment.
    ///
    /// This is the full self-validation run on peer-supplied
    /// transactions; the processor applies its own drift and duplicate
    /// gates on top.
    pub fn validate<R: CurrencyRegistry>(
        &self,
        registry: &R,
        height: Height,
        network: Network,
    ) -> Result<(), ValidationError> {
        if self.version > 1 {
            return Err(ValidationError::NotValid(format!(
                "unsupported transaction version {}",
                self.version
            )));
        }
        if self.version >= 1 && self.ec_anchor.is_none() {
            return Err(ValidationError::NotValid(
                "version 1 transactions must carry an economic-clustering anchor".into(),
            ));
        }
        if self.deadline > MAX_TRANSACTION_DEADLINE {
            return Err(ValidationError::NotValid(format!(
                "invalid deadline {}",
                self.deadline
            )));
        }

        monetary_system::validate_transaction(self, registry, height, network)
    }

    /// The canonical bytes with the signature field zeroed; the message
    /// that is signed.
    fn unsigned_bytes(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        unsigned.signature = [0; 64];
        unsigned
            .aureus_serialize_to_vec()
            .expect("serialization into a vec can't fail")
    }
}

/// An unconfirmed transaction, with its id and expiry precomputed.
///
/// The id hashes the canonical bytes, so callers that look transactions
/// up repeatedly should use this wrapper instead of recomputing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnconfirmedTx {
    /// The cached transaction id.
    pub id: TransactionId,
    /// The absolute expiry, in epoch seconds.
    pub expiration: u32,
    /// The transaction itself.
    pub transaction: Arc<Transaction>,
}

impl From<Arc<Transaction>> for UnconfirmedTx {
    fn from(transaction: Arc<Transaction>) -> Self {
        UnconfirmedTx {
            id: transaction.id(),
            expiration: transaction.expiration(),
            transaction,
        }
    }
}

impl From<Transaction> for UnconfirmedTx {
    fn from(transaction: Transaction) -> Self {
        Arc::new(transaction).into()
    }
}
