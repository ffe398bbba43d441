//! Persistent storage for unconfirmed transactions.
//!
//! The pool lives in two sled trees: `unconfirmed_transaction` maps a
//! transaction id to its expiration and canonical bytes, and
//! `unconfirmed_by_expiration` is an index ordered by expiry that the
//! sweeper scans. Every write touches both trees inside one sled
//! transaction, so a crash cannot leave the index out of sync with the
//! rows.
//!
//! Rows store the canonical transaction bytes and are reparsed on load;
//! a row that no longer parses is fatal, since the database can no
//! longer be trusted.

use std::sync::Arc;

use sled::{
    transaction::{ConflictableTransactionError, TransactionError},
    Transactional,
};
use thiserror::Error;

use aureus_chain::{
    block::Height,
    serialization::{AureusDeserialize, AureusSerialize, SerializationError},
    transaction::{Transaction, TransactionId, UnconfirmedTx},
};

use super::Config;

#[cfg(test)]
mod tests;

const UNCONFIRMED_TREE: &str = "unconfirmed_transaction";
const EXPIRATION_TREE: &str = "unconfirmed_by_expiration";

/// A storage failure.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying database failed; the enclosing transaction was
    /// rolled back.
    #[error("mempool database error: {0}")]
    Database(#[from] sled::Error),

    /// A stored row no longer parses as a transaction.
    #[error("corrupt mempool row for transaction {id}: {source}")]
    Corrupt {
        /// The row's transaction id.
        id: u64,
        /// The parse failure.
        source: SerializationError,
    },

    /// The expiry index contained a malformed key.
    #[error("corrupt mempool expiration index entry")]
    CorruptIndex,
}

impl StorageError {
    /// Returns true when the process should stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StorageError::Corrupt { .. } | StorageError::CorruptIndex
        )
    }
}

/// The persistent set of unconfirmed transactions.
///
/// Cheap to clone: clones share the same trees. Writes must happen under
/// the blockchain lock; reads can happen anywhere and observe sled's
/// current snapshot.
#[derive(Clone)]
pub struct Storage {
    unconfirmed: sled::Tree,
    by_expiration: sled::Tree,
}

impl Storage {
    /// Opens (or creates) the mempool database under `config.cache_dir`.
    pub fn open(config: &Config) -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .path(config.cache_dir.join("mempool"))
            .open()?;
        Self::from_db(&db)
    }

    /// Opens the mempool trees on an existing database.
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Storage {
            unconfirmed: db.open_tree(UNCONFIRMED_TREE)?,
            by_expiration: db.open_tree(EXPIRATION_TREE)?,
        })
    }

    /// A throwaway in-memory storage.
    #[cfg(test)]
    pub fn temporary() -> Self {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("creating a temporary database succeeds");
        Self::from_db(&db).expect("opening trees on a fresh database succeeds")
    }

    /// Inserts (or replaces) an unconfirmed transaction.
    pub fn insert(&self, tx: &UnconfirmedTx) -> Result<(), StorageError> {
        let id_key = tx.id.0.to_be_bytes();
        let value = encode_entry(tx);
        let index_key = expiration_key(tx.expiration, tx.id);

        (&self.unconfirmed, &self.by_expiration)
            .transaction(|(unconfirmed, by_expiration)| {
                // upsert: an existing row leaves a stale index entry behind
                if let Some(old) = unconfirmed.insert(&id_key[..], value.as_slice())? {
                    if old.len() >= 4 {
                        let old_expiration =
                            u32::from_le_bytes(old[..4].try_into().expect("4 bytes"));
                        if old_expiration != tx.expiration {
                            by_expiration.remove(&expiration_key(old_expiration, tx.id)[..])?;
                        }
                    }
                }
                by_expiration.insert(&index_key[..], &[][..])?;
                Ok(())
            })
            .map_err(into_storage_error)
    }

    /// Removes an unconfirmed transaction, returning it if it was
    /// present.
    pub fn delete(&self, id: TransactionId) -> Result<Option<UnconfirmedTx>, StorageError> {
        let id_key = id.0.to_be_bytes();

        (&self.unconfirmed, &self.by_expiration)
            .transaction(|(unconfirmed, by_expiration)| {
                let Some(value) = unconfirmed.remove(&id_key[..])? else {
                    return Ok(None);
                };
                let entry =
                    decode_entry(id, &value).map_err(ConflictableTransactionError::Abort)?;
                by_expiration.remove(&expiration_key(entry.expiration, id)[..])?;
                Ok(Some(entry))
            })
            .map_err(into_storage_error)
    }

    /// Looks up an unconfirmed transaction by id.
    pub fn get(&self, id: TransactionId) -> Result<Option<UnconfirmedTx>, StorageError> {
        match self.unconfirmed.get(id.0.to_be_bytes())? {
            Some(value) => decode_entry(id, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Returns true if the pool contains `id`.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.unconfirmed
            .contains_key(id.0.to_be_bytes())
            .unwrap_or(false)
    }

    /// Iterates every unconfirmed transaction.
    ///
    /// The iterator is finite and not restartable; it holds sled
    /// resources, so keep its scope tight. Corrupt rows surface as
    /// errors.
    pub fn iter(&self) -> impl Iterator<Item = Result<UnconfirmedTx, StorageError>> {
        self.unconfirmed.iter().map(|item| {
            let (key, value) = item?;
            let id = parse_id_key(&key)?;
            decode_entry(id, &value)
        })
    }

    /// The number of unconfirmed transactions in the pool.
    pub fn len(&self) -> usize {
        self.unconfirmed.len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes every entry with `expiration < now`, returning the
    /// removed entries.
    ///
    /// Only ids are collected from the index scan, so memory stays
    /// proportional to the expired set; the deletes commit as one
    /// storage transaction.
    pub fn sweep_expired(&self, now: u32) -> Result<Vec<UnconfirmedTx>, StorageError> {
        let mut expired = Vec::new();
        for item in self.by_expiration.range(..expiration_key(now, TransactionId(0))) {
            let (key, _) = item?;
            expired.push(parse_expiration_key(&key)?);
        }
        if expired.is_empty() {
            return Ok(Vec::new());
        }

        (&self.unconfirmed, &self.by_expiration)
            .transaction(|(unconfirmed, by_expiration)| {
                let mut removed = Vec::with_capacity(expired.len());
                for &(expiration, id) in &expired {
                    by_expiration.remove(&expiration_key(expiration, id)[..])?;
                    if let Some(value) = unconfirmed.remove(&id.0.to_be_bytes()[..])? {
                        removed
                            .push(decode_entry(id, &value)
                                .map_err(ConflictableTransactionError::Abort)?);
                    }
                }
                Ok(removed)
            })
            .map_err(into_storage_error)
    }

    /// The mempool is not height-versioned; chain rollbacks do not touch
    /// it.
    pub fn rollback(&self, _height: Height) {}
}

/// The row format: expiration (u32 little-endian) followed by the
/// canonical transaction bytes.
fn encode_entry(tx: &UnconfirmedTx) -> Vec<u8> {
    let mut value = tx.expiration.to_le_bytes().to_vec();
    let bytes = tx
        .transaction
        .aureus_serialize_to_vec()
        .expect("serialization into a vec can't fail");
    value.extend_from_slice(&bytes);
    value
}

fn decode_entry(id: TransactionId, value: &[u8]) -> Result<UnconfirmedTx, StorageError> {
    let corrupt = |source| StorageError::Corrupt { id: id.0, source };
    if value.len() < 4 {
        return Err(corrupt(SerializationError::Parse(
            "row shorter than its expiration field",
        )));
    }
    let expiration = u32::from_le_bytes(value[..4].try_into().expect("4 bytes"));
    let transaction = Transaction::aureus_deserialize(&value[4..]).map_err(corrupt)?;
    Ok(UnconfirmedTx {
        id,
        expiration,
        transaction: Arc::new(transaction),
    })
}

/// An index key: expiration then id, both big-endian so the tree orders
/// by expiry.
fn expiration_key(expiration: u32, id: TransactionId) -> [u8; 12] {
    let mut key = [0; 12];
    key[..4].copy_from_slice(&expiration.to_be_bytes());
    key[4..].copy_from_slice(&id.0.to_be_bytes());
    key
}

fn parse_expiration_key(key: &[u8]) -> Result<(u32, TransactionId), StorageError> {
    if key.len() != 12 {
        return Err(StorageError::CorruptIndex);
    }
    let expiration = u32::from_be_bytes(key[..4].try_into().expect("4 bytes"));
    let id = u64::from_be_bytes(key[4..].try_into().expect("8 bytes"));
    Ok((expiration, TransactionId(id)))
}

fn parse_id_key(key: &[u8]) -> Result<TransactionId, StorageError> {
    if key.len() != 8 {
        return Err(StorageError::CorruptIndex);
    }
    Ok(TransactionId(u64::from_be_bytes(
        key.try_into().expect("8 bytes"),
    )))
}

fn into_storage_error(error: TransactionError<StorageError>) -> StorageError {
    match error {
        TransactionError::Abort(error) => error,
        TransactionError::Storage(error) => StorageError::Database(error),
    }
}
