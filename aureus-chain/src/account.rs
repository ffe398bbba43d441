//! Account identifiers.

use std::fmt;

use sha2::{Digest, Sha256};

/// A numeric account identifier.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    /// Derives the account id for an ed25519 verification key.
    ///
    /// The id is the first 8 bytes of the SHA-256 digest of the key, in
    /// little-endian order.
    pub fn from_public_key(key: &[u8; 32]) -> Self {
        let digest = Sha256::digest(key);
        let bytes: [u8; 8] = digest[..8].try_into().expect("digest is at least 8 bytes");
        AccountId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
