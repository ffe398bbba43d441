//! Cryptographic primitives used by Aureus.

pub use ed25519_zebra as ed25519;
