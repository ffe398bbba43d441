//! User-configurable mempool parameters.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Mempool configuration section.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The directory holding the persistent unconfirmed-transaction
    /// database.
    pub cache_dir: PathBuf,

    /// How often expired entries are swept out of the mempool.
    pub sweep_interval: Duration,

    /// How often locally originated transactions are re-announced to
    /// peers.
    pub rebroadcast_interval: Duration,

    /// How often a random peer is polled for its unconfirmed
    /// transactions.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data"),
            sweep_interval: Duration::from_secs(1),
            rebroadcast_interval: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
        }
    }
}
