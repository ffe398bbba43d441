//! Consensus parameters for the Aureus network.

use NetworkUpgrade::*;

use crate::block::Height;

/// An Aureus network.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// The production network.
    #[default]
    Mainnet,
    /// The testing network.
    Testnet,
}

/// An Aureus network upgrade.
///
/// Network upgrades change the Aureus protocol or consensus rules in
/// incompatible ways, and activate at a fixed per-network block height.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NetworkUpgrade {
    /// The launch protocol.
    Genesis,
    /// Version 1 transactions, carrying an economic-clustering anchor.
    V1Transactions,
    /// The Monetary System: user-issued currencies on top of the base
    /// ledger.
    MonetarySystem,
}

/// Mainnet network upgrade activation heights.
pub(crate) const MAINNET_ACTIVATION_HEIGHTS: &[(Height, NetworkUpgrade)] = &[
    (Height(0), Genesis),
    (Height(213_000), V1Transactions),
    (Height(330_000), MonetarySystem),
];

/// Testnet network upgrade activation heights.
pub(crate) const TESTNET_ACTIVATION_HEIGHTS: &[(Height, NetworkUpgrade)] = &[
    (Height(0), Genesis),
    (Height(9_000), V1Transactions),
    (Height(75_000), MonetarySystem),
];

impl NetworkUpgrade {
    /// Returns the activation height of this network upgrade on `network`.
    pub fn activation_height(&self, network: Network) -> Height {
        let heights = match network {
            Network::Mainnet => MAINNET_ACTIVATION_HEIGHTS,
            Network::Testnet => TESTNET_ACTIVATION_HEIGHTS,
        };

        heights
            .iter()
            .find(|(_, upgrade)| upgrade == self)
            .map(|(height, _)| *height)
            .expect("every upgrade has an activation height on every network")
    }

    /// Returns true if this network upgrade is active at `height` on
    /// `network`.
    pub fn is_active_at(&self, network: Network, height: Height) -> bool {
        height >= self.activation_height(network)
    }
}

/// The minimum length of a currency name.
pub const MIN_CURRENCY_NAME_LENGTH: usize = 3;

/// The maximum length of a currency name.
pub const MAX_CURRENCY_NAME_LENGTH: usize = 10;

/// The exact length of a currency code.
pub const CURRENCY_CODE_LENGTH: usize = 3;

/// The maximum length of a currency description.
pub const MAX_CURRENCY_DESCRIPTION_LENGTH: usize = 1000;

/// The characters permitted in a normalized (lowercased) currency name.
pub const CURRENCY_NAME_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// The characters permitted in a currency code.
pub const CURRENCY_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The reserved currency code of the base coin.
pub const BASE_COIN_CODE: &str = "AUR";

/// The reserved normalized currency name of the base coin.
pub const BASE_COIN_NAME: &str = "aureus";

/// The maximum transaction deadline, in minutes.
pub const MAX_TRANSACTION_DEADLINE: u16 = 1440;
