//! Typed transaction payloads.
//!
//! The attachment fixes a transaction's wire type and subtype, and
//! carries the fields specific to it. Base-coin payments are type 0;
//! every Monetary System operation is a subtype of type 5.

use crate::{
    block::Height,
    currency::{CurrencyFlags, CurrencyId},
};

/// The wire type code for base-coin payments.
pub const TYPE_PAYMENT: u8 = 0;

/// The wire type code for Monetary System transactions.
pub const TYPE_MONETARY_SYSTEM: u8 = 5;

/// A transaction payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Attachment {
    /// A plain transfer of the base coin.
    OrdinaryPayment,
    /// Issue a new currency.
    CurrencyIssuance(CurrencyIssuance),
    /// Contribute base-coin reserve to a pending reservable currency.
    ReserveIncrease {
        /// The currency reserved for.
        currency_id: CurrencyId,
        /// The contribution, in base-coin quanta per currency unit.
        amount_per_unit: u64,
    },
    /// Redeem currency units against the reserve of a claimable currency.
    ReserveClaim {
        /// The currency claimed against.
        currency_id: CurrencyId,
        /// The number of units redeemed.
        units: u64,
    },
    /// Move currency units between accounts.
    CurrencyTransfer {
        /// The currency transferred.
        currency_id: CurrencyId,
        /// The number of units transferred.
        units: u64,
    },
    /// Publish a standing buy/sell exchange offer.
    PublishExchangeOffer(PublishExchangeOffer),
    /// Buy currency units against published offers.
    ExchangeBuy {
        /// The currency bought.
        currency_id: CurrencyId,
        /// The price, in base-coin quanta per unit.
        rate: u64,
        /// The number of units bought.
        units: u64,
    },
    /// Sell currency units against published offers.
    ExchangeSell {
        /// The currency sold.
        currency_id: CurrencyId,
        /// The price, in base-coin quanta per unit.
        rate: u64,
        /// The number of units sold.
        units: u64,
    },
    /// Grow the supply of a mintable currency with a proof-of-work nonce.
    CurrencyMinting {
        /// The proof-of-work nonce.
        nonce: u64,
        /// The currency minted.
        currency_id: CurrencyId,
        /// The number of units minted.
        units: u64,
        /// The per-account minting counter, preventing replay.
        counter: u64,
    },
}

/// The fields of a currency issuance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyIssuance {
    /// The display name.
    pub name: String,
    /// The short code.
    pub code: String,
    /// A free-form description.
    pub description: String,
    /// The capability mask the currency is issued with.
    pub flags: CurrencyFlags,
    /// The supply at issuance; claimable currencies must start at zero.
    pub initial_supply: u64,
    /// The hard cap on supply.
    pub max_supply: u64,
    /// The activation height for reservable currencies; zero otherwise.
    pub issuance_height: Height,
    /// The minting algorithm code; zero for non-mintable currencies.
    pub algorithm: u8,
    /// The minimum minting difficulty.
    pub min_difficulty: u8,
    /// The maximum minting difficulty.
    pub max_difficulty: u8,
    /// The number of decimal places of a unit.
    pub decimals: u8,
}

/// The fields of an exchange offer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishExchangeOffer {
    /// The currency offered.
    pub currency_id: CurrencyId,
    /// The buy price, in base-coin quanta per unit.
    pub buy_rate: u64,
    /// The sell price, in base-coin quanta per unit.
    pub sell_rate: u64,
    /// The total number of units the offer will buy.
    pub total_buy_limit: u64,
    /// The total number of units the offer will sell.
    pub total_sell_limit: u64,
    /// The units initially available to buy.
    pub initial_buy_supply: u64,
    /// The units initially available to sell.
    pub initial_sell_supply: u64,
    /// The height the offer expires at.
    pub expiration_height: Height,
}

impl Attachment {
    /// The wire type code.
    pub fn type_code(&self) -> u8 {
        match self {
            Attachment::OrdinaryPayment => TYPE_PAYMENT,
            _ => TYPE_MONETARY_SYSTEM,
        }
    }

    /// The wire subtype code within the type.
    pub fn subtype_code(&self) -> u8 {
        match self {
            Attachment::OrdinaryPayment => 0,
            Attachment::CurrencyIssuance(_) => 0,
            Attachment::ReserveIncrease { .. } => 1,
            Attachment::ReserveClaim { .. } => 2,
            Attachment::CurrencyTransfer { .. } => 3,
            Attachment::PublishExchangeOffer(_) => 4,
            Attachment::ExchangeBuy { .. } => 5,
            Attachment::ExchangeSell { .. } => 6,
            Attachment::CurrencyMinting { .. } => 7,
        }
    }

    /// The currency this payload touches, if any.
    pub fn currency_id(&self) -> Option<CurrencyId> {
        match self {
            Attachment::OrdinaryPayment | Attachment::CurrencyIssuance(_) => None,
            Attachment::ReserveIncrease { currency_id, .. }
            | Attachment::ReserveClaim { currency_id, .. }
            | Attachment::CurrencyTransfer { currency_id, .. }
            | Attachment::ExchangeBuy { currency_id, .. }
            | Attachment::ExchangeSell { currency_id, .. }
            | Attachment::CurrencyMinting { currency_id, .. } => Some(*currency_id),
            Attachment::PublishExchangeOffer(offer) => Some(offer.currency_id),
        }
    }

    /// Returns true for Monetary System payloads.
    pub fn is_monetary_system(&self) -> bool {
        self.type_code() == TYPE_MONETARY_SYSTEM
    }
}
