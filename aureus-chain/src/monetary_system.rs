//! The Monetary System: capability validation for user-issued currencies.
//!
//! A currency's type mask fixes a set of capabilities at issuance time.
//! Every Monetary System transaction is checked against the full closed
//! set of capabilities: each capability contributes one rule when it is
//! present in the mask and one when it is missing, so the whole rule
//! matrix lives in [`RULES`] and is auditable in one place. Rules are
//! evaluated in a fixed order and the first failure wins.

use crate::{
    block::Height,
    currency::{Currency, CurrencyFlag, CurrencyFlags, CurrencyRegistry},
    error::ValidationError,
    parameters::{
        Network, NetworkUpgrade, BASE_COIN_CODE, BASE_COIN_NAME, CURRENCY_CODE_ALPHABET,
        CURRENCY_CODE_LENGTH, CURRENCY_NAME_ALPHABET, MAX_CURRENCY_DESCRIPTION_LENGTH,
        MAX_CURRENCY_NAME_LENGTH, MIN_CURRENCY_NAME_LENGTH,
    },
    transaction::{attachment::Attachment, Transaction},
};

#[cfg(test)]
mod tests;

/// A proof-of-work hash algorithm a mintable currency can commit to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MintingAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA3-256.
    Sha3_256,
    /// Scrypt.
    Scrypt,
    /// 25 rounds of Keccak.
    Keccak25,
}

impl MintingAlgorithm {
    /// Resolves a wire algorithm code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(MintingAlgorithm::Sha256),
            3 => Some(MintingAlgorithm::Sha3_256),
            5 => Some(MintingAlgorithm::Scrypt),
            25 => Some(MintingAlgorithm::Keccak25),
            _ => None,
        }
    }

    /// The wire algorithm code.
    pub fn code(&self) -> u8 {
        match self {
            MintingAlgorithm::Sha256 => 2,
            MintingAlgorithm::Sha3_256 => 3,
            MintingAlgorithm::Scrypt => 5,
            MintingAlgorithm::Keccak25 => 25,
        }
    }
}

/// Everything a capability rule can look at.
struct RuleContext<'a> {
    /// The currency snapshot, when the transaction references an issued
    /// currency. Issuances validate before their currency exists.
    currency: Option<&'a Currency>,
    /// The transaction under validation.
    transaction: &'a Transaction,
    /// The capabilities present in the type mask, computed once before
    /// dispatch so every rule sees a consistent view.
    present: CurrencyFlags,
    /// The current chain height.
    height: Height,
}

type Rule = fn(&RuleContext<'_>) -> Result<(), ValidationError>;

/// The capability rule matrix, in evaluation order.
///
/// One row per capability: the rule applied when the capability is
/// present in the type mask, and the rule applied when it is missing.
const RULES: [(CurrencyFlag, Rule, Rule); 6] = [
    (CurrencyFlag::Exchangeable, exchangeable_present, exchangeable_missing),
    (CurrencyFlag::Controllable, controllable_present, no_rule),
    (CurrencyFlag::Reservable, reservable_present, reservable_missing),
    (CurrencyFlag::Claimable, claimable_present, claimable_missing),
    (CurrencyFlag::Mintable, mintable_present, mintable_missing),
    (CurrencyFlag::Shuffleable, shuffleable_present, no_rule),
];

/// Validates the Monetary System rules for `transaction`'s attachment.
///
/// Non-currency attachments pass through untouched. Issuances are checked
/// against their attachment's flag bits and naming rules; every other
/// currency transaction is checked against the registry snapshot of the
/// currency it references.
pub fn validate_transaction<R: CurrencyRegistry>(
    transaction: &Transaction,
    registry: &R,
    height: Height,
    network: Network,
) -> Result<(), ValidationError> {
    match &transaction.attachment {
        Attachment::OrdinaryPayment => {
            if transaction.amount == 0 {
                return Err(ValidationError::NotValid("payment amount must be positive".into()));
            }
            if transaction.recipient.is_none() {
                return Err(ValidationError::NotValid("payment must have a recipient".into()));
            }
            Ok(())
        }
        Attachment::CurrencyIssuance(issuance) => {
            validate_naming(&issuance.name, &issuance.code, &issuance.description, registry)?;
            validate(issuance.flags, None, transaction, height, network)
        }
        other => {
            let currency_id = other
                .currency_id()
                .expect("every non-issuance currency attachment references a currency");
            let currency = registry.currency(currency_id);
            validate_for_currency(currency.as_ref(), transaction, height, network)
        }
    }
}

/// Validates a Monetary System transaction against a known currency.
///
/// An unknown currency is a permanent failure: the transaction references
/// an id that was never issued.
pub fn validate_for_currency(
    currency: Option<&Currency>,
    transaction: &Transaction,
    height: Height,
    network: Network,
) -> Result<(), ValidationError> {
    let currency = currency.ok_or_else(|| {
        ValidationError::NotValid("unknown currency".into())
    })?;
    validate(currency.flags, Some(currency), transaction, height, network)
}

/// Validates a Monetary System transaction against a capability mask.
pub fn validate(
    flags: CurrencyFlags,
    currency: Option<&Currency>,
    transaction: &Transaction,
    height: Height,
    network: Network,
) -> Result<(), ValidationError> {
    if !NetworkUpgrade::MonetarySystem.is_active_at(network, height) {
        return Err(ValidationError::NotYetEnabled(format!(
            "Monetary System is not enabled at height {height}"
        )));
    }
    if transaction.amount != 0 {
        return Err(ValidationError::NotValid(
            "currency transaction amount must be 0".into(),
        ));
    }
    if flags.is_empty() {
        return Err(ValidationError::NotValid("currency type not specified".into()));
    }

    let ctx = RuleContext {
        currency,
        transaction,
        present: flags,
        height,
    };
    for (flag, on_present, on_missing) in RULES {
        if ctx.present.contains(flag) {
            on_present(&ctx)?;
        } else {
            on_missing(&ctx)?;
        }
    }
    Ok(())
}

fn no_rule(_ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    Ok(())
}

fn exchangeable_present(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    if let Attachment::CurrencyIssuance(_) = ctx.transaction.attachment {
        if ctx.present.contains(CurrencyFlag::Claimable) {
            return Err(ValidationError::NotValid(
                "exchangeable currency cannot be claimed".into(),
            ));
        }
    }
    Ok(())
}

fn exchangeable_missing(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match ctx.transaction.attachment {
        Attachment::CurrencyIssuance(_) => {
            if !ctx.present.contains(CurrencyFlag::Claimable) {
                return Err(ValidationError::NotValid(
                    "currency is not exchangeable and not claimable".into(),
                ));
            }
        }
        Attachment::PublishExchangeOffer(_)
        | Attachment::ExchangeBuy { .. }
        | Attachment::ExchangeSell { .. } => {
            return Err(ValidationError::NotValid("currency is not exchangeable".into()));
        }
        _ => {}
    }
    Ok(())
}

fn controllable_present(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match ctx.transaction.attachment {
        Attachment::CurrencyTransfer { .. } => {
            let issuer_involved = ctx.currency.is_some_and(|currency| {
                currency.account_id == ctx.transaction.sender_id()
                    || Some(currency.account_id) == ctx.transaction.recipient
            });
            if !issuer_involved {
                return Err(ValidationError::NotValid(
                    "controllable currency can only be transferred to or from the issuer".into(),
                ));
            }
        }
        Attachment::PublishExchangeOffer(_) => {
            let issuer_is_sender = ctx
                .currency
                .is_some_and(|currency| currency.account_id == ctx.transaction.sender_id());
            if !issuer_is_sender {
                return Err(ValidationError::NotValid(
                    "only the issuer can publish an exchange offer for a controllable currency"
                        .into(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

fn reservable_present(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match &ctx.transaction.attachment {
        Attachment::CurrencyIssuance(issuance) => {
            if issuance.issuance_height <= ctx.height {
                return Err(ValidationError::NotCurrentlyValid(format!(
                    "reservable currency activation height {} not above current height {}",
                    issuance.issuance_height, ctx.height
                )));
            }
        }
        Attachment::ReserveIncrease { .. } => {
            if let Some(currency) = ctx.currency {
                if currency.is_active(ctx.height) {
                    return Err(ValidationError::NotCurrentlyValid(
                        "cannot increase reserve for an active currency".into(),
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn reservable_missing(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match &ctx.transaction.attachment {
        Attachment::ReserveIncrease { .. } => Err(ValidationError::NotValid(
            "cannot increase reserve: currency is not reservable".into(),
        )),
        Attachment::CurrencyIssuance(issuance) if issuance.issuance_height != Height(0) => {
            Err(ValidationError::NotValid(
                "issuance height for a non-reservable currency must be 0".into(),
            ))
        }
        _ => Ok(()),
    }
}

fn claimable_present(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match &ctx.transaction.attachment {
        Attachment::CurrencyIssuance(issuance) => {
            if !ctx.present.contains(CurrencyFlag::Reservable) {
                return Err(ValidationError::NotValid(
                    "claimable currency must be reservable".into(),
                ));
            }
            if issuance.initial_supply != 0 {
                return Err(ValidationError::NotValid(
                    "claimable currency must have initial supply 0".into(),
                ));
            }
        }
        Attachment::ReserveClaim { .. } => {
            let active = ctx
                .currency
                .is_some_and(|currency| currency.is_active(ctx.height));
            if !active {
                return Err(ValidationError::NotCurrentlyValid(
                    "cannot claim reserve before the currency is active".into(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

fn claimable_missing(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match ctx.transaction.attachment {
        Attachment::ReserveClaim { .. } => Err(ValidationError::NotValid(
            "cannot claim reserve: currency is not claimable".into(),
        )),
        _ => Ok(()),
    }
}

fn mintable_present(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    if let Attachment::CurrencyIssuance(issuance) = &ctx.transaction.attachment {
        if MintingAlgorithm::from_code(issuance.algorithm).is_none() {
            return Err(ValidationError::NotValid(format!(
                "unknown minting algorithm code {}",
                issuance.algorithm
            )));
        }
        if issuance.min_difficulty == 0 || issuance.max_difficulty < issuance.min_difficulty {
            return Err(ValidationError::NotValid(format!(
                "invalid minting difficulties min {} max {}",
                issuance.min_difficulty, issuance.max_difficulty
            )));
        }
    }
    Ok(())
}

fn mintable_missing(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    match &ctx.transaction.attachment {
        Attachment::CurrencyIssuance(issuance)
            if issuance.min_difficulty != 0
                || issuance.max_difficulty != 0
                || issuance.algorithm != 0 =>
        {
            Err(ValidationError::NotValid(
                "non-mintable currency must not specify an algorithm or difficulty".into(),
            ))
        }
        Attachment::CurrencyMinting { .. } => {
            Err(ValidationError::NotValid("currency is not mintable".into()))
        }
        _ => Ok(()),
    }
}

fn shuffleable_present(_ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    Err(ValidationError::NotYetEnabled("shuffling".into()))
}

/// Validates a currency's name, code, and description: shape, alphabet,
/// reserved names, and uniqueness against the active registry.
///
/// Shape and alphabet failures are permanent; uniqueness collisions are
/// transient, since the colliding currency may expire or be rolled back.
pub fn validate_naming<R: CurrencyRegistry>(
    name: &str,
    code: &str,
    description: &str,
    registry: &R,
) -> Result<(), ValidationError> {
    if name.len() < MIN_CURRENCY_NAME_LENGTH
        || name.len() > MAX_CURRENCY_NAME_LENGTH
        || code.len() != CURRENCY_CODE_LENGTH
        || description.len() > MAX_CURRENCY_DESCRIPTION_LENGTH
    {
        return Err(ValidationError::NotValid(format!(
            "invalid currency name {name:?}, code {code:?}, or description length"
        )));
    }

    let normalized_name = name.to_lowercase();
    for c in normalized_name.chars() {
        if !CURRENCY_NAME_ALPHABET.contains(c) {
            return Err(ValidationError::NotValid(format!(
                "invalid currency name: {normalized_name}"
            )));
        }
    }
    for c in code.chars() {
        if !CURRENCY_CODE_ALPHABET.contains(c) {
            return Err(ValidationError::NotValid(format!(
                "invalid currency code: {code}, code must be all upper case"
            )));
        }
    }

    if code == BASE_COIN_CODE || normalized_name == BASE_COIN_NAME {
        return Err(ValidationError::NotValid("currency name already used".into()));
    }

    if registry.currency_by_name(&normalized_name).is_some()
        || registry.currency_by_code(&name.to_uppercase()).is_some()
    {
        return Err(ValidationError::NotCurrentlyValid(format!(
            "currency name already used: {normalized_name}"
        )));
    }
    if registry.currency_by_code(code).is_some()
        || registry.currency_by_name(&code.to_lowercase()).is_some()
    {
        return Err(ValidationError::NotCurrentlyValid(format!(
            "currency code already used: {code}"
        )));
    }

    Ok(())
}
