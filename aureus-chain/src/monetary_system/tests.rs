//! Tests for the Monetary System capability and naming rules.

use super::*;
use crate::{
    account::AccountId,
    currency::CurrencyId,
    transaction::{
        attachment::{Attachment, CurrencyIssuance},
        EcAnchor,
    },
};

/// A height well past the Monetary System activation on Mainnet.
const HEIGHT: Height = Height(400_000);
const NETWORK: Network = Network::Mainnet;

#[derive(Default)]
struct TestRegistry {
    currencies: Vec<Currency>,
}

impl TestRegistry {
    fn with(currency: Currency) -> Self {
        TestRegistry {
            currencies: vec![currency],
        }
    }
}

impl CurrencyRegistry for TestRegistry {
    fn currency(&self, id: CurrencyId) -> Option<Currency> {
        self.currencies.iter().find(|c| c.id == id).cloned()
    }

    fn currency_by_name(&self, name: &str) -> Option<Currency> {
        self.currencies
            .iter()
            .find(|c| c.name.to_lowercase() == name)
            .cloned()
    }

    fn currency_by_code(&self, code: &str) -> Option<Currency> {
        self.currencies.iter().find(|c| c.code == code).cloned()
    }
}

fn currency_tx(attachment: Attachment) -> Transaction {
    Transaction {
        version: 1,
        timestamp: 0,
        deadline: 60,
        sender_public_key: [7; 32],
        recipient: None,
        amount: 0,
        fee: 100_000_000,
        ec_anchor: Some(EcAnchor {
            height: Height(399_990),
            block_id: 1,
        }),
        attachment,
        signature: [0; 64],
    }
}

fn issuance(flags: CurrencyFlags) -> CurrencyIssuance {
    CurrencyIssuance {
        name: "orichalcum".into(),
        code: "ORC".into(),
        description: String::new(),
        flags,
        initial_supply: 0,
        max_supply: 1_000_000,
        issuance_height: Height(0),
        algorithm: 0,
        min_difficulty: 0,
        max_difficulty: 0,
        decimals: 4,
    }
}

fn test_currency(flags: CurrencyFlags) -> Currency {
    Currency {
        id: CurrencyId(1),
        account_id: AccountId(42),
        name: "orichalcum".into(),
        code: "ORC".into(),
        description: String::new(),
        flags,
        current_supply: 1000,
        issuance_height: Height(0),
    }
}

fn not_valid_containing(result: Result<(), ValidationError>, message: &str) {
    match result {
        Err(ValidationError::NotValid(inner)) => {
            assert!(inner.contains(message), "unexpected message: {inner}")
        }
        other => panic!("expected NotValid({message:?}), got {other:?}"),
    }
}

#[test]
fn exchangeable_cannot_be_claimed() {
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Claimable;
    let tx = currency_tx(Attachment::CurrencyIssuance(issuance(flags)));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "cannot be claimed",
    );
}

#[test]
fn reservable_activation_height_must_be_in_the_future() {
    let flags = CurrencyFlag::Reservable | CurrencyFlag::Exchangeable;

    let mut pending = issuance(flags);
    pending.issuance_height = HEIGHT;
    let tx = currency_tx(Attachment::CurrencyIssuance(pending));
    assert!(matches!(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        Err(ValidationError::NotCurrentlyValid(_))
    ));

    let mut future = issuance(flags);
    future.issuance_height = Height(HEIGHT.0 + 1);
    let tx = currency_tx(Attachment::CurrencyIssuance(future));
    validate(flags, None, &tx, HEIGHT, NETWORK).expect("future activation height is valid");
}

#[test]
fn claimable_must_be_reservable() {
    let flags = CurrencyFlags::from(CurrencyFlag::Claimable);
    let mut claim_only = issuance(flags);
    claim_only.issuance_height = Height(HEIGHT.0 + 1);
    let tx = currency_tx(Attachment::CurrencyIssuance(claim_only));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "must be reservable",
    );

    let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
    let mut both = issuance(flags);
    both.issuance_height = Height(HEIGHT.0 + 1);
    let tx = currency_tx(Attachment::CurrencyIssuance(both));
    validate(flags, None, &tx, HEIGHT, NETWORK).expect("reservable and claimable is valid");
}

#[test]
fn claimable_initial_supply_must_be_zero() {
    let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
    let mut nonzero = issuance(flags);
    nonzero.issuance_height = Height(HEIGHT.0 + 1);
    nonzero.initial_supply = 5;
    let tx = currency_tx(Attachment::CurrencyIssuance(nonzero));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "initial supply 0",
    );
}

#[test]
fn mintable_difficulty_bounds() {
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Mintable;

    let mut bad = issuance(flags);
    bad.algorithm = MintingAlgorithm::Sha256.code();
    bad.min_difficulty = 0;
    bad.max_difficulty = 10;
    let tx = currency_tx(Attachment::CurrencyIssuance(bad));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "minting difficulties",
    );

    let mut good = issuance(flags);
    good.algorithm = MintingAlgorithm::Sha256.code();
    good.min_difficulty = 1;
    good.max_difficulty = 10;
    let tx = currency_tx(Attachment::CurrencyIssuance(good));
    validate(flags, None, &tx, HEIGHT, NETWORK).expect("valid difficulty bounds");
}

#[test]
fn mintable_requires_known_algorithm() {
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Mintable;
    let mut bad = issuance(flags);
    bad.algorithm = 4;
    bad.min_difficulty = 1;
    bad.max_difficulty = 10;
    let tx = currency_tx(Attachment::CurrencyIssuance(bad));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "algorithm",
    );
}

#[test]
fn non_mintable_must_not_specify_minting_fields() {
    let flags = CurrencyFlags::from(CurrencyFlag::Exchangeable);
    let mut bad = issuance(flags);
    bad.algorithm = MintingAlgorithm::Sha256.code();
    let tx = currency_tx(Attachment::CurrencyIssuance(bad));
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "algorithm or difficulty",
    );
}

#[test]
fn minting_requires_the_mintable_flag() {
    let currency = test_currency(CurrencyFlags::from(CurrencyFlag::Exchangeable));
    let tx = currency_tx(Attachment::CurrencyMinting {
        nonce: 1,
        currency_id: currency.id,
        units: 10,
        counter: 1,
    });
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "not mintable",
    );
}

#[test]
fn shuffleable_is_not_yet_enabled() {
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Shuffleable;
    let tx = currency_tx(Attachment::CurrencyIssuance(issuance(flags)));
    assert!(matches!(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        Err(ValidationError::NotYetEnabled(_))
    ));
}

#[test]
fn currency_transaction_amount_must_be_zero() {
    // the amount gate fires before any capability rule
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Claimable;
    let mut tx = currency_tx(Attachment::CurrencyIssuance(issuance(flags)));
    tx.amount = 1;
    not_valid_containing(
        validate(flags, None, &tx, HEIGHT, NETWORK),
        "amount must be 0",
    );
}

#[test]
fn currency_type_must_be_specified() {
    for bits in [0x00, 0x40] {
        let flags = CurrencyFlags::from_bits(bits);
        let tx = currency_tx(Attachment::CurrencyIssuance(issuance(flags)));
        not_valid_containing(
            validate(flags, None, &tx, HEIGHT, NETWORK),
            "type not specified",
        );
    }
}

#[test]
fn monetary_system_gated_by_activation_height() {
    let flags = CurrencyFlags::from(CurrencyFlag::Exchangeable);
    let tx = currency_tx(Attachment::CurrencyIssuance(issuance(flags)));
    let before = Height(NetworkUpgrade::MonetarySystem.activation_height(NETWORK).0 - 1);
    assert!(matches!(
        validate(flags, None, &tx, before, NETWORK),
        Err(ValidationError::NotYetEnabled(_))
    ));
}

#[test]
fn controllable_transfer_restricted_to_issuer() {
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Controllable;
    let currency = test_currency(flags);
    let transfer = Attachment::CurrencyTransfer {
        currency_id: currency.id,
        units: 5,
    };

    // neither sender nor recipient is the issuer
    let tx = currency_tx(transfer.clone());
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "issuer",
    );

    // the issuer is the recipient
    let mut tx = currency_tx(transfer.clone());
    tx.recipient = Some(currency.account_id);
    validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK)
        .expect("transfer to the issuer is valid");

    // the issuer is the sender
    let mut currency_from_sender = currency.clone();
    let tx = currency_tx(transfer);
    currency_from_sender.account_id = tx.sender_id();
    validate_for_currency(Some(&currency_from_sender), &tx, HEIGHT, NETWORK)
        .expect("transfer from the issuer is valid");
}

#[test]
fn controllable_offer_restricted_to_issuer() {
    use crate::transaction::attachment::PublishExchangeOffer;

    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Controllable;
    let currency = test_currency(flags);
    let offer = Attachment::PublishExchangeOffer(PublishExchangeOffer {
        currency_id: currency.id,
        buy_rate: 1,
        sell_rate: 2,
        total_buy_limit: 100,
        total_sell_limit: 100,
        initial_buy_supply: 0,
        initial_sell_supply: 0,
        expiration_height: Height(HEIGHT.0 + 100),
    });

    let tx = currency_tx(offer.clone());
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "issuer",
    );

    let mut currency_from_sender = currency;
    let tx = currency_tx(offer);
    currency_from_sender.account_id = tx.sender_id();
    validate_for_currency(Some(&currency_from_sender), &tx, HEIGHT, NETWORK)
        .expect("issuer can publish an offer");
}

#[test]
fn reserve_claim_needs_an_active_claimable_currency() {
    let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
    let mut currency = test_currency(flags);
    let claim = Attachment::ReserveClaim {
        currency_id: currency.id,
        units: 5,
    };

    currency.issuance_height = Height(HEIGHT.0 + 10);
    let tx = currency_tx(claim.clone());
    assert!(matches!(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        Err(ValidationError::NotCurrentlyValid(_))
    ));

    currency.issuance_height = HEIGHT;
    let tx = currency_tx(claim);
    validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK)
        .expect("claim against an active currency is valid");
}

#[test]
fn reserve_claim_requires_the_claimable_flag() {
    let currency = test_currency(CurrencyFlags::from(CurrencyFlag::Exchangeable));
    let tx = currency_tx(Attachment::ReserveClaim {
        currency_id: currency.id,
        units: 5,
    });
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "not claimable",
    );
}

#[test]
fn reserve_increase_rules() {
    // not reservable at all
    let currency = test_currency(CurrencyFlags::from(CurrencyFlag::Exchangeable));
    let tx = currency_tx(Attachment::ReserveIncrease {
        currency_id: currency.id,
        amount_per_unit: 10,
    });
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "not reservable",
    );

    // reservable but already active
    let flags = CurrencyFlag::Exchangeable | CurrencyFlag::Reservable;
    let mut currency = test_currency(flags);
    let tx = currency_tx(Attachment::ReserveIncrease {
        currency_id: currency.id,
        amount_per_unit: 10,
    });
    assert!(matches!(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        Err(ValidationError::NotCurrentlyValid(_))
    ));

    // reservable and still pending
    currency.issuance_height = Height(HEIGHT.0 + 10);
    let tx = currency_tx(Attachment::ReserveIncrease {
        currency_id: currency.id,
        amount_per_unit: 10,
    });
    validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK)
        .expect("reserving a pending currency is valid");
}

#[test]
fn exchange_requires_the_exchangeable_flag() {
    let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
    let currency = test_currency(flags);
    let tx = currency_tx(Attachment::ExchangeBuy {
        currency_id: currency.id,
        rate: 1,
        units: 10,
    });
    not_valid_containing(
        validate_for_currency(Some(&currency), &tx, HEIGHT, NETWORK),
        "not exchangeable",
    );
}

#[test]
fn unknown_currency_is_permanently_invalid() {
    let registry = TestRegistry::default();
    let tx = currency_tx(Attachment::CurrencyTransfer {
        currency_id: CurrencyId(99),
        units: 5,
    });
    not_valid_containing(
        validate_transaction(&tx, &registry, HEIGHT, NETWORK),
        "unknown currency",
    );
}

#[test]
fn naming_accepts_a_well_formed_issuance() {
    let registry = TestRegistry::default();
    validate_naming("orichalcum", "ORC", "a test currency", &registry)
        .expect("well-formed naming is valid");
}

#[test]
fn naming_shape_rules() {
    let registry = TestRegistry::default();

    // too short, too long, wrong code length, oversized description
    assert!(validate_naming("ab", "ORC", "", &registry).is_err());
    assert!(validate_naming("averylongcurrency", "ORC", "", &registry).is_err());
    assert!(validate_naming("orichalcum", "ORCA", "", &registry).is_err());
    let description = "x".repeat(MAX_CURRENCY_DESCRIPTION_LENGTH + 1);
    assert!(validate_naming("orichalcum", "ORC", &description, &registry).is_err());

    // name outside the alphabet, code not upper case
    not_valid_containing(
        validate_naming("orichal-um", "ORC", "", &registry),
        "invalid currency name",
    );
    not_valid_containing(
        validate_naming("orichalcum", "orc", "", &registry),
        "upper case",
    );
}

#[test]
fn naming_reserves_the_base_coin() {
    let registry = TestRegistry::default();
    not_valid_containing(
        validate_naming("orichalcum", BASE_COIN_CODE, "", &registry),
        "already used",
    );
    not_valid_containing(
        validate_naming("Aureus", "ORC", "", &registry),
        "already used",
    );
}

#[test]
fn naming_collisions_are_transient() {
    let registry = TestRegistry::with(test_currency(CurrencyFlags::from(
        CurrencyFlag::Exchangeable,
    )));

    // duplicate name, any case
    assert!(matches!(
        validate_naming("Orichalcum", "XYZ", "", &registry),
        Err(ValidationError::NotCurrentlyValid(_))
    ));
    // duplicate code
    assert!(matches!(
        validate_naming("novacoin", "ORC", "", &registry),
        Err(ValidationError::NotCurrentlyValid(_))
    ));
    // a name that collides with an existing code
    assert!(matches!(
        validate_naming("orc", "XYZ", "", &registry),
        Err(ValidationError::NotCurrentlyValid(_))
    ));
}

#[test]
fn validation_is_a_pure_function_of_its_inputs() {
    let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
    let mut pending = issuance(flags);
    pending.issuance_height = Height(HEIGHT.0 + 1);
    let tx = currency_tx(Attachment::CurrencyIssuance(pending));

    let first = validate(flags, None, &tx, HEIGHT, NETWORK);
    for _ in 0..5 {
        assert_eq!(first, validate(flags, None, &tx, HEIGHT, NETWORK));
    }
}
