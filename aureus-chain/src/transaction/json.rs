//! The JSON wire form of transactions.
//!
//! Peers exchange transactions as JSON objects. 64-bit identifiers are
//! rendered as unsigned decimal strings, since JSON numbers lose
//! precision past 2^53; keys and signatures are lowercase hex.
//!
//! A message that does not parse is a permanent validation failure: the
//! peer supplied malformed data.

use serde_json::Value;

use crate::{
    account::AccountId,
    block::Height,
    currency::{CurrencyFlags, CurrencyId},
    error::ValidationError,
};

use super::{
    attachment::{
        Attachment, CurrencyIssuance, PublishExchangeOffer, TYPE_MONETARY_SYSTEM, TYPE_PAYMENT,
    },
    EcAnchor, Transaction,
};

/// The serde mirror of a transaction's JSON form.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxJson {
    #[serde(rename = "type")]
    type_code: u8,
    subtype: u8,
    version: u8,
    timestamp: u32,
    deadline: u16,
    sender_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,
    amount: u64,
    fee: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ec_block_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ec_block_id: Option<String>,
    signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attachment: Option<AttachmentJson>,
}

/// The serde mirror of an attachment object: the union of every
/// subtype's fields, resolved against the declared type and subtype.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    currency_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_supply: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_supply: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuance_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount_per_unit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buy_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sell_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_buy_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_sell_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_buy_supply: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_sell_supply: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    counter: Option<u64>,
}

impl Transaction {
    /// Parses a transaction from its JSON wire form.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let json: TxJson = serde_json::from_value(value.clone())
            .map_err(|error| not_valid(format!("malformed transaction JSON: {error}")))?;

        if json.version > 1 {
            return Err(not_valid(format!(
                "unsupported transaction version {}",
                json.version
            )));
        }

        let sender_public_key = decode_hex::<32>(&json.sender_public_key, "senderPublicKey")?;
        let signature = decode_hex::<64>(&json.signature, "signature")?;
        let recipient = json
            .recipient
            .as_deref()
            .map(|id| decode_id(id, "recipient").map(AccountId))
            .transpose()?;

        let ec_anchor = if json.version >= 1 {
            let height = json
                .ec_block_height
                .ok_or_else(|| not_valid("missing ecBlockHeight".into()))?;
            let block_id = json
                .ec_block_id
                .as_deref()
                .ok_or_else(|| not_valid("missing ecBlockId".into()))?;
            Some(EcAnchor {
                height: Height(height),
                block_id: decode_id(block_id, "ecBlockId")?,
            })
        } else {
            None
        };

        let attachment =
            Attachment::from_json_parts(json.type_code, json.subtype, json.attachment.as_ref())?;

        Ok(Transaction {
            version: json.version,
            timestamp: json.timestamp,
            deadline: json.deadline,
            sender_public_key,
            recipient,
            amount: json.amount,
            fee: json.fee,
            ec_anchor,
            attachment,
            signature,
        })
    }

    /// Renders the JSON wire form.
    pub fn to_json(&self) -> Value {
        let json = TxJson {
            type_code: self.attachment.type_code(),
            subtype: self.attachment.subtype_code(),
            version: self.version,
            timestamp: self.timestamp,
            deadline: self.deadline,
            sender_public_key: hex::encode(self.sender_public_key),
            recipient: self.recipient.map(|id| id.0.to_string()),
            amount: self.amount,
            fee: self.fee,
            ec_block_height: self.ec_anchor.map(|anchor| anchor.height.0),
            ec_block_id: self.ec_anchor.map(|anchor| anchor.block_id.to_string()),
            signature: hex::encode(self.signature),
            attachment: self.attachment.to_json_parts(),
        };
        serde_json::to_value(json).expect("serializing a transaction to JSON can't fail")
    }
}

impl Attachment {
    /// Builds an attachment from the declared type, subtype, and
    /// attachment object.
    fn from_json_parts(
        type_code: u8,
        subtype_code: u8,
        json: Option<&AttachmentJson>,
    ) -> Result<Self, ValidationError> {
        if type_code == TYPE_PAYMENT && subtype_code == 0 {
            return Ok(Attachment::OrdinaryPayment);
        }
        if type_code != TYPE_MONETARY_SYSTEM {
            return Err(not_valid(format!("unknown transaction type {type_code}")));
        }
        let json =
            json.ok_or_else(|| not_valid("missing attachment object".into()))?;

        let currency = || -> Result<CurrencyId, ValidationError> {
            let id = json
                .currency
                .as_deref()
                .ok_or_else(|| not_valid("missing attachment currency".into()))?;
            decode_id(id, "currency").map(CurrencyId)
        };

        match subtype_code {
            0 => Ok(Attachment::CurrencyIssuance(CurrencyIssuance {
                name: require(json.name.clone(), "name")?,
                code: require(json.code.clone(), "code")?,
                description: json.description.clone().unwrap_or_default(),
                flags: CurrencyFlags::from_bits(require(json.currency_type, "type")?),
                initial_supply: require(json.initial_supply, "initialSupply")?,
                max_supply: require(json.max_supply, "maxSupply")?,
                issuance_height: Height(json.issuance_height.unwrap_or(0)),
                algorithm: json.algorithm.unwrap_or(0),
                min_difficulty: json.min_difficulty.unwrap_or(0),
                max_difficulty: json.max_difficulty.unwrap_or(0),
                decimals: json.decimals.unwrap_or(0),
            })),
            1 => Ok(Attachment::ReserveIncrease {
                currency_id: currency()?,
                amount_per_unit: require(json.amount_per_unit, "amountPerUnit")?,
            }),
            2 => Ok(Attachment::ReserveClaim {
                currency_id: currency()?,
                units: require(json.units, "units")?,
            }),
            3 => Ok(Attachment::CurrencyTransfer {
                currency_id: currency()?,
                units: require(json.units, "units")?,
            }),
            4 => Ok(Attachment::PublishExchangeOffer(PublishExchangeOffer {
                currency_id: currency()?,
                buy_rate: require(json.buy_rate, "buyRate")?,
                sell_rate: require(json.sell_rate, "sellRate")?,
                total_buy_limit: require(json.total_buy_limit, "totalBuyLimit")?,
                total_sell_limit: require(json.total_sell_limit, "totalSellLimit")?,
                initial_buy_supply: require(json.initial_buy_supply, "initialBuySupply")?,
                initial_sell_supply: require(json.initial_sell_supply, "initialSellSupply")?,
                expiration_height: Height(require(json.expiration_height, "expirationHeight")?),
            })),
            5 => Ok(Attachment::ExchangeBuy {
                currency_id: currency()?,
                rate: require(json.rate, "rate")?,
                units: require(json.units, "units")?,
            }),
            6 => Ok(Attachment::ExchangeSell {
                currency_id: currency()?,
                rate: require(json.rate, "rate")?,
                units: require(json.units, "units")?,
            }),
            7 => Ok(Attachment::CurrencyMinting {
                nonce: require(json.nonce, "nonce")?,
                currency_id: currency()?,
                units: require(json.units, "units")?,
                counter: require(json.counter, "counter")?,
            }),
            _ => Err(not_valid(format!(
                "unknown transaction subtype {subtype_code}"
            ))),
        }
    }

    /// Renders the attachment object, if the subtype has one.
    fn to_json_parts(&self) -> Option<AttachmentJson> {
        match self {
            Attachment::OrdinaryPayment => None,
            Attachment::CurrencyIssuance(issuance) => Some(AttachmentJson {
                name: Some(issuance.name.clone()),
                code: Some(issuance.code.clone()),
                description: Some(issuance.description.clone()),
                currency_type: Some(issuance.flags.bits()),
                initial_supply: Some(issuance.initial_supply),
                max_supply: Some(issuance.max_supply),
                issuance_height: Some(issuance.issuance_height.0),
                algorithm: Some(issuance.algorithm),
                min_difficulty: Some(issuance.min_difficulty),
                max_difficulty: Some(issuance.max_difficulty),
                decimals: Some(issuance.decimals),
                ..Default::default()
            }),
            Attachment::ReserveIncrease {
                currency_id,
                amount_per_unit,
            } => Some(AttachmentJson {
                currency: Some(currency_id.to_string()),
                amount_per_unit: Some(*amount_per_unit),
                ..Default::default()
            }),
            Attachment::ReserveClaim { currency_id, units }
            | Attachment::CurrencyTransfer { currency_id, units } => Some(AttachmentJson {
                currency: Some(currency_id.to_string()),
                units: Some(*units),
                ..Default::default()
            }),
            Attachment::PublishExchangeOffer(offer) => Some(AttachmentJson {
                currency: Some(offer.currency_id.to_string()),
                buy_rate: Some(offer.buy_rate),
                sell_rate: Some(offer.sell_rate),
                total_buy_limit: Some(offer.total_buy_limit),
                total_sell_limit: Some(offer.total_sell_limit),
                initial_buy_supply: Some(offer.initial_buy_supply),
                initial_sell_supply: Some(offer.initial_sell_supply),
                expiration_height: Some(offer.expiration_height.0),
                ..Default::default()
            }),
            Attachment::ExchangeBuy {
                currency_id,
                rate,
                units,
            }
            | Attachment::ExchangeSell {
                currency_id,
                rate,
                units,
            } => Some(AttachmentJson {
                currency: Some(currency_id.to_string()),
                rate: Some(*rate),
                units: Some(*units),
                ..Default::default()
            }),
            Attachment::CurrencyMinting {
                nonce,
                currency_id,
                units,
                counter,
            } => Some(AttachmentJson {
                currency: Some(currency_id.to_string()),
                nonce: Some(*nonce),
                units: Some(*units),
                counter: Some(*counter),
                ..Default::default()
            }),
        }
    }
}

fn not_valid(message: String) -> ValidationError {
    ValidationError::NotValid(message)
}

fn require<T>(field: Option<T>, name: &str) -> Result<T, ValidationError> {
    field.ok_or_else(|| not_valid(format!("missing attachment field {name}")))
}

fn decode_id(id: &str, field: &str) -> Result<u64, ValidationError> {
    id.parse()
        .map_err(|_| not_valid(format!("malformed {field}: {id:?}")))
}

fn decode_hex<const N: usize>(data: &str, field: &str) -> Result<[u8; N], ValidationError> {
    let bytes = hex::decode(data).map_err(|_| not_valid(format!("malformed {field}")))?;
    bytes
        .try_into()
        .map_err(|_| not_valid(format!("wrong {field} length")))
}
