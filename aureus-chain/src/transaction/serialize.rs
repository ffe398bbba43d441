//! The canonical binary encoding of transactions.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! type u8 | subtype u8 | version u8 | timestamp u32 | deadline u16
//! | sender_public_key [u8; 32] | recipient u64 (0 = none)
//! | amount u64 | fee u64
//! | ec_block_height u32 | ec_block_id u64      (version >= 1 only)
//! | signature [u8; 64] | attachment body
//! ```
//!
//! The transaction id is the first 8 bytes of the SHA-256 digest of this
//! encoding, so it must be byte-for-byte stable.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    account::AccountId,
    block::Height,
    currency::{CurrencyFlags, CurrencyId},
    serialization::{
        AureusDeserialize, AureusSerialize, ReadAureusExt, SerializationError, WriteAureusExt,
    },
};

use super::{
    attachment::{
        Attachment, CurrencyIssuance, PublishExchangeOffer, TYPE_MONETARY_SYSTEM, TYPE_PAYMENT,
    },
    EcAnchor, Transaction,
};

impl AureusSerialize for Transaction {
    fn aureus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u8(self.attachment.type_code())?;
        writer.write_u8(self.attachment.subtype_code())?;
        writer.write_u8(self.version)?;
        writer.write_u32::<LittleEndian>(self.timestamp)?;
        writer.write_u16::<LittleEndian>(self.deadline)?;
        writer.write_all(&self.sender_public_key)?;
        writer.write_u64::<LittleEndian>(self.recipient.map_or(0, |id| id.0))?;
        writer.write_u64::<LittleEndian>(self.amount)?;
        writer.write_u64::<LittleEndian>(self.fee)?;
        if self.version >= 1 {
            let anchor = self.ec_anchor.as_ref().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "version 1 transactions must carry an economic-clustering anchor",
                )
            })?;
            writer.write_u32::<LittleEndian>(anchor.height.0)?;
            writer.write_u64::<LittleEndian>(anchor.block_id)?;
        }
        writer.write_all(&self.signature)?;
        self.attachment.serialize_body(&mut writer)
    }
}

impl AureusDeserialize for Transaction {
    fn aureus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let type_code = reader.read_u8()?;
        let subtype_code = reader.read_u8()?;
        let version = reader.read_u8()?;
        if version > 1 {
            return Err(SerializationError::Parse("unsupported transaction version"));
        }
        let timestamp = reader.read_u32::<LittleEndian>()?;
        let deadline = reader.read_u16::<LittleEndian>()?;
        let mut sender_public_key = [0; 32];
        reader.read_exact(&mut sender_public_key)?;
        let recipient = match reader.read_u64::<LittleEndian>()? {
            0 => None,
            id => Some(AccountId(id)),
        };
        let amount = reader.read_u64::<LittleEndian>()?;
        let fee = reader.read_u64::<LittleEndian>()?;
        let ec_anchor = if version >= 1 {
            let height = Height(reader.read_u32::<LittleEndian>()?);
            let block_id = reader.read_u64::<LittleEndian>()?;
            Some(EcAnchor { height, block_id })
        } else {
            None
        };
        let mut signature = [0; 64];
        reader.read_exact(&mut signature)?;
        let attachment = Attachment::deserialize_body(type_code, subtype_code, &mut reader)?;

        Ok(Transaction {
            version,
            timestamp,
            deadline,
            sender_public_key,
            recipient,
            amount,
            fee,
            ec_anchor,
            attachment,
            signature,
        })
    }
}

impl Attachment {
    /// Write the subtype-specific fields.
    fn serialize_body<W: io::Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        match self {
            Attachment::OrdinaryPayment => Ok(()),
            Attachment::CurrencyIssuance(issuance) => issuance.aureus_serialize(writer),
            Attachment::ReserveIncrease {
                currency_id,
                amount_per_unit,
            } => {
                writer.write_u64::<LittleEndian>(currency_id.0)?;
                writer.write_u64::<LittleEndian>(*amount_per_unit)
            }
            Attachment::ReserveClaim { currency_id, units }
            | Attachment::CurrencyTransfer { currency_id, units } => {
                writer.write_u64::<LittleEndian>(currency_id.0)?;
                writer.write_u64::<LittleEndian>(*units)
            }
            Attachment::PublishExchangeOffer(offer) => offer.aureus_serialize(writer),
            Attachment::ExchangeBuy {
                currency_id,
                rate,
                units,
            }
            | Attachment::ExchangeSell {
                currency_id,
                rate,
                units,
            } => {
                writer.write_u64::<LittleEndian>(currency_id.0)?;
                writer.write_u64::<LittleEndian>(*rate)?;
                writer.write_u64::<LittleEndian>(*units)
            }
            Attachment::CurrencyMinting {
                nonce,
                currency_id,
                units,
                counter,
            } => {
                writer.write_u64::<LittleEndian>(*nonce)?;
                writer.write_u64::<LittleEndian>(currency_id.0)?;
                writer.write_u64::<LittleEndian>(*units)?;
                writer.write_u64::<LittleEndian>(*counter)
            }
        }
    }

    /// Read the subtype-specific fields for `(type_code, subtype_code)`.
    fn deserialize_body<R: io::Read>(
        type_code: u8,
        subtype_code: u8,
        reader: &mut R,
    ) -> Result<Self, SerializationError> {
        match (type_code, subtype_code) {
            (TYPE_PAYMENT, 0) => Ok(Attachment::OrdinaryPayment),
            (TYPE_MONETARY_SYSTEM, 0) => {
                Ok(Attachment::CurrencyIssuance(CurrencyIssuance::aureus_deserialize(reader)?))
            }
            (TYPE_MONETARY_SYSTEM, 1) => Ok(Attachment::ReserveIncrease {
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                amount_per_unit: reader.read_u64::<LittleEndian>()?,
            }),
            (TYPE_MONETARY_SYSTEM, 2) => Ok(Attachment::ReserveClaim {
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                units: reader.read_u64::<LittleEndian>()?,
            }),
            (TYPE_MONETARY_SYSTEM, 3) => Ok(Attachment::CurrencyTransfer {
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                units: reader.read_u64::<LittleEndian>()?,
            }),
            (TYPE_MONETARY_SYSTEM, 4) => Ok(Attachment::PublishExchangeOffer(
                PublishExchangeOffer::aureus_deserialize(reader)?,
            )),
            (TYPE_MONETARY_SYSTEM, 5) => Ok(Attachment::ExchangeBuy {
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                rate: reader.read_u64::<LittleEndian>()?,
                units: reader.read_u64::<LittleEndian>()?,
            }),
            (TYPE_MONETARY_SYSTEM, 6) => Ok(Attachment::ExchangeSell {
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                rate: reader.read_u64::<LittleEndian>()?,
                units: reader.read_u64::<LittleEndian>()?,
            }),
            (TYPE_MONETARY_SYSTEM, 7) => Ok(Attachment::CurrencyMinting {
                nonce: reader.read_u64::<LittleEndian>()?,
                currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
                units: reader.read_u64::<LittleEndian>()?,
                counter: reader.read_u64::<LittleEndian>()?,
            }),
            _ => Err(SerializationError::Parse("unknown transaction type or subtype")),
        }
    }
}

impl AureusSerialize for CurrencyIssuance {
    fn aureus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_string8(&self.name)?;
        writer.write_string8(&self.code)?;
        writer.write_string16(&self.description)?;
        writer.write_u32::<LittleEndian>(self.flags.bits())?;
        writer.write_u64::<LittleEndian>(self.initial_supply)?;
        writer.write_u64::<LittleEndian>(self.max_supply)?;
        writer.write_u32::<LittleEndian>(self.issuance_height.0)?;
        writer.write_u8(self.algorithm)?;
        writer.write_u8(self.min_difficulty)?;
        writer.write_u8(self.max_difficulty)?;
        writer.write_u8(self.decimals)
    }
}

impl AureusDeserialize for CurrencyIssuance {
    fn aureus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(CurrencyIssuance {
            name: reader.read_string8()?,
            code: reader.read_string8()?,
            description: reader.read_string16()?,
            flags: CurrencyFlags::from_bits(reader.read_u32::<LittleEndian>()?),
            initial_supply: reader.read_u64::<LittleEndian>()?,
            max_supply: reader.read_u64::<LittleEndian>()?,
            issuance_height: Height(reader.read_u32::<LittleEndian>()?),
            algorithm: reader.read_u8()?,
            min_difficulty: reader.read_u8()?,
            max_difficulty: reader.read_u8()?,
            decimals: reader.read_u8()?,
        })
    }
}

impl AureusSerialize for PublishExchangeOffer {
    fn aureus_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u64::<LittleEndian>(self.currency_id.0)?;
        writer.write_u64::<LittleEndian>(self.buy_rate)?;
        writer.write_u64::<LittleEndian>(self.sell_rate)?;
        writer.write_u64::<LittleEndian>(self.total_buy_limit)?;
        writer.write_u64::<LittleEndian>(self.total_sell_limit)?;
        writer.write_u64::<LittleEndian>(self.initial_buy_supply)?;
        writer.write_u64::<LittleEndian>(self.initial_sell_supply)?;
        writer.write_u32::<LittleEndian>(self.expiration_height.0)
    }
}

impl AureusDeserialize for PublishExchangeOffer {
    fn aureus_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(PublishExchangeOffer {
            currency_id: CurrencyId(reader.read_u64::<LittleEndian>()?),
            buy_rate: reader.read_u64::<LittleEndian>()?,
            sell_rate: reader.read_u64::<LittleEndian>()?,
            total_buy_limit: reader.read_u64::<LittleEndian>()?,
            total_sell_limit: reader.read_u64::<LittleEndian>()?,
            initial_buy_supply: reader.read_u64::<LittleEndian>()?,
            initial_sell_supply: reader.read_u64::<LittleEndian>()?,
            expiration_height: Height(reader.read_u32::<LittleEndian>()?),
        })
    }
}
