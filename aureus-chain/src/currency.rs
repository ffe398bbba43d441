//! User-issued currencies.
//!
//! A currency is created by an issuance transaction and lives in the
//! chain's currency registry. Its capability mask is fixed at issuance
//! and drives the Monetary System validation rules in
//! [`crate::monetary_system`].

use std::{fmt, ops};

use crate::{account::AccountId, block::Height};

/// A numeric currency identifier: the id of the issuance transaction.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CurrencyId(pub u64);

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A capability of a user-issued currency.
///
/// Each capability is one bit in the currency's type mask, and carries
/// its own validation rules for the Monetary System transactions that
/// touch the currency.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CurrencyFlag {
    /// May be traded against the base coin via exchange offers.
    Exchangeable,
    /// Transfers and offer publication are restricted to the issuer.
    Controllable,
    /// Supply is formed by reserve contributions before activation; the
    /// currency activates at its issuance height.
    Reservable,
    /// The reserve can be claimed back after activation. Requires
    /// [`CurrencyFlag::Reservable`], forbids [`CurrencyFlag::Exchangeable`].
    Claimable,
    /// Supply can be grown with proof-of-work minting.
    Mintable,
    /// Reserved for shuffling, which is not enabled yet.
    Shuffleable,
}

impl CurrencyFlag {
    /// All capabilities, in rule-evaluation order.
    pub const ALL: [CurrencyFlag; 6] = [
        CurrencyFlag::Exchangeable,
        CurrencyFlag::Controllable,
        CurrencyFlag::Reservable,
        CurrencyFlag::Claimable,
        CurrencyFlag::Mintable,
        CurrencyFlag::Shuffleable,
    ];

    /// The bit for this capability in a currency type mask.
    pub fn bit(&self) -> u32 {
        match self {
            CurrencyFlag::Exchangeable => 0x01,
            CurrencyFlag::Controllable => 0x02,
            CurrencyFlag::Reservable => 0x04,
            CurrencyFlag::Claimable => 0x08,
            CurrencyFlag::Mintable => 0x10,
            CurrencyFlag::Shuffleable => 0x20,
        }
    }
}

/// A set of currency capabilities, as a bitmask.
///
/// Bits outside the closed capability set are preserved but have no
/// meaning; a mask with no known capability set is rejected at issuance.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyFlags(u32);

impl CurrencyFlags {
    /// Build a capability set from raw mask bits.
    pub const fn from_bits(bits: u32) -> Self {
        CurrencyFlags(bits)
    }

    /// The raw mask bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if `flag` is present in the mask.
    pub fn contains(&self, flag: CurrencyFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Returns true if no known capability is present.
    pub fn is_empty(&self) -> bool {
        CurrencyFlag::ALL.iter().all(|flag| !self.contains(*flag))
    }
}

impl From<CurrencyFlag> for CurrencyFlags {
    fn from(flag: CurrencyFlag) -> Self {
        CurrencyFlags(flag.bit())
    }
}

impl ops::BitOr for CurrencyFlag {
    type Output = CurrencyFlags;

    fn bitor(self, other: CurrencyFlag) -> CurrencyFlags {
        CurrencyFlags(self.bit() | other.bit())
    }
}

impl ops::BitOr<CurrencyFlag> for CurrencyFlags {
    type Output = CurrencyFlags;

    fn bitor(self, other: CurrencyFlag) -> CurrencyFlags {
        CurrencyFlags(self.0 | other.bit())
    }
}

impl fmt::Debug for CurrencyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for flag in CurrencyFlag::ALL {
            if self.contains(flag) {
                set.entry(&flag);
            }
        }
        set.finish()
    }
}

/// A snapshot of a currency's registry entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Currency {
    /// The currency id.
    pub id: CurrencyId,
    /// The issuer account.
    pub account_id: AccountId,
    /// The display name, unique among active currencies.
    pub name: String,
    /// The short code, unique among active currencies.
    pub code: String,
    /// A free-form description.
    pub description: String,
    /// The capability mask fixed at issuance.
    pub flags: CurrencyFlags,
    /// The current total supply, in currency units.
    pub current_supply: u64,
    /// The height the currency activates at; zero for currencies active
    /// from issuance.
    pub issuance_height: Height,
}

impl Currency {
    /// Returns true if the currency is active at `height`.
    ///
    /// A reservable currency is pending until its issuance height; while
    /// pending it accepts reserve contributions and nothing else.
    pub fn is_active(&self, height: Height) -> bool {
        height >= self.issuance_height
    }
}

/// Read access to the active currency registry.
pub trait CurrencyRegistry {
    /// Look up a currency by id.
    fn currency(&self, id: CurrencyId) -> Option<Currency>;

    /// Look up an active currency by its normalized (lowercase) name.
    fn currency_by_name(&self, name: &str) -> Option<Currency>;

    /// Look up an active currency by its code.
    fn currency_by_code(&self, code: &str) -> Option<Currency>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_are_distinct() {
        let mut seen = 0u32;
        for flag in CurrencyFlag::ALL {
            assert_eq!(seen & flag.bit(), 0);
            seen |= flag.bit();
        }
        assert_eq!(seen, 0x3f);
    }

    #[test]
    fn flag_set_operations() {
        let flags = CurrencyFlag::Reservable | CurrencyFlag::Claimable;
        assert!(flags.contains(CurrencyFlag::Reservable));
        assert!(flags.contains(CurrencyFlag::Claimable));
        assert!(!flags.contains(CurrencyFlag::Exchangeable));
        assert!(!flags.is_empty());

        // unknown bits alone leave the set empty of capabilities
        assert!(CurrencyFlags::from_bits(0x40).is_empty());
    }
}
