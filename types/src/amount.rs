//! Balance type for staked capital.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw.

/// Raw units of the staked currency.
pub type Balance = u128;

/// One whole token in raw units (10^12).
pub const UNIT: Balance = 1_000_000_000_000;

/// Serde adapter writing a [`Balance`] as a `u64`.
///
/// TOML integers are 64-bit, so configuration amounts must fit in a `u64`.
pub mod as_u64 {
    use super::Balance;
    use serde::de::Deserialize;
    use serde::ser::Error;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Balance, serializer: S) -> Result<S::Ok, S::Error> {
        let value = u64::try_from(*value)
            .map_err(|_| S::Error::custom(format!("balance {value} does not fit in 64 bits")))?;
        serializer.serialize_u64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        u64::deserialize(deserializer).map(Balance::from)
    }
}
