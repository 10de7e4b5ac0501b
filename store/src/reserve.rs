//! Capital reservation primitive.
//!
//! The ledger never moves funds itself. It asks the balance layer to lock
//! (`reserve`) capital when stake is bonded and to release it (`unreserve`)
//! when a withdrawal matures or a nomination is settled.

use dstake_types::{AccountId, Balance};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReserveError {
    #[error("insufficient free balance for {who}: need {needed}, available {available}")]
    InsufficientBalance {
        who: AccountId,
        needed: Balance,
        available: Balance,
    },

    #[error("{0}")]
    Other(String),
}

/// The balance layer's reserve/unreserve surface.
pub trait CapitalReserve {
    /// Balance that can still be reserved.
    fn free_balance(&self, who: &AccountId) -> Balance;

    /// Balance currently locked by the ledger.
    fn reserved_balance(&self, who: &AccountId) -> Balance;

    /// Move `amount` from free to reserved.
    fn reserve(&mut self, who: &AccountId, amount: Balance) -> Result<(), ReserveError>;

    /// Move up to `amount` from reserved back to free.
    ///
    /// Returns the part of `amount` that was not reserved and therefore could not
    /// be released (zero when the books are consistent).
    fn unreserve(&mut self, who: &AccountId, amount: Balance) -> Balance;
}
