//! Nullable capital reserve: in-memory free/reserved balances.

use dstake_store::{CapitalReserve, ReserveError};
use dstake_types::{AccountId, Balance};
use std::collections::BTreeMap;

/// Per-account free and reserved balances.
#[derive(Clone, Debug, Default)]
pub struct NullReserve {
    free: BTreeMap<AccountId, Balance>,
    reserved: BTreeMap<AccountId, Balance>,
    /// When set, every `reserve` call fails.
    fail_reserves: bool,
}

impl NullReserve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a reserve with the given free balances.
    pub fn with_balances<'a>(balances: impl IntoIterator<Item = (&'a str, Balance)>) -> Self {
        let mut reserve = Self::new();
        for (who, amount) in balances {
            reserve.deposit(&AccountId::from(who), amount);
        }
        reserve
    }

    /// Credit free balance.
    pub fn deposit(&mut self, who: &AccountId, amount: Balance) {
        *self.free.entry(who.clone()).or_default() += amount;
    }

    /// Make every subsequent `reserve` call fail (or stop failing).
    pub fn set_fail_reserves(&mut self, fail: bool) {
        self.fail_reserves = fail;
    }

    /// Sum of every account's reserved balance.
    pub fn total_reserved(&self) -> Balance {
        self.reserved.values().sum()
    }

    /// Sum of free plus reserved balance of one account.
    pub fn total_balance(&self, who: &AccountId) -> Balance {
        self.free_balance(who) + self.reserved_balance(who)
    }
}

impl CapitalReserve for NullReserve {
    fn free_balance(&self, who: &AccountId) -> Balance {
        self.free.get(who).copied().unwrap_or(0)
    }

    fn reserved_balance(&self, who: &AccountId) -> Balance {
        self.reserved.get(who).copied().unwrap_or(0)
    }

    fn reserve(&mut self, who: &AccountId, amount: Balance) -> Result<(), ReserveError> {
        if self.fail_reserves {
            return Err(ReserveError::Other("reserves disabled".into()));
        }
        let available = self.free_balance(who);
        if available < amount {
            return Err(ReserveError::InsufficientBalance {
                who: who.clone(),
                needed: amount,
                available,
            });
        }
        self.free.insert(who.clone(), available - amount);
        *self.reserved.entry(who.clone()).or_default() += amount;
        Ok(())
    }

    fn unreserve(&mut self, who: &AccountId, amount: Balance) -> Balance {
        let reserved = self.reserved_balance(who);
        let released = reserved.min(amount);
        if released == reserved {
            self.reserved.remove(who);
        } else {
            self.reserved.insert(who.clone(), reserved - released);
        }
        if released > 0 {
            *self.free.entry(who.clone()).or_default() += released;
        }
        amount - released
    }
}
