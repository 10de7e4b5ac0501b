//! Ranked nomination lists.

use dstake_types::{AccountId, Balance};
use serde::{Deserialize, Serialize};

/// One nominator's stake behind one candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub owner: AccountId,
    pub amount: Balance,
}

impl Bond {
    pub fn new(owner: AccountId, amount: Balance) -> Self {
        Self { owner, amount }
    }
}

/// A list of bonds kept sorted highest amount first.
///
/// Sorting is stable: entries with equal amounts keep their relative order, and a
/// newly inserted entry lands after every existing entry of the same amount.
/// `total` is always the sum of the amounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominations {
    nominations: Vec<Bond>,
    total: Balance,
}

impl Nominations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nominations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nominations.is_empty()
    }

    pub fn total(&self) -> Balance {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bond> {
        self.nominations.iter()
    }

    pub fn as_slice(&self) -> &[Bond] {
        &self.nominations
    }

    /// Smallest amount (the last entry).
    pub fn lowest(&self) -> Option<Balance> {
        self.nominations.last().map(|b| b.amount)
    }

    /// Largest amount (the first entry).
    pub fn highest(&self) -> Option<Balance> {
        self.nominations.first().map(|b| b.amount)
    }

    pub fn contains(&self, owner: &AccountId) -> bool {
        self.position(owner).is_some()
    }

    pub fn amount_of(&self, owner: &AccountId) -> Option<Balance> {
        self.position(owner).map(|i| self.nominations[i].amount)
    }

    fn position(&self, owner: &AccountId) -> Option<usize> {
        self.nominations.iter().position(|b| &b.owner == owner)
    }

    /// Insert after every entry whose amount is greater than or equal to `bond.amount`.
    pub fn insert_sorted(&mut self, bond: Bond) {
        let at = self
            .nominations
            .iter()
            .position(|b| b.amount < bond.amount)
            .unwrap_or(self.nominations.len());
        self.total += bond.amount;
        self.nominations.insert(at, bond);
    }

    pub fn remove(&mut self, owner: &AccountId) -> Option<Bond> {
        let i = self.position(owner)?;
        let bond = self.nominations.remove(i);
        self.total -= bond.amount;
        Some(bond)
    }

    pub fn pop_lowest(&mut self) -> Option<Bond> {
        let bond = self.nominations.pop()?;
        self.total -= bond.amount;
        Some(bond)
    }

    pub fn pop_highest(&mut self) -> Option<Bond> {
        if self.nominations.is_empty() {
            return None;
        }
        let bond = self.nominations.remove(0);
        self.total -= bond.amount;
        Some(bond)
    }

    /// Raise an entry in place and restore the ordering. Returns the new amount.
    pub fn increase(&mut self, owner: &AccountId, amount: Balance) -> Option<Balance> {
        let i = self.position(owner)?;
        let bond = &mut self.nominations[i];
        bond.amount = bond.amount.checked_add(amount)?;
        let new_amount = bond.amount;
        self.total += amount;
        self.resort();
        Some(new_amount)
    }

    /// Lower an entry in place and restore the ordering. Returns the new amount.
    pub fn decrease(&mut self, owner: &AccountId, amount: Balance) -> Option<Balance> {
        let i = self.position(owner)?;
        let bond = &mut self.nominations[i];
        bond.amount = bond.amount.checked_sub(amount)?;
        let new_amount = bond.amount;
        self.total -= amount;
        self.resort();
        Some(new_amount)
    }

    /// Add to an owner's entry, creating it when absent.
    pub fn add_amount(&mut self, owner: &AccountId, amount: Balance) {
        if self.increase(owner, amount).is_none() {
            self.insert_sorted(Bond::new(owner.clone(), amount));
        }
    }

    /// Subtract from an owner's entry, dropping it when it reaches zero.
    pub fn sub_amount(&mut self, owner: &AccountId, amount: Balance) {
        match self.amount_of(owner) {
            Some(current) if current <= amount => {
                self.remove(owner);
            }
            Some(_) => {
                self.decrease(owner, amount);
            }
            None => {}
        }
    }

    /// Rename an owner in place, keeping its position.
    pub fn rename(&mut self, from: &AccountId, to: &AccountId) {
        if let Some(i) = self.position(from) {
            self.nominations[i].owner = to.clone();
        }
    }

    fn resort(&mut self) {
        // `sort_by` is stable, so equal amounts keep their order.
        self.nominations.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bond(owner: &str, amount: Balance) -> Bond {
        Bond::new(AccountId::from(owner), amount)
    }

    fn owners(list: &Nominations) -> Vec<&str> {
        list.iter().map(|b| b.owner.as_str()).collect()
    }

    #[test]
    fn insert_keeps_highest_first_and_ties_in_arrival_order() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 1_000));
        list.insert_sorted(bond("b", 1_000));
        list.insert_sorted(bond("c", 2_000));
        list.insert_sorted(bond("d", 500));
        assert_eq!(owners(&list), ["c", "a", "b", "d"]);
        assert_eq!(list.total(), 4_500);
        assert_eq!(list.highest(), Some(2_000));
        assert_eq!(list.lowest(), Some(500));
    }

    #[test]
    fn increase_reorders_but_keeps_tie_order() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 1_000));
        list.insert_sorted(bond("b", 1_000));
        list.insert_sorted(bond("c", 1_000));
        assert_eq!(list.increase(&"c".into(), 1_000), Some(2_000));
        assert_eq!(owners(&list), ["c", "a", "b"]);
        assert_eq!(list.total(), 4_000);
    }

    #[test]
    fn decrease_moves_entry_down() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 3_000));
        list.insert_sorted(bond("b", 2_000));
        assert_eq!(list.decrease(&"a".into(), 1_500), Some(1_500));
        assert_eq!(owners(&list), ["b", "a"]);
        assert_eq!(list.total(), 3_500);
    }

    #[test]
    fn decrease_below_zero_is_refused() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 10));
        assert_eq!(list.decrease(&"a".into(), 11), None);
        assert_eq!(list.total(), 10);
    }

    #[test]
    fn pop_ends() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 3));
        list.insert_sorted(bond("b", 2));
        list.insert_sorted(bond("c", 1));
        assert_eq!(list.pop_highest().map(|b| b.amount), Some(3));
        assert_eq!(list.pop_lowest().map(|b| b.amount), Some(1));
        assert_eq!(owners(&list), ["b"]);
        assert_eq!(list.total(), 2);
    }

    #[test]
    fn add_and_sub_amount_manage_presence() {
        let mut list = Nominations::new();
        list.add_amount(&"a".into(), 5);
        list.add_amount(&"a".into(), 7);
        assert_eq!(list.amount_of(&"a".into()), Some(12));
        list.sub_amount(&"a".into(), 2);
        assert_eq!(list.amount_of(&"a".into()), Some(10));
        list.sub_amount(&"a".into(), 10);
        assert!(list.is_empty());
        assert_eq!(list.total(), 0);
    }

    #[test]
    fn rename_keeps_position() {
        let mut list = Nominations::new();
        list.insert_sorted(bond("a", 3));
        list.insert_sorted(bond("b", 2));
        list.rename(&"a".into(), &"z".into());
        assert_eq!(owners(&list), ["z", "b"]);
    }
}
