//! Journaled containers backing the ledger's keyed stores.
//!
//! While a call is in flight each container remembers the value a key had the
//! first time the call touched it, so a failed call can be undone exactly.
//! Independently, every written key is marked dirty until the next persist.

use std::collections::{BTreeMap, BTreeSet};

/// An ordered key-value store with first-touch undo and dirty tracking.
#[derive(Clone, Debug)]
pub struct KeyedMap<K, V> {
    entries: BTreeMap<K, V>,
    journal: Option<BTreeMap<K, Option<V>>>,
    dirty: BTreeSet<K>,
}

impl<K: Ord + Clone, V: Clone> Default for KeyedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            journal: None,
            dirty: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> KeyedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean map (nothing dirty) from loaded entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            journal: None,
            dirty: BTreeSet::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.touch(&key);
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.remove(key)
    }

    /// Mutable access to an existing entry; the key counts as written.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get_mut(key)
    }

    /// Mutable access, inserting `V::default()` when absent.
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.touch(&key);
        self.entries.entry(key).or_default()
    }

    /// Keys written since the last [`clear_dirty`](Self::clear_dirty).
    pub fn dirty_keys(&self) -> impl Iterator<Item = &K> {
        self.dirty.iter()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub(crate) fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "nested transaction");
        self.journal = Some(BTreeMap::new());
    }

    pub(crate) fn commit(&mut self) {
        self.journal = None;
    }

    pub(crate) fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for (key, original) in journal {
            match original {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    fn touch(&mut self, key: &K) {
        if let Some(journal) = self.journal.as_mut() {
            if !journal.contains_key(key) {
                journal.insert(key.clone(), self.entries.get(key).cloned());
            }
        }
        self.dirty.insert(key.clone());
    }
}

/// A single journaled value.
#[derive(Clone, Debug, Default)]
pub struct Journaled<T> {
    value: T,
    original: Option<T>,
    in_tx: bool,
    dirty: bool,
}

impl<T: Clone> Journaled<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            original: None,
            in_tx: false,
            dirty: false,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.touch();
        self.value = value;
    }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        self.touch();
        f(&mut self.value)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn begin(&mut self) {
        self.in_tx = true;
        self.original = None;
    }

    pub(crate) fn commit(&mut self) {
        self.in_tx = false;
        self.original = None;
    }

    pub(crate) fn rollback(&mut self) {
        if let Some(original) = self.original.take() {
            self.value = original;
        }
        self.in_tx = false;
    }

    fn touch(&mut self) {
        if self.in_tx && self.original.is_none() {
            self.original = Some(self.value.clone());
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_first_touched_values() {
        let mut map: KeyedMap<u32, &str> = KeyedMap::from_entries([(1, "one"), (2, "two")]);
        map.begin();
        map.insert(1, "uno");
        map.insert(1, "eins");
        map.remove(&2);
        map.insert(3, "three");
        map.rollback();
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&2), Some(&"two"));
        assert_eq!(map.get(&3), None);
    }

    #[test]
    fn commit_keeps_writes_and_marks_dirty() {
        let mut map: KeyedMap<u32, u64> = KeyedMap::new();
        map.begin();
        *map.entry_or_default(7) += 5;
        map.commit();
        assert_eq!(map.get(&7), Some(&5));
        assert_eq!(map.dirty_keys().copied().collect::<Vec<_>>(), vec![7]);
        map.clear_dirty();
        assert_eq!(map.dirty_keys().count(), 0);
    }

    #[test]
    fn removing_absent_key_is_not_a_write() {
        let mut map: KeyedMap<u32, u64> = KeyedMap::new();
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.dirty_keys().count(), 0);
    }

    #[test]
    fn scalar_rollback() {
        let mut total = Journaled::new(10u128);
        total.begin();
        total.update(|t| *t += 5);
        total.set(99);
        total.rollback();
        assert_eq!(*total.get(), 10);
        assert!(total.is_dirty());
    }
}
