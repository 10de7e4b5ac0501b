//! Nullable store: thread-safe in-memory storage for testing.

use dstake_store::{BatchOp, Column, StakingStore, StoreError, WriteBatch};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type ColumnData = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory [`StakingStore`]. Batches apply under one lock, so they are
/// atomic with respect to readers.
#[derive(Default)]
pub struct NullStakingStore {
    columns: Mutex<HashMap<Column, ColumnData>>,
    writes: Mutex<usize>,
}

impl NullStakingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored in `column`.
    pub fn len(&self, column: Column) -> usize {
        self.columns
            .lock()
            .map(|columns| columns.get(&column).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Number of batches written so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }

    fn lock_error() -> StoreError {
        StoreError::Backend("null store lock poisoned".into())
    }
}

impl StakingStore for NullStakingStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let columns = self.columns.lock().map_err(|_| Self::lock_error())?;
        Ok(columns.get(&column).and_then(|data| data.get(key).cloned()))
    }

    fn iter(&self, column: Column) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let columns = self.columns.lock().map_err(|_| Self::lock_error())?;
        Ok(columns
            .get(&column)
            .map(|data| data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut columns = self.columns.lock().map_err(|_| Self::lock_error())?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { column, key, value } => {
                    columns.entry(column).or_default().insert(key, value);
                }
                BatchOp::Delete { column, key } => {
                    if let Some(data) = columns.get_mut(&column) {
                        data.remove(&key);
                    }
                }
            }
        }
        let mut writes = self.writes.lock().map_err(|_| Self::lock_error())?;
        *writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_applies_in_order() {
        let store = NullStakingStore::new();
        let mut batch = WriteBatch::new();
        batch.put(Column::Meta, b"a".to_vec(), b"1".to_vec());
        batch.put(Column::Meta, b"b".to_vec(), b"2".to_vec());
        batch.delete(Column::Meta, b"a".to_vec());
        store.write(batch).unwrap();

        assert_eq!(store.get(Column::Meta, b"a").unwrap(), None);
        assert_eq!(store.get(Column::Meta, b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.iter(Column::Meta).unwrap().len(), 1);
        assert_eq!(store.len(Column::CandidateInfo), 0);
        assert_eq!(store.write_count(), 1);
    }
}
