//! LMDB implementation of StakingStore.

use std::collections::BTreeMap;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use dstake_store::{BatchOp, Column, StakingStore, StoreError, WriteBatch};

use crate::LmdbError;

pub struct LmdbStakingStore {
    pub(crate) env: Arc<Env>,
    pub(crate) databases: BTreeMap<Column, Database<Bytes, Bytes>>,
}

impl LmdbStakingStore {
    fn db(&self, column: Column) -> Result<Database<Bytes, Bytes>, LmdbError> {
        self.databases
            .get(&column)
            .copied()
            .ok_or_else(|| LmdbError::MissingDatabase(column.name().to_string()))
    }
}

impl StakingStore for LmdbStakingStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = self.db(column)?;
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(val.map(|bytes| bytes.to_vec()))
    }

    fn iter(&self, column: Column) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let db = self.db(column)?;
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for item in db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = item.map_err(LmdbError::from)?;
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.ops() {
            match op {
                BatchOp::Put { column, key, value } => {
                    self.db(*column)?
                        .put(&mut wtxn, key, value)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::Delete { column, key } => {
                    self.db(*column)?
                        .delete(&mut wtxn, key)
                        .map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn open() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    #[test]
    fn put_get_delete() {
        let (_dir, env) = open();
        let store = env.staking_store();
        let mut batch = WriteBatch::new();
        batch.put(Column::CandidateInfo, b"alice".to_vec(), b"record".to_vec());
        batch.put(Column::Meta, b"round".to_vec(), vec![7]);
        store.write(batch).unwrap();

        assert_eq!(
            store.get(Column::CandidateInfo, b"alice").unwrap(),
            Some(b"record".to_vec())
        );
        assert_eq!(store.get(Column::NominatorState, b"alice").unwrap(), None);

        let mut batch = WriteBatch::new();
        batch.delete(Column::CandidateInfo, b"alice".to_vec());
        store.write(batch).unwrap();
        assert_eq!(store.get(Column::CandidateInfo, b"alice").unwrap(), None);
        assert_eq!(store.iter(Column::Meta).unwrap(), vec![(b"round".to_vec(), vec![7])]);
    }

    #[test]
    fn columns_are_isolated_and_iterate_in_key_order() {
        let (_dir, env) = open();
        let store = env.staking_store();
        let mut batch = WriteBatch::new();
        batch.put(Column::TopNominations, b"b".to_vec(), b"2".to_vec());
        batch.put(Column::TopNominations, b"a".to_vec(), b"1".to_vec());
        batch.put(Column::BottomNominations, b"a".to_vec(), b"x".to_vec());
        store.write(batch).unwrap();

        let keys: Vec<Vec<u8>> = store
            .iter(Column::TopNominations)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(store.iter(Column::BottomNominations).unwrap().len(), 1);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).unwrap();
            let mut batch = WriteBatch::new();
            batch.put(Column::Meta, b"schema_version".to_vec(), vec![1, 0, 0, 0]);
            env.staking_store().write(batch).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).unwrap();
        assert_eq!(
            env.staking_store().get(Column::Meta, b"schema_version").unwrap(),
            Some(vec![1, 0, 0, 0])
        );
    }
}
