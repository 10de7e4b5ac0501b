//! LMDB environment setup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dstake_store::Column;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::staking::LmdbStakingStore;
use crate::LmdbError;

/// Wraps the LMDB environment and one database handle per ledger column.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    databases: BTreeMap<Column, Database<Bytes, Bytes>>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and make sure
    /// every column database exists.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never accessed outside heed's transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut databases = BTreeMap::new();
        for column in Column::ALL {
            let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(column.name()))?;
            databases.insert(column, db);
        }
        wtxn.commit()?;

        info!(path = %path.display(), columns = databases.len(), "LMDB environment opened");
        Ok(Self {
            env: Arc::new(env),
            databases,
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self, column: Column) -> Result<Database<Bytes, Bytes>, LmdbError> {
        self.databases
            .get(&column)
            .copied()
            .ok_or_else(|| LmdbError::MissingDatabase(column.name().to_string()))
    }

    /// A store handle sharing this environment.
    pub fn staking_store(&self) -> LmdbStakingStore {
        LmdbStakingStore {
            env: Arc::clone(&self.env),
            databases: self.databases.clone(),
        }
    }
}
