//! Keyed-store trait for the persisted ledger layout.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical keyed store of the ledger.
///
/// Values are opaque bytes so this crate does not depend on `dstake-staking`
/// (which would create a circular dependency). The engine serializes its own types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    /// candidate → candidate record
    CandidateInfo,
    /// stash → candidate
    BondedStash,
    TopNominations,
    BottomNominations,
    UnstakingNominations,
    /// nominator → nominator record
    NominatorState,
    /// candidate → voting power, for candidates eligible for selection
    CandidatePool,
    /// maturity round → candidate-level request queues
    DelayedRequests,
    /// round → total snapshot
    TotalAtStake,
    /// (round, candidate) → candidate snapshot
    AtStake,
    /// Scalars: round, total, selected set, schema version.
    Meta,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::CandidateInfo,
        Column::BondedStash,
        Column::TopNominations,
        Column::BottomNominations,
        Column::UnstakingNominations,
        Column::NominatorState,
        Column::CandidatePool,
        Column::DelayedRequests,
        Column::TotalAtStake,
        Column::AtStake,
        Column::Meta,
    ];

    /// Stable name used by backends that keep one database per column.
    pub fn name(&self) -> &'static str {
        match self {
            Column::CandidateInfo => "candidate_info",
            Column::BondedStash => "bonded_stash",
            Column::TopNominations => "top_nominations",
            Column::BottomNominations => "bottom_nominations",
            Column::UnstakingNominations => "unstaking_nominations",
            Column::NominatorState => "nominator_state",
            Column::CandidatePool => "candidate_pool",
            Column::DelayedRequests => "delayed_requests",
            Column::TotalAtStake => "total_at_stake",
            Column::AtStake => "at_stake",
            Column::Meta => "meta",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put {
        column: Column,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        column: Column,
        key: Vec<u8>,
    },
}

/// A group of writes applied atomically by [`StakingStore::write`].
///
/// Ops are applied in insertion order, so a later put of the same key wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, column: Column, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { column, key, value });
    }

    pub fn delete(&mut self, column: Column, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { column, key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Persistent storage for the ledger's keyed stores.
pub trait StakingStore {
    /// Read one value.
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Read every entry of a column.
    fn iter(&self, column: Column) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Apply a batch atomically: either every op lands or none does.
    fn write(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
