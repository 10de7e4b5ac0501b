//! Save and restore the ledger through a [`StakingStore`].
//!
//! Keys and values are bincode encodings. Only keys written since the last
//! persist are flushed; a key that no longer exists is deleted.

use crate::error::StakingError;
use crate::journal::{Journaled, KeyedMap};
use crate::ledger::StakingLedger;
use crate::round::RoundInfo;
use crate::state::LedgerState;
use dstake_store::{CapitalReserve, Column, StakingStore, StoreError, WriteBatch};
use dstake_types::{AccountId, Balance, StakingParams};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

/// Layout version written to the meta column.
pub const SCHEMA_VERSION: u32 = 1;

const META_SCHEMA_VERSION: &[u8] = b"schema_version";
const META_ROUND: &[u8] = b"round";
const META_TOTAL: &[u8] = b"total";
const META_SELECTED: &[u8] = b"selected";

impl<R: CapitalReserve> StakingLedger<R> {
    /// Write every key touched since the last persist in one atomic batch.
    /// Returns the number of ops written.
    pub fn persist(&mut self, store: &dyn StakingStore) -> Result<usize, StakingError> {
        let state = &self.state;
        let mut batch = WriteBatch::new();
        write_dirty(&mut batch, Column::CandidateInfo, &state.candidate_info)?;
        write_dirty(&mut batch, Column::BondedStash, &state.bonded_stash)?;
        write_dirty(&mut batch, Column::TopNominations, &state.top_nominations)?;
        write_dirty(&mut batch, Column::BottomNominations, &state.bottom_nominations)?;
        write_dirty(&mut batch, Column::UnstakingNominations, &state.unstaking_nominations)?;
        write_dirty(&mut batch, Column::NominatorState, &state.nominator_state)?;
        write_dirty(&mut batch, Column::CandidatePool, &state.candidate_pool)?;
        write_dirty(&mut batch, Column::DelayedRequests, &state.delayed_requests)?;
        write_dirty(&mut batch, Column::TotalAtStake, &state.total_at_stake)?;
        write_dirty(&mut batch, Column::AtStake, &state.at_stake)?;
        write_scalar(&mut batch, META_ROUND, &state.round)?;
        write_scalar(&mut batch, META_TOTAL, &state.total)?;
        write_scalar(&mut batch, META_SELECTED, &state.selected)?;
        batch.put(
            Column::Meta,
            META_SCHEMA_VERSION.to_vec(),
            bincode::serialize(&SCHEMA_VERSION)?,
        );

        let ops = batch.len();
        store.write(batch)?;
        self.state.clear_dirty();
        debug!(ops, "ledger persisted");
        Ok(ops)
    }

    /// Rebuild a ledger from `store`. An empty store yields a fresh ledger.
    ///
    /// The stored round keeps its index and start block; its length is taken
    /// from `params`.
    pub fn load_from_store(
        store: &dyn StakingStore,
        params: StakingParams,
        reserve: R,
    ) -> Result<Self, StakingError> {
        params.validate()?;
        let Some(raw) = store.get(Column::Meta, META_SCHEMA_VERSION)? else {
            return Self::new(params, reserve);
        };
        let found: u32 = bincode::deserialize(&raw)?;
        if found != SCHEMA_VERSION {
            return Err(StakingError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }

        let mut round: RoundInfo = read_meta(store, META_ROUND)?
            .unwrap_or_else(|| RoundInfo::new(1, 0, params.round_length));
        round.length = params.round_length;
        let total: Balance = read_meta(store, META_TOTAL)?.unwrap_or(0);
        let selected: Vec<AccountId> = read_meta(store, META_SELECTED)?.unwrap_or_default();

        let state = LedgerState {
            round: Journaled::new(round),
            total: Journaled::new(total),
            selected: Journaled::new(selected),
            candidate_info: read_column(store, Column::CandidateInfo)?,
            bonded_stash: read_column(store, Column::BondedStash)?,
            top_nominations: read_column(store, Column::TopNominations)?,
            bottom_nominations: read_column(store, Column::BottomNominations)?,
            unstaking_nominations: read_column(store, Column::UnstakingNominations)?,
            nominator_state: read_column(store, Column::NominatorState)?,
            candidate_pool: read_column(store, Column::CandidatePool)?,
            delayed_requests: read_column(store, Column::DelayedRequests)?,
            total_at_stake: read_column(store, Column::TotalAtStake)?,
            at_stake: read_column(store, Column::AtStake)?,
        };
        info!(
            round = round.current,
            candidates = state.candidate_info.len(),
            nominators = state.nominator_state.len(),
            "ledger loaded"
        );
        Ok(Self::from_parts(params, state, reserve))
    }
}

fn write_dirty<K, V>(
    batch: &mut WriteBatch,
    column: Column,
    map: &KeyedMap<K, V>,
) -> Result<(), StakingError>
where
    K: Ord + Clone + Serialize,
    V: Clone + Serialize,
{
    for key in map.dirty_keys() {
        let raw_key = bincode::serialize(key)?;
        match map.get(key) {
            Some(value) => batch.put(column, raw_key, bincode::serialize(value)?),
            None => batch.delete(column, raw_key),
        }
    }
    Ok(())
}

fn write_scalar<T: Clone + Serialize>(
    batch: &mut WriteBatch,
    key: &[u8],
    value: &Journaled<T>,
) -> Result<(), StakingError> {
    if value.is_dirty() {
        batch.put(Column::Meta, key.to_vec(), bincode::serialize(value.get())?);
    }
    Ok(())
}

fn read_meta<T: DeserializeOwned>(
    store: &dyn StakingStore,
    key: &[u8],
) -> Result<Option<T>, StakingError> {
    store
        .get(Column::Meta, key)?
        .map(|raw| bincode::deserialize(&raw).map_err(StakingError::from))
        .transpose()
}

fn read_column<K, V>(store: &dyn StakingStore, column: Column) -> Result<KeyedMap<K, V>, StakingError>
where
    K: Ord + Clone + DeserializeOwned,
    V: Clone + DeserializeOwned,
{
    let corrupt = |e: bincode::Error| StoreError::Corruption(format!("{column}: {e}"));
    let mut entries = Vec::new();
    for (raw_key, raw_value) in store.iter(column)? {
        let key = bincode::deserialize(&raw_key).map_err(corrupt)?;
        let value = bincode::deserialize(&raw_value).map_err(corrupt)?;
        entries.push((key, value));
    }
    Ok(KeyedMap::from_entries(entries))
}
