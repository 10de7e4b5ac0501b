mod common;

use common::*;
use dstake_nullables::NullStakingStore;
use dstake_staking::{ErrorKind, StakingError, StakingLedger, SCHEMA_VERSION};
use dstake_store::{Column, StakingStore, StoreError, WriteBatch};

#[test]
fn empty_store_yields_fresh_ledger() {
    let store = NullStakingStore::new();
    let ledger = StakingLedger::load_from_store(&store, params(), funded_reserve()).unwrap();
    assert_eq!(ledger.current_round(), 1);
    assert_eq!(ledger.total(), 0);
    assert_eq!(ledger.candidates().count(), 0);
}

#[test]
fn persist_writes_only_touched_keys() {
    let store = NullStakingStore::new();
    let mut ledger = ledger_with_alice();
    let alice = id("alice");
    ledger.nominate(&id("a"), &alice, 1_000, HINT, HINT).unwrap();
    ledger.persist(&store).unwrap();
    assert_eq!(store.len(Column::CandidateInfo), 1);
    assert_eq!(store.len(Column::NominatorState), 1);
    let raw = store.get(Column::Meta, b"schema_version").unwrap().unwrap();
    assert_eq!(bincode::deserialize::<u32>(&raw).unwrap(), SCHEMA_VERSION);

    // Nothing touched: only the schema marker is rewritten.
    assert_eq!(ledger.persist(&store).unwrap(), 1);

    ledger.nominate(&id("b"), &alice, 500, HINT, HINT).unwrap();
    // candidate, top list, pool entry, nominator, total, schema marker
    assert_eq!(ledger.persist(&store).unwrap(), 6);
    assert_eq!(store.write_count(), 3);
}

#[test]
fn candidate_exit_is_deleted_from_store() {
    let store = NullStakingStore::new();
    let mut ledger = ledger_with_alice();
    let alice = id("alice");
    ledger.nominate(&id("a"), &alice, 1_000, HINT, HINT).unwrap();
    ledger.persist(&store).unwrap();

    ledger.schedule_leave_candidates(&alice, HINT).unwrap();
    advance(&mut ledger, 2);
    ledger.execute_leave_candidates(&alice, HINT).unwrap();
    ledger.persist(&store).unwrap();

    for column in [
        Column::CandidateInfo,
        Column::BondedStash,
        Column::TopNominations,
        Column::NominatorState,
        Column::CandidatePool,
    ] {
        assert_eq!(store.len(column), 0, "{column} not cleared");
    }
    // Snapshots for the rounds advanced through stay behind.
    assert_eq!(store.len(Column::TotalAtStake), 2);

    let loaded = StakingLedger::load_from_store(&store, params(), funded_reserve()).unwrap();
    assert_eq!(loaded.current_round(), 3);
    assert_eq!(loaded.total(), 0);
    assert!(loaded.candidate(&alice).is_none());
    loaded.check_invariants().unwrap();
}

#[test]
fn undecodable_record_is_reported_as_corruption() {
    let store = NullStakingStore::new();
    let mut batch = WriteBatch::new();
    batch.put(
        Column::Meta,
        b"schema_version".to_vec(),
        bincode::serialize(&SCHEMA_VERSION).unwrap(),
    );
    batch.put(
        Column::CandidateInfo,
        bincode::serialize(&id("alice")).unwrap(),
        vec![0xff],
    );
    store.write(batch).unwrap();

    match StakingLedger::load_from_store(&store, params(), funded_reserve()) {
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::Persistence);
            assert!(matches!(err, StakingError::Store(StoreError::Corruption(_))));
            assert!(err.to_string().contains("candidate"), "{err}");
        }
        Ok(_) => panic!("corrupted candidate record loaded"),
    }
}
