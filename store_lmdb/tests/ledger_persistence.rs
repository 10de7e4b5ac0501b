//! Persist a live ledger to LMDB and load it back.

use dstake_nullables::NullReserve;
use dstake_staking::{StakingError, StakingLedger};
use dstake_store::{Column, StakingStore, WriteBatch};
use dstake_store_lmdb::LmdbEnvironment;
use dstake_types::{AccountId, StakingParams};

fn params() -> StakingParams {
    StakingParams {
        max_top_nominations_per_candidate: 2,
        max_bottom_nominations_per_candidate: 1,
        min_full_candidate_stake: 100,
        min_basic_candidate_stake: 50,
        min_nomination: 10,
        min_nominator_stake: 10,
        nomination_bond_less_delay: 2,
        round_length: 10,
        ..StakingParams::default()
    }
}

fn reserve() -> NullReserve {
    NullReserve::with_balances([("stash", 10_000), ("n1", 5_000), ("n2", 5_000)])
}

#[test]
fn ledger_round_trips_through_lmdb() {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).expect("open env");
    let store = env.staking_store();

    let alice = AccountId::from("alice");
    let stash = AccountId::from("stash");
    let n1 = AccountId::from("n1");
    let n2 = AccountId::from("n2");

    let mut ledger = StakingLedger::new(params(), reserve()).unwrap();
    ledger.join_candidates(&stash, &alice, None, 500, 0).unwrap();
    ledger.nominate(&n1, &alice, 300, 0, 0).unwrap();
    ledger.nominate(&n2, &alice, 200, 1, 0).unwrap();
    ledger.schedule_nominator_bond_less(&n1, &alice, 100).unwrap();
    ledger.new_round(10, &[alice.clone()]).unwrap();
    assert!(ledger.persist(&store).unwrap() > 0);

    let loaded = StakingLedger::load_from_store(&store, params(), reserve()).unwrap();
    assert_eq!(loaded.current_round(), 2);
    assert_eq!(loaded.total(), ledger.total());
    assert_eq!(loaded.candidate(&alice), ledger.candidate(&alice));
    assert_eq!(loaded.top_nominations(&alice), ledger.top_nominations(&alice));
    assert_eq!(loaded.unstaking_nominations(&alice), ledger.unstaking_nominations(&alice));
    assert_eq!(loaded.nominator(&n1), ledger.nominator(&n1));
    assert_eq!(loaded.selected_candidates(), &[alice.clone()]);
    assert_eq!(loaded.at_stake(2, &alice), ledger.at_stake(2, &alice));
    assert_eq!(loaded.total_at_stake(2), ledger.total_at_stake(2));
    loaded.check_invariants().unwrap();
}

#[test]
fn incremental_persist_deletes_removed_keys() {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).expect("open env");
    let store = env.staking_store();

    let alice = AccountId::from("alice");
    let n1 = AccountId::from("n1");

    let mut ledger = StakingLedger::new(params(), reserve()).unwrap();
    ledger
        .join_candidates(&AccountId::from("stash"), &alice, None, 500, 0)
        .unwrap();
    ledger.nominate(&n1, &alice, 300, 0, 0).unwrap();
    ledger.persist(&store).unwrap();
    assert_eq!(store.iter(Column::NominatorState).unwrap().len(), 1);

    let when = ledger.schedule_revoke_nomination(&n1, &alice).unwrap();
    for block in 1..=when {
        ledger.new_round(u64::from(block) * 10, &[]).unwrap();
    }
    ledger.execute_nomination_request(&n1, &alice, when).unwrap();
    assert!(ledger.nominator(&n1).is_none());

    ledger.persist(&store).unwrap();
    assert!(store.iter(Column::NominatorState).unwrap().is_empty());
    assert!(store.iter(Column::TopNominations).unwrap().is_empty());
    assert_eq!(store.iter(Column::CandidateInfo).unwrap().len(), 1);
}

#[test]
fn unknown_schema_version_is_refused() {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 16, 10 * 1024 * 1024).expect("open env");
    let store = env.staking_store();
    let mut batch = WriteBatch::new();
    batch.put(Column::Meta, b"schema_version".to_vec(), 99u32.to_le_bytes().to_vec());
    store.write(batch).unwrap();

    let err = StakingLedger::load_from_store(&store, params(), reserve())
        .err()
        .expect("must refuse");
    assert!(matches!(err, StakingError::SchemaVersion { found: 99, .. }));
}
