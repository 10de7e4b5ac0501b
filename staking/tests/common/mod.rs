#![allow(dead_code)]

use dstake_nullables::NullReserve;
use dstake_staking::StakingLedger;
use dstake_types::{AccountId, Balance, StakingParams};

pub type Ledger = StakingLedger<NullReserve>;

pub const HINT: u32 = 100;

pub fn id(s: &str) -> AccountId {
    AccountId::from(s)
}

/// Small capacities and short delays: K = 2, M = 1, every delay 2 rounds
/// except controller/commission changes (1 round).
pub fn params() -> StakingParams {
    StakingParams {
        max_top_nominations_per_candidate: 2,
        max_bottom_nominations_per_candidate: 1,
        max_nominations_per_nominator: 3,
        min_full_candidate_stake: 1_000,
        min_basic_candidate_stake: 500,
        min_nomination: 100,
        min_nominator_stake: 100,
        leave_candidates_delay: 2,
        candidate_bond_less_delay: 2,
        leave_nominators_delay: 2,
        revoke_nomination_delay: 2,
        nomination_bond_less_delay: 2,
        controller_set_delay: 1,
        commission_set_delay: 1,
        default_commission_bps: 1_000,
        max_commission_bps: 5_000,
        round_length: 10,
        snapshot_retention_rounds: 0,
    }
}

pub fn funded_reserve() -> NullReserve {
    NullReserve::with_balances([
        ("alice_stash", 10_000),
        ("bob_stash", 10_000),
        ("a", 10_000),
        ("b", 10_000),
        ("c", 10_000),
        ("d", 10_000),
        ("e", 10_000),
    ])
}

pub fn ledger_with(params: StakingParams) -> Ledger {
    dstake_utils::try_init_test_logging();
    StakingLedger::new(params, funded_reserve()).expect("valid params")
}

/// A ledger with candidate `alice` (stash `alice_stash`, Basic, bond 1000).
pub fn ledger_with_alice() -> Ledger {
    let mut ledger = ledger_with(params());
    ledger
        .join_candidates(&id("alice_stash"), &id("alice"), None, 1_000, HINT)
        .expect("join");
    ledger
}

/// Advance `rounds` rounds without selecting anyone.
pub fn advance(ledger: &mut Ledger, rounds: u32) {
    for _ in 0..rounds {
        let round = ledger.round();
        ledger
            .new_round(round.first_block + round.length, &[])
            .expect("new round");
    }
}

/// Ledger invariants plus conservation of reserved capital.
pub fn assert_books(ledger: &Ledger) {
    ledger.check_invariants().expect("ledger invariants");
    let bonds: Balance = ledger.candidates().map(|c| c.bond).sum();
    let nominators: Balance = ledger.nominators().map(|n| n.reserved()).sum();
    assert_eq!(
        ledger.reserve().total_reserved(),
        bonds + nominators,
        "reserved capital must match bonds plus nominator holdings"
    );
}

pub fn top_of(ledger: &Ledger, candidate: &str) -> Vec<(String, Balance)> {
    ledger
        .top_nominations(&id(candidate))
        .map(|list| {
            list.iter()
                .map(|b| (b.owner.to_string(), b.amount))
                .collect()
        })
        .unwrap_or_default()
}

pub fn bottom_of(ledger: &Ledger, candidate: &str) -> Vec<(String, Balance)> {
    ledger
        .bottom_nominations(&id(candidate))
        .map(|list| {
            list.iter()
                .map(|b| (b.owner.to_string(), b.amount))
                .collect()
        })
        .unwrap_or_default()
}

pub fn pairs(items: &[(&str, Balance)]) -> Vec<(String, Balance)> {
    items.iter().map(|(s, a)| (s.to_string(), *a)).collect()
}
