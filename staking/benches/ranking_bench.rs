use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dstake_nullables::NullReserve;
use dstake_staking::StakingLedger;
use dstake_types::{AccountId, Balance, StakingParams, UNIT};

const FUNDS: Balance = 1_000_000 * UNIT;

fn params(max_top: u32, max_bottom: u32) -> StakingParams {
    StakingParams {
        max_top_nominations_per_candidate: max_top,
        max_bottom_nominations_per_candidate: max_bottom,
        min_nomination: 1,
        min_nominator_stake: 1,
        ..StakingParams::default()
    }
}

/// A candidate whose Top and Bottom lists are both full.
fn saturated_ledger(max_top: u32, max_bottom: u32) -> (StakingLedger<NullReserve>, u32) {
    let capacity = max_top + max_bottom;
    let mut reserve = NullReserve::new();
    reserve.deposit(&AccountId::from("stash"), FUNDS);
    for i in 0..capacity * 2 {
        reserve.deposit(&AccountId::from(format!("n{i}").as_str()), FUNDS);
    }
    let mut ledger = StakingLedger::new(params(max_top, max_bottom), reserve).unwrap();
    let candidate = AccountId::from("cand");
    let bond = ledger.params().min_basic_candidate_stake;
    ledger
        .join_candidates(&AccountId::from("stash"), &candidate, None, bond, 0)
        .unwrap();
    for i in 0..capacity {
        let who = AccountId::from(format!("n{i}").as_str());
        ledger
            .nominate(&who, &candidate, 1_000 + i as u128, u32::MAX, u32::MAX)
            .unwrap();
    }
    (ledger, capacity)
}

fn bench_nominate_saturated(c: &mut Criterion) {
    let mut group = c.benchmark_group("nominate_saturated");

    for (max_top, max_bottom) in [(10, 5), (100, 50), (300, 100)] {
        let capacity = max_top + max_bottom;
        group.bench_with_input(
            BenchmarkId::new("evicting", capacity),
            &(max_top, max_bottom),
            |b, &(top, bottom)| {
                b.iter_batched(
                    || saturated_ledger(top, bottom),
                    |(mut ledger, capacity)| {
                        let who = AccountId::from(format!("n{capacity}").as_str());
                        black_box(
                            ledger
                                .nominate(&who, &AccountId::from("cand"), 1_000_000, u32::MAX, u32::MAX)
                                .unwrap(),
                        );
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_decrease_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrease_swap");

    for (max_top, max_bottom) in [(10, 5), (100, 50), (300, 100)] {
        let capacity = max_top + max_bottom;
        group.bench_with_input(
            BenchmarkId::new("schedule_bond_less", capacity),
            &(max_top, max_bottom),
            |b, &(top, bottom)| {
                b.iter_batched(
                    || saturated_ledger(top, bottom),
                    |(mut ledger, capacity)| {
                        // The largest nomination drops below Bottom's maximum.
                        let who = AccountId::from(format!("n{}", capacity - 1).as_str());
                        black_box(
                            ledger
                                .schedule_nominator_bond_less(
                                    &who,
                                    &AccountId::from("cand"),
                                    capacity as u128 + 1,
                                )
                                .unwrap(),
                        );
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_nominate_saturated, bench_decrease_swap);
criterion_main!(benches);
