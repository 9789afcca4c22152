//! # Bolt Dispatch Benchmarks
//!
//! Cost of the hot paths through the contract VM on a two-chain relay.
//!
//! ```bash
//! cargo bench --package bolt-tests --bench dispatch_benchmarks
//! cargo bench --package bolt-tests --bench dispatch_benchmarks -- interchain
//! ```

use bolt_contracts::addresses;
use bolt_contracts::testing::account;
use bolt_tests::fixtures::{approve, chain_admin, full_id, ibtp, register_appchain, relay, two_chain_relay};
use bolt_vm::domain::entities::IbtpType;
use bolt_vm::domain::value_objects::Arg;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let Ok(mut chain) = two_chain_relay() else {
        return;
    };
    let caller = account(0);

    group.bench_function("query_service", |b| {
        b.iter(|| {
            black_box(chain.call(
                &caller,
                addresses::SERVICE_MANAGER,
                "GetServiceInfo",
                vec![Arg::string("chainA:svcA")],
            ))
        })
    });

    group.bench_function("query_proposals_by_type", |b| {
        b.iter(|| {
            black_box(chain.call(
                &caller,
                addresses::GOVERNANCE,
                "GetProposalsByTyp",
                vec![Arg::string("ServiceMgr")],
            ))
        })
    });

    group.bench_function("unknown_method", |b| {
        b.iter(|| black_box(chain.call(&caller, addresses::APPCHAIN_MANAGER, "NoSuchMethod", vec![])))
    });

    group.finish();
}

fn bench_interchain(c: &mut Criterion) {
    let mut group = c.benchmark_group("interchain");
    let Ok(mut chain) = two_chain_relay() else {
        return;
    };
    let (from, to) = (full_id("chainA", "svcA"), full_id("chainB", "svcB"));
    let caller = account(0);
    let mut index = 0u64;

    group.bench_function("handle_ibtp", |b| {
        b.iter(|| {
            index += 1;
            black_box(chain.handle_ibtp(&caller, &ibtp(&from, &to, index, IbtpType::Interchain)))
        })
    });

    group.bench_function("rejected_replay", |b| {
        b.iter(|| black_box(chain.handle_ibtp(&caller, &ibtp(&from, &to, 1, IbtpType::Interchain))))
    });

    group.finish();
}

fn bench_governance(c: &mut Criterion) {
    let mut group = c.benchmark_group("governance");

    group.bench_function("register_and_approve_appchain", |b| {
        b.iter_batched(
            relay,
            |mut chain| {
                let approved = register_appchain(&mut chain, "chainA", &chain_admin(1))
                    .and_then(|id| approve(&mut chain, &id));
                black_box(approved.is_ok())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    name = dispatch_benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(std::time::Duration::from_secs(5));
    targets = bench_dispatch, bench_interchain, bench_governance
);
criterion_main!(dispatch_benches);
