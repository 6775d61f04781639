use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hgp_core::{NodeId, RngHandle};
use hgp_graph::gen_random;

fn contraction_bench(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(42);
    let base = gen_random(5_000, 10_000, 8, 4, 2, &mut rng).unwrap();
    c.bench_function("contract_uncontract_pairs_5k", |b| {
        b.iter(|| {
            let mut hg = base.clone();
            let mut history = Vec::new();
            for raw in (0..4_998u32).step_by(2) {
                history.push(hg.contract(NodeId::from_raw(raw), NodeId::from_raw(raw + 1)).unwrap());
            }
            while let Some(memento) = history.pop() {
                hg.uncontract(&memento).unwrap();
            }
            black_box(hg);
        });
    });
}

criterion_group!(benches, contraction_bench);
criterion_main!(benches);
