use hgp_config::ContextBuilder;
use hgp_core::{ErrorClass, NodeId, RngHandle, TimeBudget};
use hgp_engine::recursive::{adaptive_epsilon, bisection_caps, BlockSplit};
use hgp_engine::refinement::GainBuckets;
use hgp_engine::InitialPartitioner;
use hgp_graph::{gen_random, metrics};

#[test]
fn block_split_gives_the_larger_half_to_side_zero() {
    let split = BlockSplit::new(0..5);
    assert_eq!(split.left, 0..3);
    assert_eq!(split.right, 3..5);
    let split = BlockSplit::new(4..6);
    assert_eq!(split.left, 4..5);
    assert_eq!(split.right, 5..6);
}

#[test]
fn adaptive_epsilon_spreads_slack_over_levels() {
    assert!((adaptive_epsilon(110, 100, 2) - 0.1).abs() < 1e-9);
    let four = adaptive_epsilon(110, 100, 4);
    assert!((four - (1.1f64.sqrt() - 1.0)).abs() < 1e-9);
    assert_eq!(adaptive_epsilon(90, 100, 2), 0.0);
    assert_eq!(adaptive_epsilon(10, 0, 2), 0.0);
}

#[test]
fn bisection_caps_never_exceed_the_final_caps() {
    let split = BlockSplit::new(0..2);
    assert_eq!(bisection_caps(&[55, 55], &split, 100), [55, 55]);

    let split = BlockSplit::new(0..3);
    let caps = bisection_caps(&[40, 40, 40], &split, 100);
    assert!(caps[0] <= 80);
    assert!(caps[1] <= 40);
    assert!(caps[0] + caps[1] >= 100);
}

#[test]
fn gain_buckets_pop_the_highest_gain_first() {
    let b = hgp_core::BlockId::from_raw;
    let mut buckets = GainBuckets::new(5, 3);
    buckets.upsert(NodeId::from_raw(0), 1, b(1));
    buckets.upsert(NodeId::from_raw(1), -2, b(0));
    buckets.upsert(NodeId::from_raw(2), 7, b(1));
    buckets.upsert(NodeId::from_raw(3), 5, b(0));
    assert_eq!(buckets.len(), 4);

    buckets.upsert(NodeId::from_raw(0), 2, b(0));
    assert_eq!(buckets.get(NodeId::from_raw(0)), Some((2, b(0))));
    buckets.remove(NodeId::from_raw(1));
    assert!(!buckets.contains(NodeId::from_raw(1)));

    let order: Vec<_> = std::iter::from_fn(|| buckets.pop_max()).map(|(node, gain, _)| (node.as_raw(), gain)).collect();
    assert_eq!(order, vec![(2, 7), (3, 5), (0, 2)]);
    assert!(buckets.is_empty());
}

#[test]
fn direct_initial_partitioning_runs_every_pool_attempt() {
    let mut rng = RngHandle::from_seed(14);
    let mut hg = gen_random(90, 180, 4, 2, 3, &mut rng).unwrap();
    let mut builder = ContextBuilder::new().k(3).epsilon(0.1).nruns(2);
    builder.set("initial_partitioning.mode", "direct").unwrap();
    let ctx = builder.build().unwrap();
    let caps = metrics::block_weight_caps(&ctx, &hg);

    let summary = InitialPartitioner::new(&ctx)
        .partition(&mut hg, &caps, &mut rng, &TimeBudget::unlimited())
        .unwrap();

    assert_eq!(summary.attempts, 6);
    assert!(summary.feasible >= 1);
    assert!(hg.is_partitioned());
    assert!(metrics::is_balanced(&hg, &caps));
    assert_eq!(summary.objective, metrics::objective(&hg, ctx.partition.objective));
}

#[test]
fn recursive_initial_partitioning_is_balanced() {
    let mut rng = RngHandle::from_seed(15);
    let mut hg = gen_random(100, 200, 4, 2, 4, &mut rng).unwrap();
    let ctx = ContextBuilder::new().k(4).epsilon(0.1).nruns(3).build().unwrap();
    let caps = metrics::block_weight_caps(&ctx, &hg);

    InitialPartitioner::new(&ctx)
        .partition(&mut hg, &caps, &mut rng, &TimeBudget::unlimited())
        .unwrap();

    assert!(metrics::is_balanced(&hg, &caps));
}

#[test]
fn impossible_caps_report_no_feasible_partition() {
    let mut rng = RngHandle::from_seed(16);
    let mut hg = gen_random(20, 30, 3, 1, 2, &mut rng).unwrap();
    let mut builder = ContextBuilder::new().nruns(1);
    builder.set("initial_partitioning.mode", "direct").unwrap();
    let ctx = builder.build().unwrap();
    let caps = vec![5, 5];

    let err = InitialPartitioner::new(&ctx)
        .partition(&mut hg, &caps, &mut rng, &TimeBudget::unlimited())
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::AlgorithmicExhaustion);
    assert_eq!(err.code(), "no-feasible-attempt");
    assert!(!hg.is_partitioned());
}
