use hgp_config::{
    CoarseningAlgorithm, Context, ContextBuilder, Mode, Objective, RefinementAlgorithm,
};
use hgp_core::{NodeId, RngHandle};
use hgp_engine::{CoarseningStatus, PartitionResult, Partitioner};
use hgp_graph::{gen_planted, gen_random, metrics, Hypergraph, HypergraphBuilder};
use proptest::prelude::*;

fn run(ctx: &Context, hg: &mut Hypergraph) -> PartitionResult {
    let mut rng = RngHandle::from_seed(ctx.partition.seed);
    Partitioner::new(ctx).partition(hg, &mut rng).unwrap()
}

fn assert_valid(ctx: &Context, hg: &Hypergraph, result: &PartitionResult) {
    let k = ctx.partition.k;
    assert_eq!(result.blocks.len(), hg.initial_num_nodes());
    assert!(result.blocks.iter().all(|block| block.as_raw() < k));
    assert_eq!(result.block_weights.iter().sum::<i64>(), hg.total_weight());
    let caps = metrics::block_weight_caps(ctx, hg);
    for (weight, cap) in result.block_weights.iter().zip(&caps) {
        assert!(weight <= cap, "block weight {weight} exceeds cap {cap}");
    }
    assert_eq!(result.objective, metrics::objective(hg, ctx.partition.objective));
}

#[test]
fn planted_clusters_are_recovered() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut rng = RngHandle::from_seed(5);
    let mut hg = gen_planted(4, 25, 60, 6, 4, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .k(4)
        .epsilon(0.05)
        .seed(9)
        .contraction_limit_multiplier(10)
        .build()
        .unwrap();
    let result = run(&ctx, &mut hg);
    assert_valid(&ctx, &hg, &result);
    assert!(result.km1 <= 20, "km1 {} far above the planted crossing weight", result.km1);
}

#[test]
fn equal_seeds_give_equal_partitions() {
    let mut rng = RngHandle::from_seed(17);
    let base = gen_random(300, 600, 6, 3, 3, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .k(3)
        .seed(123)
        .contraction_limit_multiplier(20)
        .global_search_iterations(2)
        .build()
        .unwrap();

    let mut first = base.clone();
    let mut second = base.clone();
    let a = run(&ctx, &mut first);
    let b = run(&ctx, &mut second);
    assert_eq!(a, b);
    assert_valid(&ctx, &first, &a);
}

#[test]
fn recursive_mode_produces_a_valid_kway_partition() {
    let mut rng = RngHandle::from_seed(21);
    let mut hg = gen_random(200, 400, 5, 2, 5, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .k(5)
        .epsilon(0.1)
        .mode(Mode::Recursive)
        .contraction_limit_multiplier(15)
        .build()
        .unwrap();
    let result = run(&ctx, &mut hg);
    assert_valid(&ctx, &hg, &result);
}

#[test]
fn vcycles_never_regress() {
    let mut rng = RngHandle::from_seed(33);
    let base = gen_random(250, 500, 5, 3, 2, &mut rng).unwrap();
    let single = ContextBuilder::new()
        .seed(4)
        .contraction_limit_multiplier(20)
        .build()
        .unwrap();
    let cycles = ContextBuilder::from_context(single.clone())
        .global_search_iterations(4)
        .build()
        .unwrap();

    let mut one = base.clone();
    let mut many = base.clone();
    let first = run(&single, &mut one);
    let repeated = run(&cycles, &mut many);
    assert!(repeated.objective <= first.objective);
    assert!(repeated.accepted_vcycles <= 3);
    assert_valid(&cycles, &many, &repeated);
}

#[test]
fn every_coarsening_driver_yields_a_valid_partition() {
    for name in CoarseningAlgorithm::VARIANTS {
        let algorithm: CoarseningAlgorithm = name.parse().unwrap();
        let mut rng = RngHandle::from_seed(8);
        let mut hg = gen_random(180, 360, 4, 2, 3, &mut rng).unwrap();
        let ctx = ContextBuilder::new()
            .k(3)
            .epsilon(0.05)
            .coarsening_algorithm(algorithm)
            .contraction_limit_multiplier(12)
            .objective(Objective::Cut)
            .build()
            .unwrap();
        let result = run(&ctx, &mut hg);
        assert_valid(&ctx, &hg, &result);
    }
}

#[test]
fn custom_caps_are_respected() {
    let mut rng = RngHandle::from_seed(2);
    let mut hg = gen_random(120, 240, 4, 2, 2, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .max_part_weights(vec![80, 60])
        .refinement(RefinementAlgorithm::TwowayFm)
        .contraction_limit_multiplier(20)
        .build()
        .unwrap();
    let result = run(&ctx, &mut hg);
    assert!(result.block_weights[0] <= 80);
    assert!(result.block_weights[1] <= 60);
}

#[test]
fn result_serialises_to_json() {
    let mut rng = RngHandle::from_seed(1);
    let mut hg = gen_random(40, 60, 4, 2, 2, &mut rng).unwrap();
    let ctx = Context::default();
    let result = run(&ctx, &mut hg);
    let json = serde_json::to_string(&result).unwrap();
    let back: PartitionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.blocks, result.blocks);
    assert_eq!(back.objective, result.objective);
}

#[test]
fn k_mismatch_is_a_precondition_error() {
    let mut rng = RngHandle::from_seed(1);
    let mut hg = gen_random(20, 30, 3, 1, 3, &mut rng).unwrap();
    let ctx = Context::default();
    let err = Partitioner::new(&ctx).partition(&mut hg, &mut rng).unwrap_err();
    assert_eq!(err.code(), "k-mismatch");
}

#[test]
fn failed_initial_partitioning_undoes_the_coarsening() {
    // Node 4 alone outweighs the cap of either block.
    let mut builder = HypergraphBuilder::new();
    for node in 0..10 {
        builder.add_node(if node == 4 { 11 } else { 1 }).unwrap();
    }
    for node in 0..9u32 {
        builder
            .add_hyperedge(&[NodeId::from_raw(node), NodeId::from_raw(node + 1)], 1)
            .unwrap();
    }
    let mut hg = builder.build(2).unwrap();
    let original = hg.clone();
    let ctx = ContextBuilder::new()
        .epsilon(0.0)
        .contraction_limit_multiplier(1)
        .build()
        .unwrap();

    let mut rng = RngHandle::from_seed(3);
    let err = Partitioner::new(&ctx).partition(&mut hg, &mut rng).unwrap_err();

    assert_eq!(err.code(), "no-feasible-attempt");
    assert_eq!(hg.current_num_nodes(), 10);
    assert_eq!(hg.num_contractions(), 0);
    assert!(!hg.is_partitioned());
    assert_eq!(hg, original);
}

#[test]
fn exhausted_time_budget_still_returns_a_full_partition() {
    let mut rng = RngHandle::from_seed(40);
    let mut hg = gen_random(3_000, 6_000, 5, 3, 4, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .k(4)
        .epsilon(0.05)
        .nruns(1)
        .time_limit_secs(1e-6)
        .global_search_iterations(3)
        .build()
        .unwrap();

    let result = run(&ctx, &mut hg);

    assert_eq!(result.coarsening, CoarseningStatus::TimeLimit);
    assert_eq!(result.accepted_vcycles, 0);
    assert_eq!(hg.num_contractions(), 0);
    assert_eq!(hg.current_num_nodes(), hg.initial_num_nodes());
    assert!(hg.is_partitioned());
    assert!(hg.all_blocks_used());
    assert_valid(&ctx, &hg, &result);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn partitions_respect_caps_and_cover_all_weight(
        seed in 0u64..500,
        k in 2u32..5,
        nodes in 40usize..120,
    ) {
        let mut rng = RngHandle::from_seed(seed);
        let mut hg = gen_random(nodes, nodes * 2, 5, 3, k, &mut rng).unwrap();
        let ctx = ContextBuilder::new()
            .k(k)
            .epsilon(0.1)
            .seed(seed)
            .contraction_limit_multiplier(8)
            .build()
            .unwrap();
        let result = run(&ctx, &mut hg);
        prop_assert!(result.blocks.iter().all(|block| block.as_raw() < k));
        prop_assert_eq!(result.block_weights.iter().sum::<i64>(), hg.total_weight());
        let caps = metrics::block_weight_caps(&ctx, &hg);
        prop_assert!(metrics::is_balanced(&hg, &caps));
        prop_assert!(hg.all_blocks_used());
    }
}
