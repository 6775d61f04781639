use hgp_config::{CoarseningAlgorithm, CommunityDetectionParams, ContextBuilder};
use hgp_core::{BlockId, ErrorClass, NodeId, RngHandle, TimeBudget};
use hgp_engine::community::LabelEntry;
use hgp_engine::{Coarsener, CoarseningStatus, CommunityDetector, LabelSample};
use hgp_graph::{gen_planted, gen_random, Hypergraph, HypergraphBuilder};

fn node(raw: u32) -> NodeId {
    NodeId::from_raw(raw)
}

fn two_pairs() -> Hypergraph {
    let mut builder = HypergraphBuilder::with_unit_nodes(4);
    builder.add_hyperedge(&[node(0), node(1)], 1).unwrap();
    builder.add_hyperedge(&[node(2), node(3)], 1).unwrap();
    builder.build(2).unwrap()
}

#[test]
fn disjoint_pairs_form_two_communities() {
    let hg = two_pairs();
    let params = CommunityDetectionParams::default();
    let mut rng = RngHandle::from_seed(1);
    let communities = CommunityDetector::new(&params, None).detect(&hg, &mut rng);

    assert_eq!(communities.count(), 2);
    assert_eq!(communities.label(node(0)), communities.label(node(1)));
    assert_eq!(communities.label(node(2)), communities.label(node(3)));
    assert_ne!(communities.label(node(0)), communities.label(node(2)));
}

#[test]
fn partitioned_detection_keeps_communities_inside_blocks() {
    let mut hg = two_pairs();
    let b = BlockId::from_raw;
    hg.assign_all(&[b(0), b(1), b(0), b(1)]).unwrap();
    let params = CommunityDetectionParams::default();
    let mut rng = RngHandle::from_seed(1);
    let communities = CommunityDetector::new(&params, None).detect(&hg, &mut rng);

    assert_eq!(communities.count(), 4);
}

#[test]
fn oversized_edges_are_ignored() {
    let hg = two_pairs();
    let params = CommunityDetectionParams::default();
    let mut rng = RngHandle::from_seed(1);
    let communities = CommunityDetector::new(&params, Some(1)).detect(&hg, &mut rng);
    assert_eq!(communities.count(), 4);
}

#[test]
fn owned_samples_are_independent_after_clone() {
    let entries: Vec<LabelEntry> = (0..100).map(|label| (label, None)).collect();
    let mut rng = RngHandle::from_seed(4);
    let original = LabelSample::reservoir(&entries, 8, &mut rng);
    assert!(original.is_owned());
    assert_eq!(original.entries(&entries).len(), 8);

    let mut copy = original.clone();
    if let LabelSample::Owned(buffer) = &mut copy {
        buffer[0] = (999, None);
    }
    assert_ne!(original.entries(&entries)[0].0, 999);
    assert_eq!(copy.entries(&entries)[0].0, 999);
}

#[test]
fn inline_samples_view_the_incident_list() {
    let entries: Vec<LabelEntry> = vec![(3, None), (5, None)];
    assert_eq!(LabelSample::Inline.entries(&entries), &entries[..]);
    assert!(!LabelSample::Inline.is_owned());
}

#[test]
fn coarsening_reaches_the_limit_and_unwinds_exactly() {
    for name in CoarseningAlgorithm::VARIANTS {
        let algorithm: CoarseningAlgorithm = name.parse().unwrap();
        let mut rng = RngHandle::from_seed(12);
        let original = gen_random(200, 500, 4, 3, 2, &mut rng).unwrap();
        let ctx = ContextBuilder::new()
            .coarsening_algorithm(algorithm)
            .contraction_limit_multiplier(20)
            .build()
            .unwrap();
        let coarsener = Coarsener::new(&ctx, None, 2);
        assert_eq!(coarsener.contraction_limit(), 40);

        let mut hg = original.clone();
        let outcome = coarsener.coarsen(&mut hg, &mut rng, &TimeBudget::unlimited());
        let bound = coarsener.max_allowed_node_weight(&original);
        assert!(hg.nodes().all(|n| hg.node_weight(n) <= bound));
        if outcome.status == CoarseningStatus::Reached {
            assert!(hg.current_num_nodes() <= 40);
        }
        assert_eq!(hg.total_weight(), original.total_weight());

        let mut history = outcome.history;
        while let Some(memento) = history.pop() {
            hg.uncontract(&memento).unwrap();
        }
        assert_eq!(hg, original);
    }
}

#[test]
fn coarsening_respects_communities() {
    let mut rng = RngHandle::from_seed(6);
    let mut hg = gen_planted(3, 30, 80, 10, 3, &mut rng).unwrap();
    let ctx = ContextBuilder::new()
        .k(3)
        .contraction_limit_multiplier(2)
        .build()
        .unwrap();
    let communities =
        CommunityDetector::new(&ctx.preprocessing.community_detection, None).detect(&hg, &mut rng);
    let outcome =
        Coarsener::new(&ctx, Some(&communities), 3).coarsen(&mut hg, &mut rng, &TimeBudget::unlimited());

    for memento in outcome.history.iter() {
        assert_eq!(communities.label(memento.u), communities.label(memento.v));
    }
}

#[test]
fn partitioned_coarsening_stays_inside_blocks() {
    let mut rng = RngHandle::from_seed(9);
    let mut hg = gen_random(120, 300, 4, 2, 2, &mut rng).unwrap();
    let blocks: Vec<BlockId> = (0..120).map(|n| BlockId::from_raw(n % 2)).collect();
    hg.assign_all(&blocks).unwrap();
    let ctx = ContextBuilder::new()
        .community_detection(false)
        .contraction_limit_multiplier(10)
        .build()
        .unwrap();
    let outcome = Coarsener::new(&ctx, None, 2).coarsen(&mut hg, &mut rng, &TimeBudget::unlimited());

    for memento in outcome.history.iter() {
        assert_eq!(blocks[memento.u.index()], blocks[memento.v.index()]);
    }
    assert_eq!(hg.block_weight(BlockId::from_raw(0)), 60);
}

#[test]
fn stalled_coarsening_converts_to_an_exhaustion_error() {
    // No hyperedges means no rated pair.
    let mut hg = HypergraphBuilder::with_unit_nodes(10).build(2).unwrap();
    let ctx = ContextBuilder::new()
        .contraction_limit_multiplier(1)
        .build()
        .unwrap();
    let mut rng = RngHandle::from_seed(1);
    let outcome = Coarsener::new(&ctx, None, 2).coarsen(&mut hg, &mut rng, &TimeBudget::unlimited());
    assert_eq!(outcome.status, CoarseningStatus::Stalled);
    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.class(), ErrorClass::AlgorithmicExhaustion);
    assert_eq!(err.code(), "no-eligible-pair");
}
