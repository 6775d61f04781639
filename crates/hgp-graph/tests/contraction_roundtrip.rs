use hgp_core::{BlockId, HgpError, NodeId, RngHandle};
use hgp_graph::{gen_random, HypergraphBuilder};
use proptest::prelude::*;
use rand::Rng;

fn node(raw: u32) -> NodeId {
    NodeId::from_raw(raw)
}

#[test]
fn parallel_pins_are_removed_and_restored() {
    let mut builder = HypergraphBuilder::with_unit_nodes(4);
    builder.add_hyperedge(&[node(0), node(1), node(2)], 3).unwrap();
    builder.add_hyperedge(&[node(1), node(3)], 1).unwrap();
    let mut hg = builder.build(2).unwrap();
    let before = hg.clone();

    let memento = hg.contract(node(0), node(1)).unwrap();
    assert_eq!(hg.node_weight(node(0)), 2);
    assert_eq!(hg.current_num_nodes(), 3);
    assert!(!hg.is_active(node(1)));
    let first = hgp_core::EdgeId::from_raw(0);
    let second = hgp_core::EdgeId::from_raw(1);
    assert_eq!(hg.edge_size(first), 2);
    assert_eq!(hg.pins(second), &[node(0), node(3)]);
    assert_eq!(memento.removed_pins().len(), 1);
    assert_eq!(memento.retargeted_pins().len(), 1);

    hg.uncontract(&memento).unwrap();
    assert_eq!(hg, before);
}

#[test]
fn uncontraction_places_node_in_representative_block() {
    let mut builder = HypergraphBuilder::with_unit_nodes(3);
    builder.add_hyperedge(&[node(0), node(1), node(2)], 5).unwrap();
    let mut hg = builder.build(2).unwrap();
    hg.set_block(node(0), BlockId::from_raw(0)).unwrap();
    hg.set_block(node(1), BlockId::from_raw(0)).unwrap();
    hg.set_block(node(2), BlockId::from_raw(1)).unwrap();

    let memento = hg.contract(node(0), node(1)).unwrap();
    assert_eq!(hg.block_weight(BlockId::from_raw(0)), 2);
    hg.set_block(node(0), BlockId::from_raw(1)).unwrap();
    assert_eq!(hg.connectivity(hgp_core::EdgeId::from_raw(0)), 1);

    hg.uncontract(&memento).unwrap();
    assert_eq!(hg.block(node(1)), Some(BlockId::from_raw(1)));
    assert_eq!(hg.block_weight(BlockId::from_raw(1)), 3);
    assert_eq!(hg.block_weight(BlockId::from_raw(0)), 0);
    assert_eq!(hg.pin_count_in_block(hgp_core::EdgeId::from_raw(0), BlockId::from_raw(1)), 3);
}

#[test]
fn out_of_order_uncontraction_is_a_history_violation() {
    let mut builder = HypergraphBuilder::with_unit_nodes(4);
    builder.add_hyperedge(&[node(0), node(1)], 1).unwrap();
    builder.add_hyperedge(&[node(2), node(3)], 1).unwrap();
    let mut hg = builder.build(2).unwrap();

    let first = hg.contract(node(0), node(1)).unwrap();
    let second = hg.contract(node(2), node(3)).unwrap();
    let err = hg.uncontract(&first).unwrap_err();
    assert!(matches!(err, HgpError::HistoryViolation(_)));
    assert_eq!(err.code(), "out-of-order-uncontraction");

    hg.uncontract(&second).unwrap();
    hg.uncontract(&first).unwrap();
    let err = hg.uncontract(&first).unwrap_err();
    assert!(matches!(err, HgpError::HistoryViolation(_)));
}

#[test]
fn contracting_inactive_nodes_is_rejected() {
    let mut hg = HypergraphBuilder::with_unit_nodes(3).build(2).unwrap();
    hg.contract(node(0), node(1)).unwrap();
    let err = hg.contract(node(2), node(1)).unwrap_err();
    assert!(matches!(err, HgpError::InvalidOperation(_)));
    let err = hg.contract(node(2), node(2)).unwrap_err();
    assert!(matches!(err, HgpError::InvalidOperation(_)));
}

#[test]
fn contracted_state_survives_json() {
    let mut builder = HypergraphBuilder::with_unit_nodes(5);
    builder.add_hyperedge(&[node(0), node(1), node(2)], 2).unwrap();
    builder.add_hyperedge(&[node(1), node(3), node(4)], 1).unwrap();
    let mut hg = builder.build(2).unwrap();
    hg.assign_all(&[BlockId::from_raw(0); 5]).unwrap();
    let original = hg.clone();
    let memento = hg.contract(node(1), node(3)).unwrap();

    let hg_json = serde_json::to_string(&hg).unwrap();
    let memento_json = serde_json::to_string(&memento).unwrap();
    let mut restored: hgp_graph::Hypergraph = serde_json::from_str(&hg_json).unwrap();
    let restored_memento: hgp_graph::Memento = serde_json::from_str(&memento_json).unwrap();
    assert_eq!(restored, hg);
    assert_eq!(restored_memento, memento);

    restored.uncontract(&restored_memento).unwrap();
    assert_eq!(restored, original);
}

proptest! {
    #[test]
    fn random_contraction_sequences_unwind_exactly(seed in any::<u64>(), steps in 1usize..12, partitioned in any::<bool>()) {
        let mut rng = RngHandle::from_seed(seed);
        let mut hg = gen_random(16, 24, 5, 3, 3, &mut rng).unwrap();
        if partitioned {
            for raw in 0..16u32 {
                let block = BlockId::from_raw(rng.gen_range(0..3));
                hg.set_block(node(raw), block).unwrap();
            }
        }
        let original = hg.clone();

        let mut stack = Vec::new();
        for _ in 0..steps {
            let active: Vec<NodeId> = hg.nodes().collect();
            let u = active[rng.gen_range(0..active.len())];
            let v = active[rng.gen_range(0..active.len())];
            if u == v {
                continue;
            }
            if partitioned && hg.block(u) != hg.block(v) {
                continue;
            }
            let snapshot = hg.clone();
            let memento = hg.contract(u, v).unwrap();
            prop_assert_eq!(hg.total_weight(), original.total_weight());
            for edge in hg.edges() {
                let pins = hg.pins(edge);
                prop_assert!(pins.iter().all(|pin| hg.is_active(*pin)));
                let mut sorted = pins.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), pins.len());
            }
            stack.push((memento, snapshot));
        }
        while let Some((memento, snapshot)) = stack.pop() {
            hg.uncontract(&memento).unwrap();
            prop_assert_eq!(&hg, &snapshot);
        }
        prop_assert_eq!(hg, original);
    }
}
