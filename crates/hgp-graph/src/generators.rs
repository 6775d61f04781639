//! Deterministic synthetic hypergraphs for tests and benchmarks.

use hgp_core::{ErrorInfo, HgpError, NodeId, RngHandle};
use rand::seq::index::sample;
use rand::Rng;

use crate::builder::HypergraphBuilder;
use crate::hypergraph::Hypergraph;

/// Uniform random hypergraph with unit node weights.
///
/// Every hyperedge has between two and `max_edge_size` distinct pins and a
/// weight in `1..=max_edge_weight`.
pub fn gen_random(
    num_nodes: usize,
    num_edges: usize,
    max_edge_size: usize,
    max_edge_weight: i64,
    k: u32,
    rng: &mut RngHandle,
) -> Result<Hypergraph, HgpError> {
    if num_nodes < 2 {
        return Err(HgpError::Precondition(
            ErrorInfo::new("too-few-nodes", "random generator requires two nodes")
                .with_context("num_nodes", num_nodes),
        ));
    }
    let max_edge_size = max_edge_size.clamp(2, num_nodes);
    let mut builder = HypergraphBuilder::with_unit_nodes(num_nodes);
    for _ in 0..num_edges {
        let size = rng.gen_range(2..=max_edge_size);
        let pins = sample_pins(num_nodes, size, rng);
        let weight = rng.gen_range(1..=max_edge_weight.max(1));
        builder.add_hyperedge(&pins, weight)?;
    }
    builder.build(k)
}

/// Hypergraph with `blocks` dense clusters joined by a few crossing edges.
///
/// Nodes `c * cluster_size .. (c + 1) * cluster_size` form cluster `c`.
/// Useful for checking that refinement recovers the planted structure.
pub fn gen_planted(
    blocks: usize,
    cluster_size: usize,
    edges_per_cluster: usize,
    crossing_edges: usize,
    k: u32,
    rng: &mut RngHandle,
) -> Result<Hypergraph, HgpError> {
    if blocks < 2 || cluster_size < 2 {
        return Err(HgpError::Precondition(
            ErrorInfo::new("degenerate-planting", "need two clusters of two nodes")
                .with_context("blocks", blocks)
                .with_context("cluster_size", cluster_size),
        ));
    }
    let mut builder = HypergraphBuilder::with_unit_nodes(blocks * cluster_size);
    for cluster in 0..blocks {
        let base = cluster * cluster_size;
        for _ in 0..edges_per_cluster {
            let size = rng.gen_range(2..=cluster_size.min(4));
            let pins: Vec<NodeId> = sample_pins(cluster_size, size, rng)
                .into_iter()
                .map(|pin| NodeId::from_raw((base + pin.index()) as u32))
                .collect();
            builder.add_hyperedge(&pins, 1)?;
        }
    }
    for _ in 0..crossing_edges {
        let first = rng.gen_range(0..blocks);
        let second = (first + rng.gen_range(1..blocks)) % blocks;
        let a = first * cluster_size + rng.gen_range(0..cluster_size);
        let b = second * cluster_size + rng.gen_range(0..cluster_size);
        builder.add_hyperedge(&[NodeId::from_raw(a as u32), NodeId::from_raw(b as u32)], 1)?;
    }
    builder.build(k)
}

fn sample_pins(range: usize, amount: usize, rng: &mut RngHandle) -> Vec<NodeId> {
    let mut pins: Vec<NodeId> = sample(rng.inner_mut(), range, amount)
        .into_iter()
        .map(|idx| NodeId::from_raw(idx as u32))
        .collect();
    pins.sort_unstable();
    pins
}
