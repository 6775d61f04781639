//! Objective and balance measures of the current block assignment.

use hgp_config::{Context, Objective};
use hgp_core::{BlockId, EdgeWeight, NodeWeight};

use crate::hypergraph::Hypergraph;

/// Total weight of hyperedges whose pins span more than one block.
pub fn cut(hg: &Hypergraph) -> EdgeWeight {
    hg.edges()
        .filter(|edge| hg.connectivity(*edge) > 1)
        .map(|edge| hg.edge_weight(edge))
        .sum()
}

/// Sum of `w(e) * (connectivity(e) - 1)` over all hyperedges.
pub fn km1(hg: &Hypergraph) -> EdgeWeight {
    hg.edges()
        .filter(|edge| hg.connectivity(*edge) > 1)
        .map(|edge| hg.edge_weight(edge) * (hg.connectivity(edge) as EdgeWeight - 1))
        .sum()
}

/// Value of the requested objective.
pub fn objective(hg: &Hypergraph, objective: Objective) -> EdgeWeight {
    match objective {
        Objective::Cut => cut(hg),
        Objective::Km1 => km1(hg),
    }
}

/// Relative deviation of the heaviest block from the average block weight.
///
/// Equals `2 * max / total - 1` for bipartitions and is zero exactly when
/// all blocks weigh the same.
pub fn imbalance(hg: &Hypergraph) -> f64 {
    let total = hg.total_weight();
    if total == 0 {
        return 0.0;
    }
    let heaviest = hg.block_weights().iter().copied().max().unwrap_or(0);
    let average = total as f64 / hg.k() as f64;
    heaviest as f64 / average - 1.0
}

/// Largest amount by which any block exceeds its cap, zero when none does.
pub fn max_cap_excess(hg: &Hypergraph, caps: &[NodeWeight]) -> NodeWeight {
    hg.block_weights()
        .iter()
        .zip(caps)
        .map(|(weight, cap)| (weight - cap).max(0))
        .max()
        .unwrap_or(0)
}

/// Whether every block respects its cap.
pub fn is_balanced(hg: &Hypergraph, caps: &[NodeWeight]) -> bool {
    max_cap_excess(hg, caps) == 0
}

/// Per-block caps of `ctx` for the total weight of `hg`.
pub fn block_weight_caps(ctx: &Context, hg: &Hypergraph) -> Vec<NodeWeight> {
    ctx.block_weight_caps(hg.total_weight())
}

/// Heaviest block, lowest id first on ties.
pub fn heaviest_block(hg: &Hypergraph) -> BlockId {
    let mut best = 0;
    for (block, weight) in hg.block_weights().iter().enumerate() {
        if *weight > hg.block_weights()[best] {
            best = block;
        }
    }
    BlockId::from_raw(best as u32)
}
