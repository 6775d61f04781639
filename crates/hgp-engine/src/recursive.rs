//! Recursive bisection: block ranges, adaptive imbalance and the recursive
//! partitioning mode.

use std::ops::Range;

use hgp_config::{Context, Mode};
use hgp_core::{BlockId, HgpError, NodeId, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::Hypergraph;
use tracing::debug;

use crate::coarsening::CoarseningStatus;
use crate::community::Communities;
use crate::partitioner::Partitioner;

/// Split of the block range `lo..hi` into two halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSplit {
    /// Blocks that end up on side 0.
    pub left: Range<u32>,
    /// Blocks that end up on side 1.
    pub right: Range<u32>,
}

impl BlockSplit {
    /// Splits `blocks`, giving side 0 the larger half.
    pub fn new(blocks: Range<u32>) -> Self {
        let mid = blocks.start + (blocks.end - blocks.start + 1) / 2;
        Self {
            left: blocks.start..mid,
            right: mid..blocks.end,
        }
    }
}

/// Imbalance allowed for one bisection of a sub-hypergraph.
///
/// A sub-hypergraph of weight `sub_weight` that still has to be split into
/// blocks with caps summing to `cap_sum` can afford the slack
/// `(cap_sum / sub_weight)^(1 / ceil(log2 k_sub)) - 1` per level, so the
/// product over the remaining levels stays within the final caps.
pub fn adaptive_epsilon(cap_sum: NodeWeight, sub_weight: NodeWeight, k_sub: u32) -> f64 {
    if sub_weight <= 0 || k_sub < 2 {
        return 0.0;
    }
    let levels = (k_sub as f64).log2().ceil().max(1.0);
    let ratio = cap_sum as f64 / sub_weight as f64;
    (ratio.powf(1.0 / levels) - 1.0).max(0.0)
}

/// Caps of the two sides of `split` for a sub-hypergraph of `sub_weight`.
///
/// Each side targets a share of `sub_weight` proportional to the caps of
/// its final blocks and may exceed it by the adaptive epsilon, but never
/// the sum of those caps.
pub fn bisection_caps(final_caps: &[NodeWeight], split: &BlockSplit, sub_weight: NodeWeight) -> [NodeWeight; 2] {
    let sum = |range: &Range<u32>| -> NodeWeight {
        range.clone().map(|block| final_caps[block as usize]).sum()
    };
    let left = sum(&split.left);
    let right = sum(&split.right);
    let total = (left + right).max(1);
    let k_sub = split.right.end - split.left.start;
    let epsilon = adaptive_epsilon(left + right, sub_weight, k_sub);
    let cap = |share: NodeWeight| -> NodeWeight {
        let target = (sub_weight as f64 * share as f64 / total as f64).ceil();
        (((1.0 + epsilon) * target).floor() as NodeWeight).min(share)
    };
    [cap(left), cap(right)]
}

/// Partitions `hg` by recursive multilevel bisection.
///
/// Every bisection is a full multilevel run with `k = 2` on the extracted
/// sub-hypergraph. Community detection runs on the root bisection when
/// enabled and on deeper ones only with `enable_in_initial_partitioning`.
pub(crate) fn partition_recursive(
    ctx: &Context,
    hg: &mut Hypergraph,
    caps: &[NodeWeight],
    rng: &mut RngHandle,
    budget: &TimeBudget,
) -> Result<CoarseningStatus, HgpError> {
    let nodes: Vec<NodeId> = hg.nodes().collect();
    let mut bisector = Bisector {
        ctx,
        hg,
        caps,
        assignment: vec![BlockId::from_raw(0); hg.initial_num_nodes()],
        status: CoarseningStatus::Reached,
    };
    bisector.bisect(&nodes, 0..hg.k(), 0, rng, budget)?;
    let Bisector {
        assignment, status, ..
    } = bisector;
    hg.assign_all(&assignment)?;
    Ok(status)
}

struct Bisector<'a> {
    ctx: &'a Context,
    hg: &'a Hypergraph,
    caps: &'a [NodeWeight],
    assignment: Vec<BlockId>,
    status: CoarseningStatus,
}

impl Bisector<'_> {
    fn bisect(
        &mut self,
        nodes: &[NodeId],
        blocks: Range<u32>,
        depth: u32,
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Result<(), HgpError> {
        if blocks.end - blocks.start == 1 || nodes.is_empty() {
            for node in nodes {
                self.assignment[node.index()] = BlockId::from_raw(blocks.start);
            }
            return Ok(());
        }

        let ctx = self.ctx;
        let split = BlockSplit::new(blocks);
        let extracted = self.hg.extract_nodes(nodes, ctx.partition.objective, 2)?;
        let mut sub = extracted.hypergraph;
        let sub_caps = bisection_caps(self.caps, &split, sub.total_weight());

        let mut sub_ctx = ctx.clone();
        sub_ctx.partition.k = 2;
        sub_ctx.partition.mode = Mode::DirectKway;
        sub_ctx.partition.global_search_iterations = 1;
        sub_ctx.partition.max_part_weights = Some(sub_caps.to_vec());
        if depth > 0 && !ctx.preprocessing.community_detection.enable_in_initial_partitioning {
            sub_ctx.preprocessing.enable_community_detection = false;
        }
        debug!(
            depth,
            nodes = nodes.len(),
            left = ?split.left,
            right = ?split.right,
            caps = ?sub_caps,
            "bisection"
        );

        let mut communities: Option<Communities> = None;
        let status = Partitioner::new(&sub_ctx).multilevel(
            &mut sub,
            &sub_caps,
            &mut communities,
            rng,
            budget,
        )?;
        if status != CoarseningStatus::Reached {
            self.status = status;
        }

        let mut sides: [Vec<NodeId>; 2] = [Vec::new(), Vec::new()];
        for (sub_node, node) in extracted.mapping.iter().enumerate() {
            let side = sub
                .block(NodeId::from_raw(sub_node as u32))
                .map_or(0, |block| block.index().min(1));
            sides[side].push(*node);
        }
        let [left, right] = sides;
        self.bisect(&left, split.left, depth + 1, rng, budget)?;
        self.bisect(&right, split.right, depth + 1, rng, budget)
    }
}
