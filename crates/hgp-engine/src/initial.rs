//! Initial partitioning of the coarsest hypergraph.

use std::collections::{BTreeMap, VecDeque};

use hgp_config::{Context, InitialPartitioningAlgorithm, Mode, Objective};
use hgp_core::{
    derive_substream_seed, BlockId, EdgeWeight, ErrorInfo, HgpError, NodeId, NodeWeight,
    RngHandle, TimeBudget,
};
use hgp_graph::{metrics, Hypergraph};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::recursive::{bisection_caps, BlockSplit};
use crate::refinement::{move_gain, place, LocalSearch};

/// Summary of the attempts behind an initial partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialSummary {
    /// Attempts run.
    pub attempts: usize,
    /// Attempts that respected the caps.
    pub feasible: usize,
    /// Objective of the selected attempt.
    pub objective: EdgeWeight,
    /// Imbalance of the selected attempt.
    pub imbalance: f64,
}

/// Runs independent attempts on the coarsest hypergraph and keeps the best.
///
/// Each attempt draws its own generator from
/// [`derive_substream_seed`] so attempts do not depend on each other's
/// consumption of randomness. Attempts that break a cap or leave a block
/// empty are discarded; the winner minimises `(objective, imbalance, attempt index)`.
#[derive(Debug, Clone, Copy)]
pub struct InitialPartitioner<'a> {
    ctx: &'a Context,
}

impl<'a> InitialPartitioner<'a> {
    /// Creates an initial partitioner.
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Partitions the active nodes of `hg` into `hg.k()` blocks within `caps`.
    pub fn partition(
        &self,
        hg: &mut Hypergraph,
        caps: &[NodeWeight],
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Result<InitialSummary, HgpError> {
        let summary = match self.ctx.initial_partitioning.mode {
            Mode::DirectKway => self.best_of_attempts(hg, caps, rng, budget)?,
            Mode::Recursive => match self.recursive(hg, caps, rng, budget) {
                Ok(summary) => summary,
                Err(err) => {
                    debug!(error = %err, "recursive initial partitioning failed, trying direct attempts");
                    self.best_of_attempts(hg, caps, rng, budget)?
                }
            },
        };
        info!(
            attempts = summary.attempts,
            feasible = summary.feasible,
            objective = summary.objective,
            imbalance = summary.imbalance,
            "initial partition"
        );
        Ok(summary)
    }

    fn algorithms(&self) -> Vec<InitialPartitioningAlgorithm> {
        match self.ctx.initial_partitioning.algorithm {
            InitialPartitioningAlgorithm::Pool => vec![
                InitialPartitioningAlgorithm::Random,
                InitialPartitioningAlgorithm::Bfs,
                InitialPartitioningAlgorithm::GreedyGrowing,
            ],
            algorithm => vec![algorithm],
        }
    }

    fn best_of_attempts(
        &self,
        hg: &mut Hypergraph,
        caps: &[NodeWeight],
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Result<InitialSummary, HgpError> {
        let objective = self.ctx.partition.objective;
        let base_seed = rng.next_u64();
        let mut polish = LocalSearch::fm_only(self.ctx, hg.k());
        let mut best: Option<(EdgeWeight, f64, Vec<BlockId>)> = None;
        let mut attempts = 0usize;
        let mut feasible = 0usize;

        for algorithm in self.algorithms() {
            for _ in 0..self.ctx.initial_partitioning.nruns {
                let mut attempt_rng =
                    RngHandle::from_seed(derive_substream_seed(base_seed, attempts as u64));
                attempts += 1;
                hg.reset_blocks();
                match algorithm {
                    InitialPartitioningAlgorithm::Random => random_attempt(hg, caps, &mut attempt_rng),
                    InitialPartitioningAlgorithm::Bfs => bfs_attempt(hg, caps, &mut attempt_rng),
                    InitialPartitioningAlgorithm::GreedyGrowing | InitialPartitioningAlgorithm::Pool => {
                        greedy_attempt(hg, caps, &mut attempt_rng)
                    }
                }
                fill_empty_blocks(hg, caps, objective);
                if self.ctx.initial_partitioning.refine_attempts {
                    polish.refine_level(hg, &[], caps, false, &mut attempt_rng, budget);
                }
                if !metrics::is_balanced(hg, caps) || !hg.all_blocks_used() {
                    debug!(attempt = attempts - 1, %algorithm, "discarding infeasible attempt");
                    continue;
                }
                feasible += 1;
                let value = metrics::objective(hg, objective);
                let imbalance = metrics::imbalance(hg);
                let better = match &best {
                    None => true,
                    Some((best_value, best_imbalance, _)) => {
                        value < *best_value || (value == *best_value && imbalance < *best_imbalance)
                    }
                };
                if better {
                    best = Some((value, imbalance, snapshot(hg)));
                }
            }
        }

        let Some((value, imbalance, blocks)) = best else {
            hg.reset_blocks();
            return Err(HgpError::NoFeasiblePartition(
                ErrorInfo::new(
                    "no-feasible-attempt",
                    "every initial partitioning attempt violated a block cap or left a block empty",
                )
                .with_context("attempts", attempts)
                .with_context("k", hg.k())
                .with_hint("raise epsilon or the block caps"),
            ));
        };
        hg.assign_all(&blocks)?;
        Ok(InitialSummary {
            attempts,
            feasible,
            objective: value,
            imbalance,
        })
    }

    fn recursive(
        &self,
        hg: &mut Hypergraph,
        caps: &[NodeWeight],
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Result<InitialSummary, HgpError> {
        let mut assignment = vec![BlockId::from_raw(0); hg.initial_num_nodes()];
        let mut totals = (0usize, 0usize);
        let nodes: Vec<NodeId> = hg.nodes().collect();
        let mut pending = vec![(nodes, 0..hg.k())];
        while let Some((nodes, blocks)) = pending.pop() {
            if blocks.end - blocks.start == 1 || nodes.is_empty() {
                for node in &nodes {
                    assignment[node.index()] = BlockId::from_raw(blocks.start);
                }
                continue;
            }
            let split = BlockSplit::new(blocks);
            let extracted = hg.extract_nodes(&nodes, self.ctx.partition.objective, 2)?;
            let mut sub = extracted.hypergraph;
            let sub_caps = bisection_caps(caps, &split, sub.total_weight());
            let mut sub_ctx = self.ctx.clone();
            sub_ctx.partition.k = 2;
            let summary =
                InitialPartitioner::new(&sub_ctx).best_of_attempts(&mut sub, &sub_caps, rng, budget)?;
            totals.0 += summary.attempts;
            totals.1 += summary.feasible;

            let mut sides: [Vec<NodeId>; 2] = [Vec::new(), Vec::new()];
            for (sub_node, node) in extracted.mapping.iter().enumerate() {
                let side = sub
                    .block(NodeId::from_raw(sub_node as u32))
                    .map_or(0, |block| block.index().min(1));
                sides[side].push(*node);
            }
            let [left, right] = sides;
            pending.push((right, split.right));
            pending.push((left, split.left));
        }

        hg.assign_all(&assignment)?;
        if !metrics::is_balanced(hg, caps) || !hg.all_blocks_used() {
            return Err(HgpError::NoFeasiblePartition(
                ErrorInfo::new(
                    "infeasible-bisection",
                    "recursive bisection of the coarsest hypergraph broke a block cap or left a block empty",
                )
                .with_context("excess", metrics::max_cap_excess(hg, caps)),
            ));
        }
        Ok(InitialSummary {
            attempts: totals.0,
            feasible: totals.1,
            objective: metrics::objective(hg, self.ctx.partition.objective),
            imbalance: metrics::imbalance(hg),
        })
    }
}

/// Block of every node indexed by node id; inactive nodes map to block 0.
fn snapshot(hg: &Hypergraph) -> Vec<BlockId> {
    (0..hg.initial_num_nodes())
        .map(|node| {
            hg.block(NodeId::from_raw(node as u32))
                .unwrap_or(BlockId::from_raw(0))
        })
        .collect()
}

/// Lightest block that can take `weight`, or the lightest block overall.
fn lightest_fitting(hg: &Hypergraph, caps: &[NodeWeight], weight: NodeWeight) -> BlockId {
    let blocks = (0..hg.k()).map(BlockId::from_raw);
    blocks
        .clone()
        .filter(|block| hg.block_weight(*block) + weight <= caps[block.index()])
        .min_by_key(|block| hg.block_weight(*block))
        .or_else(|| blocks.min_by_key(|block| hg.block_weight(*block)))
        .unwrap_or(BlockId::from_raw(0))
}

/// Moves one node into every empty block.
///
/// The donor node comes from a block holding at least two nodes, must fit
/// under the cap of the empty block, and is chosen by highest gain, then
/// lowest weight.
fn fill_empty_blocks(hg: &mut Hypergraph, caps: &[NodeWeight], objective: Objective) {
    for block in (0..hg.k()).map(BlockId::from_raw) {
        if hg.all_blocks_used() {
            return;
        }
        if hg.block_size(block) > 0 {
            continue;
        }
        let donor = hg
            .nodes()
            .filter(|node| {
                hg.block(*node).map_or(false, |from| hg.block_size(from) > 1)
                    && hg.node_weight(*node) <= caps[block.index()]
            })
            .max_by_key(|node| {
                (
                    move_gain(hg, *node, block, objective),
                    std::cmp::Reverse(hg.node_weight(*node)),
                    std::cmp::Reverse(*node),
                )
            });
        if let Some(node) = donor {
            place(hg, node, block);
        }
    }
}

/// Shuffled nodes, each into a random block with room left.
fn random_attempt(hg: &mut Hypergraph, caps: &[NodeWeight], rng: &mut RngHandle) {
    let mut nodes: Vec<NodeId> = hg.nodes().collect();
    nodes.shuffle(rng.inner_mut());
    for node in nodes {
        let weight = hg.node_weight(node);
        let fitting: Vec<BlockId> = (0..hg.k())
            .map(BlockId::from_raw)
            .filter(|block| hg.block_weight(*block) + weight <= caps[block.index()])
            .collect();
        let block = if fitting.is_empty() {
            lightest_fitting(hg, caps, weight)
        } else {
            fitting[rng.gen_range(0..fitting.len())]
        };
        place(hg, node, block);
    }
}

fn random_seeds(hg: &Hypergraph, rng: &mut RngHandle) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = hg.nodes().collect();
    nodes.shuffle(rng.inner_mut());
    nodes.truncate(hg.k() as usize);
    nodes
}

fn neighbours(hg: &Hypergraph, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    hg.incident_edges(node)
        .iter()
        .flat_map(move |edge| hg.pins(*edge).iter().copied())
        .filter(move |pin| *pin != node)
}

fn fill_unassigned(hg: &mut Hypergraph, caps: &[NodeWeight]) {
    let rest: Vec<NodeId> = hg.nodes().filter(|node| hg.block(*node).is_none()).collect();
    for node in rest {
        let block = lightest_fitting(hg, caps, hg.node_weight(node));
        place(hg, node, block);
    }
}

/// Grows all blocks by BFS from random seeds, lightest block first.
fn bfs_attempt(hg: &mut Hypergraph, caps: &[NodeWeight], rng: &mut RngHandle) {
    let mut queues: Vec<VecDeque<NodeId>> = random_seeds(hg, rng)
        .into_iter()
        .map(|seed| VecDeque::from([seed]))
        .collect();
    loop {
        let next = (0..queues.len())
            .filter(|block| !queues[*block].is_empty())
            .min_by_key(|block| hg.block_weight(BlockId::from_raw(*block as u32)));
        let Some(block) = next else { break };
        let Some(node) = queues[block].pop_front() else { continue };
        let target = BlockId::from_raw(block as u32);
        if hg.block(node).is_some() {
            continue;
        }
        if hg.block_weight(target) + hg.node_weight(node) > caps[block] {
            queues[block].clear();
            continue;
        }
        place(hg, node, target);
        let frontier: Vec<NodeId> = neighbours(hg, node)
            .filter(|pin| hg.block(*pin).is_none())
            .collect();
        queues[block].extend(frontier);
    }
    fill_unassigned(hg, caps);
}

/// Grows all blocks from random seeds, each adding its most strongly
/// connected frontier node in turn.
fn greedy_attempt(hg: &mut Hypergraph, caps: &[NodeWeight], rng: &mut RngHandle) {
    let mut frontiers: Vec<BTreeMap<NodeId, EdgeWeight>> = vec![BTreeMap::new(); hg.k() as usize];
    for (block, seed) in random_seeds(hg, rng).into_iter().enumerate() {
        frontiers[block].insert(seed, 0);
    }
    loop {
        let next = (0..frontiers.len())
            .filter(|block| !frontiers[*block].is_empty())
            .min_by_key(|block| hg.block_weight(BlockId::from_raw(*block as u32)));
        let Some(block) = next else { break };
        let target = BlockId::from_raw(block as u32);
        let Some((node, _)) = frontiers[block]
            .iter()
            .max_by_key(|(node, gain)| (**gain, std::cmp::Reverse(**node)))
            .map(|(node, gain)| (*node, *gain))
        else {
            continue;
        };
        frontiers[block].remove(&node);
        if hg.block(node).is_some() {
            continue;
        }
        if hg.block_weight(target) + hg.node_weight(node) > caps[block] {
            continue;
        }
        place(hg, node, target);
        for frontier in frontiers.iter_mut() {
            frontier.remove(&node);
        }
        for edge in hg.incident_edges(node) {
            let weight = hg.edge_weight(*edge);
            for pin in hg.pins(*edge) {
                if hg.block(*pin).is_none() {
                    *frontiers[block].entry(*pin).or_insert(0) += weight;
                }
            }
        }
    }
    fill_unassigned(hg, caps);
}
