//! Max-flow based refinement of pairs of adjacent blocks.

mod maxflow;
mod mincut;
mod network;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hgp_config::{FlowParams, Objective};
use hgp_core::{BlockId, EdgeId, EdgeWeight, Gain, NodeId, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::{metrics, Hypergraph};
use tracing::debug;

use super::{place, RefinementOutcome, Refiner, RefinerState};

pub use maxflow::{solver_for, Dinic, EdmondsKarp, MaxFlowSolver};
pub use mincut::{source_side, SideWeights};
pub use network::{Arc, Capacity, FlowNetwork, RegionNetwork, INFINITE};

/// Flow refinement over every pair of adjacent blocks.
///
/// For a pair `(b0, b1)` the region grows by BFS from the nodes of each
/// block that share a hyperedge with the other block, up to `beta` hops,
/// while the other block could still absorb the region under the relaxed
/// cap `avg + alpha * max(cap - avg, 1)`. The rest of `b0` becomes the
/// source and the rest of `b1` the sink. A computed cut is committed only
/// when both blocks respect their caps, no block is left empty, and the
/// objective drops or stays equal with a lower imbalance; otherwise the
/// assignment is restored.
pub struct FlowRefiner {
    params: FlowParams,
    objective: Objective,
    solver: Box<dyn MaxFlowSolver>,
    state: RefinerState,
    history: BTreeMap<(BlockId, BlockId), u32>,
}

impl FlowRefiner {
    /// Creates a flow engine with the configured solver.
    pub fn new(params: FlowParams, objective: Objective) -> Self {
        let solver = solver_for(params.algorithm);
        Self {
            params,
            objective,
            solver,
            state: RefinerState::Idle,
            history: BTreeMap::new(),
        }
    }

    /// Number of improvements found per block pair so far.
    pub fn improvement_history(&self) -> &BTreeMap<(BlockId, BlockId), u32> {
        &self.history
    }

    fn block_pairs(&self, hg: &Hypergraph) -> Vec<(BlockId, BlockId)> {
        let mut pairs = BTreeSet::new();
        for edge in hg.edges() {
            if hg.connectivity(edge) < 2 {
                continue;
            }
            let blocks: Vec<BlockId> = hg.connectivity_set(edge).collect();
            for (i, a) in blocks.iter().enumerate() {
                for b in &blocks[i + 1..] {
                    pairs.insert((*a.min(b), *a.max(b)));
                }
            }
        }
        let mut pairs: Vec<(BlockId, BlockId)> = pairs.into_iter().collect();
        if self.params.use_improvement_history {
            pairs.sort_by_key(|pair| std::cmp::Reverse(self.history.get(pair).copied().unwrap_or(0)));
        }
        pairs
    }

    fn relaxed_cap(&self, hg: &Hypergraph, cap: NodeWeight, alpha: f64) -> NodeWeight {
        let average = (hg.total_weight() + hg.k() as NodeWeight - 1) / hg.k() as NodeWeight;
        average + (alpha * (cap - average).max(1) as f64) as NodeWeight
    }

    fn grow_side(
        &self,
        hg: &Hypergraph,
        from: BlockId,
        other: BlockId,
        limit: NodeWeight,
        region: &mut Vec<NodeId>,
        in_region: &mut BTreeSet<NodeId>,
    ) {
        let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        for edge in hg.edges() {
            if hg.pin_count_in_block(edge, from) == 0 || hg.pin_count_in_block(edge, other) == 0 {
                continue;
            }
            for pin in hg.pins(edge) {
                if hg.block(*pin) == Some(from) && seen.insert(*pin) {
                    queue.push_back((*pin, 0));
                }
            }
        }

        let mut weight = 0;
        while let Some((node, depth)) = queue.pop_front() {
            let node_weight = hg.node_weight(node);
            if weight + node_weight > limit {
                continue;
            }
            weight += node_weight;
            region.push(node);
            in_region.insert(node);
            if depth >= self.params.beta {
                continue;
            }
            for edge in hg.incident_edges(node) {
                for pin in hg.pins(*edge) {
                    if hg.block(*pin) == Some(from) && seen.insert(*pin) {
                        queue.push_back((*pin, depth + 1));
                    }
                }
            }
        }
    }

    fn local_objective(&self, hg: &Hypergraph, edges: &[EdgeId]) -> EdgeWeight {
        edges
            .iter()
            .map(|edge| {
                let connectivity = hg.connectivity(*edge) as EdgeWeight;
                let weight = hg.edge_weight(*edge);
                match self.objective {
                    Objective::Km1 => weight * (connectivity - 1).max(0),
                    Objective::Cut => weight * (connectivity > 1) as EdgeWeight,
                }
            })
            .sum()
    }

    /// One flow round on `(b0, b1)`; returns the gain and the moved node count.
    fn round(
        &mut self,
        hg: &mut Hypergraph,
        pair: (BlockId, BlockId),
        caps: &[NodeWeight],
        alpha: f64,
        rng: &mut RngHandle,
    ) -> (Gain, usize) {
        let (b0, b1) = pair;
        let limit0 = self.relaxed_cap(hg, caps[b1.index()], alpha) - hg.block_weight(b1);
        let limit1 = self.relaxed_cap(hg, caps[b0.index()], alpha) - hg.block_weight(b0);
        let mut region = Vec::new();
        let mut in_region = BTreeSet::new();
        self.grow_side(hg, b0, b1, limit0.max(0), &mut region, &mut in_region);
        self.grow_side(hg, b1, b0, limit1.max(0), &mut region, &mut in_region);
        if region.is_empty() {
            return (0, 0);
        }

        let mut rn = RegionNetwork::build(hg, &region, pair, self.objective, &self.params);
        let flow = self.solver.max_flow(&mut rn.network, rn.source, rn.sink);

        let region_weight = |block: BlockId| -> NodeWeight {
            region
                .iter()
                .filter(|node| hg.block(**node) == Some(block))
                .map(|node| hg.node_weight(*node))
                .sum()
        };
        let sides = SideWeights {
            rest: [
                hg.block_weight(b0) - region_weight(b0),
                hg.block_weight(b1) - region_weight(b1),
            ],
            caps: [caps[b0.index()], caps[b1.index()]],
        };
        let side = source_side(&rn, sides, self.params.use_most_balanced_minimum_cut, rng);

        let before = self.local_objective(hg, &rn.edges);
        let imbalance_before = metrics::imbalance(hg);
        let used_before = hg.all_blocks_used();
        let mut applied: Vec<(NodeId, BlockId)> = Vec::new();
        for (vertex, node) in rn.nodes.iter().enumerate() {
            let target = if side[vertex] { b0 } else { b1 };
            let Some(from) = hg.block(*node) else { continue };
            if from != target && hg.set_block(*node, target).is_ok() {
                applied.push((*node, from));
            }
        }
        let after = self.local_objective(hg, &rn.edges);
        let gain = before - after;
        let balanced = hg.block_weight(b0) <= caps[b0.index()] && hg.block_weight(b1) <= caps[b1.index()];
        let occupied = hg.all_blocks_used() || !used_before;
        let accept = !applied.is_empty()
            && balanced
            && occupied
            && (gain > 0 || (gain == 0 && metrics::imbalance(hg) < imbalance_before));

        debug!(
            b0 = b0.as_raw(),
            b1 = b1.as_raw(),
            region = region.len(),
            flow,
            gain,
            accept,
            "flow round"
        );
        if !accept {
            for (node, from) in applied.into_iter().rev() {
                place(hg, node, from);
            }
            return (0, 0);
        }
        (gain, applied.len())
    }
}

impl Refiner for FlowRefiner {
    fn refine(
        &mut self,
        hg: &mut Hypergraph,
        _seeds: &[NodeId],
        caps: &[NodeWeight],
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> RefinementOutcome {
        self.state = RefinerState::Searching;
        let mut outcome = RefinementOutcome::default();
        if !hg.is_partitioned() {
            self.state = RefinerState::Exhausted;
            return outcome;
        }

        for pair in self.block_pairs(hg) {
            let mut alpha = self.params.alpha;
            let mut pair_gain = 0;
            while alpha >= 1.0 {
                if budget.exhausted() {
                    break;
                }
                let (gain, moves) = self.round(hg, pair, caps, alpha, rng);
                pair_gain += gain;
                outcome.gain += gain;
                outcome.moves += moves;
                if moves == 0 && self.params.use_adaptive_alpha_stopping_rule {
                    break;
                }
                alpha /= 2.0;
            }
            if pair_gain > 0 {
                *self.history.entry(pair).or_insert(0) += 1;
            }
        }

        self.state = if outcome.changed() {
            RefinerState::Improved
        } else {
            RefinerState::Exhausted
        };
        outcome
    }

    fn state(&self) -> RefinerState {
        self.state
    }

    fn reset(&mut self) {
        self.state = RefinerState::Idle;
    }

    fn name(&self) -> &'static str {
        "flow"
    }
}
