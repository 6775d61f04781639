use hgp_config::{FmParams, Objective, StoppingRule};
use hgp_core::{BlockId, EdgeWeight, Gain, NodeId, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::{metrics, Hypergraph};
use tracing::debug;

use super::gain_buckets::GainBuckets;
use super::stopping::AdaptiveStop;
use super::{place, RefinementOutcome, Refiner, RefinerState};

/// Objective reduction when `node` moves from its block to `to`.
pub fn move_gain(hg: &Hypergraph, node: NodeId, to: BlockId, objective: Objective) -> Gain {
    let Some(from) = hg.block(node) else {
        return 0;
    };
    if from == to {
        return 0;
    }
    let mut gain = 0;
    for edge in hg.incident_edges(node) {
        if hg.edge_size(*edge) < 2 {
            continue;
        }
        let weight = hg.edge_weight(*edge);
        let leaves_from = hg.pin_count_in_block(*edge, from) == 1;
        let enters_to = hg.pin_count_in_block(*edge, to) == 0;
        gain += match objective {
            Objective::Km1 => weight * (leaves_from as EdgeWeight - enters_to as EdgeWeight),
            Objective::Cut => {
                let before = hg.connectivity(*edge);
                let after = before - leaves_from as u32 + enters_to as u32;
                weight * ((before > 1) as EdgeWeight - (after > 1) as EdgeWeight)
            }
        };
    }
    gain
}

/// Gain-bucket boundary local search.
///
/// Each pass moves the best queued node, skipping moves that would break a
/// block cap or empty a block, and rolls back to the best prefix of the move log when it
/// stops. A prefix only counts as better when it strictly lowers the
/// objective or keeps it and lowers the imbalance, so a pass never returns
/// a worse partition than it received.
#[derive(Debug)]
pub struct FmRefiner {
    params: FmParams,
    objective: Objective,
    two_way: bool,
    state: RefinerState,
    buckets: Option<GainBuckets>,
    locked: Vec<bool>,
    touched: Vec<NodeId>,
}

impl FmRefiner {
    /// Creates an FM engine; `two_way` restricts targets to the other block of a bipartition.
    pub fn new(params: FmParams, objective: Objective, two_way: bool) -> Self {
        Self {
            params,
            objective,
            two_way,
            state: RefinerState::Idle,
            buckets: None,
            locked: Vec::new(),
            touched: Vec::new(),
        }
    }

    fn best_target(&self, hg: &Hypergraph, node: NodeId, caps: &[NodeWeight]) -> Option<(Gain, BlockId)> {
        let from = hg.block(node)?;
        if self.two_way || hg.k() == 2 {
            let to = BlockId::from_raw(1 - from.as_raw().min(1));
            return Some((move_gain(hg, node, to, self.objective), to));
        }
        let mut adjacent: Vec<BlockId> = hg
            .incident_edges(node)
            .iter()
            .flat_map(|edge| hg.connectivity_set(*edge))
            .filter(|block| *block != from)
            .collect();
        adjacent.sort_unstable();
        adjacent.dedup();

        let weight = hg.node_weight(node);
        let mut best: Option<(Gain, bool, NodeWeight, BlockId)> = None;
        for to in adjacent {
            let gain = move_gain(hg, node, to, self.objective);
            let fits = hg.block_weight(to) + weight <= caps[to.index()];
            let key = (gain, fits, -hg.block_weight(to));
            let better = match &best {
                None => true,
                Some((g, f, w, _)) => (key.1, key.0, key.2) > (*f, *g, *w),
            };
            if better {
                best = Some((gain, fits, key.2, to));
            }
        }
        best.map(|(gain, _, _, to)| (gain, to))
    }

    fn queue_node(&mut self, hg: &Hypergraph, node: NodeId, caps: &[NodeWeight]) {
        if self.locked[node.index()] {
            return;
        }
        let target = if hg.is_border_node(node) {
            self.best_target(hg, node, caps)
        } else {
            None
        };
        if let Some(buckets) = self.buckets.as_mut() {
            match target {
                Some((gain, to)) => {
                    buckets.upsert(node, gain, to);
                    self.touched.push(node);
                }
                None => buckets.remove(node),
            }
        }
    }

    fn prepare(&mut self, hg: &Hypergraph) {
        let num_nodes = hg.initial_num_nodes();
        if self.buckets.is_none() || self.locked.len() != num_nodes {
            let bound = hg
                .nodes()
                .map(|node| {
                    hg.incident_edges(node)
                        .iter()
                        .map(|edge| hg.edge_weight(*edge))
                        .sum::<EdgeWeight>()
                })
                .max()
                .unwrap_or(1)
                .clamp(1, 1 << 12);
            self.buckets = Some(GainBuckets::new(num_nodes, bound));
            self.locked = vec![false; num_nodes];
            self.touched.clear();
        } else {
            for node in self.touched.drain(..) {
                self.locked[node.index()] = false;
            }
        }
    }
}

impl Refiner for FmRefiner {
    fn refine(
        &mut self,
        hg: &mut Hypergraph,
        seeds: &[NodeId],
        caps: &[NodeWeight],
        _rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> RefinementOutcome {
        self.state = RefinerState::Searching;
        self.prepare(hg);

        let initial: Vec<NodeId> = if seeds.is_empty() {
            hg.nodes().filter(|node| hg.is_border_node(*node)).collect()
        } else {
            seeds.iter().copied().filter(|node| hg.is_active(*node)).collect()
        };
        for node in initial {
            self.queue_node(hg, node, caps);
        }

        let mut log: Vec<(NodeId, BlockId)> = Vec::new();
        let mut running: Gain = 0;
        let mut best_gain: Gain = 0;
        let mut best_len = 0usize;
        let mut best_imbalance = metrics::imbalance(hg);
        let mut fruitless = 0u32;
        let mut walk = AdaptiveStop::new(hg.current_num_nodes());

        loop {
            if budget.exhausted() {
                break;
            }
            let Some((node, gain, to)) = self.buckets.as_mut().and_then(GainBuckets::pop_max) else {
                break;
            };
            self.locked[node.index()] = true;
            self.touched.push(node);
            let Some(from) = hg.block(node) else { continue };
            if hg.block_weight(to) + hg.node_weight(node) > caps[to.index()]
                || hg.move_empties_block(node)
            {
                continue;
            }
            if hg.set_block(node, to).is_err() {
                continue;
            }
            log.push((node, from));
            running += gain;

            let imbalance = metrics::imbalance(hg);
            if running > best_gain || (running == best_gain && imbalance < best_imbalance) {
                best_gain = running;
                best_len = log.len();
                best_imbalance = imbalance;
                fruitless = 0;
                walk.reset();
            } else {
                fruitless += 1;
                walk.push(gain);
            }
            if fruitless >= self.params.max_number_of_fruitless_moves {
                break;
            }
            if self.params.stopping_rule == StoppingRule::AdaptiveOpt
                && walk.should_stop(self.params.adaptive_stopping_alpha)
            {
                break;
            }

            let mut neighbours: Vec<NodeId> = hg
                .incident_edges(node)
                .iter()
                .flat_map(|edge| hg.pins(*edge).iter().copied())
                .filter(|pin| *pin != node)
                .collect();
            neighbours.sort_unstable();
            neighbours.dedup();
            for neighbour in neighbours {
                self.queue_node(hg, neighbour, caps);
            }
        }

        let moves = log.len();
        for (node, from) in log.drain(best_len..).rev() {
            place(hg, node, from);
        }
        if let Some(buckets) = self.buckets.as_mut() {
            for node in &self.touched {
                buckets.remove(*node);
            }
        }

        debug!(gain = best_gain, moves, kept = best_len, "fm pass");
        self.state = if best_len > 0 {
            RefinerState::Improved
        } else {
            RefinerState::Exhausted
        };
        RefinementOutcome {
            gain: best_gain,
            moves: best_len,
        }
    }

    fn state(&self) -> RefinerState {
        self.state
    }

    fn reset(&mut self) {
        self.state = RefinerState::Idle;
    }

    fn name(&self) -> &'static str {
        if self.two_way {
            "twoway_fm"
        } else {
            "kway_fm"
        }
    }
}
