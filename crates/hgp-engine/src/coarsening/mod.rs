//! Contraction of rated node pairs down to the contraction limit.

mod rating;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hgp_config::{CoarseningAlgorithm, Context};
use hgp_core::{ErrorInfo, HgpError, NodeId, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::{ContractionHistory, Hypergraph};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use rating::{Candidate, Rating};

use crate::community::Communities;
use rating::Rater;

/// How coarsening ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoarseningStatus {
    /// The active node count reached the contraction limit.
    Reached,
    /// No eligible pair remained above the contraction limit.
    Stalled,
    /// The time budget ran out between two contractions.
    TimeLimit,
}

/// Contraction history plus the reason coarsening stopped.
#[derive(Debug, Clone)]
pub struct CoarseningOutcome {
    /// Contractions in the order they were applied.
    pub history: ContractionHistory,
    /// Stop reason.
    pub status: CoarseningStatus,
    /// Target number of active nodes.
    pub contraction_limit: usize,
}

impl CoarseningOutcome {
    /// Converts a stall into [`HgpError::CoarseningStalled`].
    ///
    /// The hypergraph stays coarsened either way; callers that accept the
    /// larger coarsest level simply keep using the outcome.
    pub fn into_result(self) -> Result<ContractionHistory, HgpError> {
        match self.status {
            CoarseningStatus::Stalled => Err(HgpError::CoarseningStalled(
                ErrorInfo::new(
                    "no-eligible-pair",
                    "no eligible contraction remains above the contraction limit",
                )
                .with_context("contractions", self.history.len())
                .with_context("contraction_limit", self.contraction_limit),
            )),
            CoarseningStatus::Reached | CoarseningStatus::TimeLimit => Ok(self.history),
        }
    }
}

/// Drives contractions according to the coarsening parameters.
#[derive(Debug, Clone, Copy)]
pub struct Coarsener<'a> {
    ctx: &'a Context,
    communities: Option<&'a Communities>,
    k: u32,
}

impl<'a> Coarsener<'a> {
    /// Creates a coarsener for a `k`-way target.
    pub fn new(ctx: &'a Context, communities: Option<&'a Communities>, k: u32) -> Self {
        Self {
            ctx,
            communities,
            k,
        }
    }

    /// Number of active nodes at which coarsening stops.
    pub fn contraction_limit(&self) -> usize {
        (self.ctx.coarsening.contraction_limit_multiplier as usize * self.k as usize).max(2)
    }

    /// Upper bound on the weight of any contracted node.
    ///
    /// Besides the multiplier bound, a contracted node never exceeds the
    /// total cap slack divided by `k - 1`: with nodes that light, placing
    /// each node into the lightest block with room always succeeds.
    pub fn max_allowed_node_weight(&self, hg: &Hypergraph) -> NodeWeight {
        let limit = self.contraction_limit() as f64;
        let bound = self.ctx.coarsening.max_allowed_weight_multiplier * hg.total_weight() as f64 / limit;
        let total = hg.total_weight();
        let slack = self.ctx.block_weight_caps(total).iter().sum::<NodeWeight>() - total;
        let balance_bound = slack / (self.k as NodeWeight - 1).max(1);
        (bound.ceil() as NodeWeight)
            .min(balance_bound)
            .max(hg.max_node_weight())
            .max(1)
    }

    /// Contracts `hg` until the contraction limit, a stall or the time limit.
    ///
    /// When `hg` is already partitioned only same-block pairs are contracted,
    /// so the partition stays valid on every level.
    pub fn coarsen(
        &self,
        hg: &mut Hypergraph,
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> CoarseningOutcome {
        let limit = self.contraction_limit();
        let mut rater = Rater::new(
            &self.ctx.coarsening.rating,
            self.communities,
            self.ctx.partition.hyperedge_size_threshold,
            self.max_allowed_node_weight(hg),
            hg.is_partitioned(),
            hg.initial_num_nodes(),
        );
        let start_nodes = hg.current_num_nodes();
        let (history, status) = if start_nodes <= limit {
            (ContractionHistory::new(), CoarseningStatus::Reached)
        } else {
            match self.ctx.coarsening.algorithm {
                CoarseningAlgorithm::MlStyle => ml_style(hg, &mut rater, limit, rng, budget),
                CoarseningAlgorithm::HeavyFull => heavy(hg, &mut rater, limit, true, budget),
                CoarseningAlgorithm::HeavyLazy => heavy(hg, &mut rater, limit, false, budget),
            }
        };

        match status {
            CoarseningStatus::Reached => info!(
                from = start_nodes,
                to = hg.current_num_nodes(),
                contractions = history.len(),
                "coarsening finished"
            ),
            CoarseningStatus::Stalled => warn!(
                nodes = hg.current_num_nodes(),
                limit, "coarsening stalled above the contraction limit"
            ),
            CoarseningStatus::TimeLimit => warn!(
                nodes = hg.current_num_nodes(),
                "time limit reached during coarsening"
            ),
        }
        CoarseningOutcome {
            history,
            status,
            contraction_limit: limit,
        }
    }
}

fn ml_style(
    hg: &mut Hypergraph,
    rater: &mut Rater<'_>,
    limit: usize,
    rng: &mut RngHandle,
    budget: &TimeBudget,
) -> (ContractionHistory, CoarseningStatus) {
    let mut history = ContractionHistory::new();
    loop {
        let mut matched = vec![false; hg.initial_num_nodes()];
        let mut order: Vec<NodeId> = hg.nodes().collect();
        order.shuffle(rng.inner_mut());
        let mut contracted_in_pass = 0usize;

        for u in order {
            if hg.current_num_nodes() <= limit {
                return (history, CoarseningStatus::Reached);
            }
            if budget.exhausted() {
                return (history, CoarseningStatus::TimeLimit);
            }
            if matched[u.index()] || !hg.is_active(u) {
                continue;
            }
            let Some(candidate) = rater.rate(hg, u, &matched) else {
                continue;
            };
            if matched[candidate.target.index()] {
                continue;
            }
            match hg.contract(u, candidate.target) {
                Ok(memento) => {
                    matched[u.index()] = true;
                    matched[candidate.target.index()] = true;
                    history.push(memento);
                    contracted_in_pass += 1;
                }
                Err(err) => {
                    warn!(error = %err, "skipping rejected contraction");
                }
            }
        }

        if hg.current_num_nodes() <= limit {
            return (history, CoarseningStatus::Reached);
        }
        if contracted_in_pass == 0 {
            return (history, CoarseningStatus::Stalled);
        }
    }
}

fn heavy(
    hg: &mut Hypergraph,
    rater: &mut Rater<'_>,
    limit: usize,
    eager: bool,
    budget: &TimeBudget,
) -> (ContractionHistory, CoarseningStatus) {
    let mut history = ContractionHistory::new();
    let mut matched = vec![false; hg.initial_num_nodes()];
    let mut version = vec![0u64; hg.initial_num_nodes()];
    let mut queue: BinaryHeap<(Rating, Reverse<NodeId>, u64)> = BinaryHeap::new();

    for u in hg.nodes().collect::<Vec<_>>() {
        if let Some(candidate) = rater.rate(hg, u, &matched) {
            queue.push((candidate.rating, Reverse(u), 0));
        }
    }

    while hg.current_num_nodes() > limit {
        if budget.exhausted() {
            return (history, CoarseningStatus::TimeLimit);
        }
        let Some((rating, Reverse(u), stamp)) = queue.pop() else {
            return (history, CoarseningStatus::Stalled);
        };
        if !hg.is_active(u) || stamp != version[u.index()] {
            continue;
        }
        let Some(candidate) = rater.rate(hg, u, &matched) else {
            continue;
        };
        if candidate.rating < rating {
            version[u.index()] += 1;
            queue.push((candidate.rating, Reverse(u), version[u.index()]));
            continue;
        }

        let v = candidate.target;
        let memento = match hg.contract(u, v) {
            Ok(memento) => memento,
            Err(err) => {
                warn!(error = %err, "skipping rejected contraction");
                continue;
            }
        };
        history.push(memento);
        matched[u.index()] = true;
        matched[v.index()] = true;
        version[v.index()] += 1;
        version[u.index()] += 1;
        if let Some(next) = rater.rate(hg, u, &matched) {
            queue.push((next.rating, Reverse(u), version[u.index()]));
        }

        if eager {
            let mut neighbours: Vec<NodeId> = hg
                .incident_edges(u)
                .iter()
                .flat_map(|edge| hg.pins(*edge).iter().copied())
                .filter(|pin| *pin != u)
                .collect();
            neighbours.sort_unstable();
            neighbours.dedup();
            for w in neighbours {
                version[w.index()] += 1;
                if let Some(next) = rater.rate(hg, w, &matched) {
                    queue.push((next.rating, Reverse(w), version[w.index()]));
                }
            }
        }
    }
    (history, CoarseningStatus::Reached)
}
