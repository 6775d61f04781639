use std::cmp::Ordering;

use hgp_config::{AcceptancePolicy, CommunityPolicy, HeavyNodePenalty, RatingFunction, RatingParams};
use hgp_core::{NodeId, NodeWeight};
use hgp_graph::Hypergraph;

use crate::community::Communities;

/// Totally ordered rating score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating(pub f64);

impl Eq for Rating {}

impl PartialOrd for Rating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rating {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Best contraction partner of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Node that would be absorbed.
    pub target: NodeId,
    /// Score of the pair.
    pub rating: Rating,
}

/// Rates neighbours through shared hyperedges.
#[derive(Debug)]
pub(crate) struct Rater<'a> {
    params: &'a RatingParams,
    communities: Option<&'a Communities>,
    size_threshold: Option<usize>,
    max_allowed_weight: NodeWeight,
    restrict_to_block: bool,
    scores: Vec<f64>,
    touched: Vec<NodeId>,
}

impl<'a> Rater<'a> {
    pub(crate) fn new(
        params: &'a RatingParams,
        communities: Option<&'a Communities>,
        size_threshold: Option<usize>,
        max_allowed_weight: NodeWeight,
        restrict_to_block: bool,
        num_nodes: usize,
    ) -> Self {
        let communities = match params.community_policy {
            CommunityPolicy::UseCommunities => communities,
            CommunityPolicy::IgnoreCommunities => None,
        };
        Self {
            params,
            communities,
            size_threshold,
            max_allowed_weight,
            restrict_to_block,
            scores: vec![0.0; num_nodes],
            touched: Vec::new(),
        }
    }

    /// Whether `u` and `v` may be contracted at all.
    pub(crate) fn eligible(&self, hg: &Hypergraph, u: NodeId, v: NodeId) -> bool {
        u != v
            && hg.is_active(u)
            && hg.is_active(v)
            && hg.node_weight(u) + hg.node_weight(v) <= self.max_allowed_weight
            && self
                .communities
                .map_or(true, |communities| communities.label(u) == communities.label(v))
            && (!self.restrict_to_block || hg.block(u) == hg.block(v))
    }

    /// Best eligible partner of `u`, if any.
    ///
    /// `matched` flags nodes that already took part in a contraction; it is
    /// consulted by the prefer-unmatched acceptance policy.
    pub(crate) fn rate(&mut self, hg: &Hypergraph, u: NodeId, matched: &[bool]) -> Option<Candidate> {
        for edge in hg.incident_edges(u) {
            let size = hg.edge_size(*edge);
            if size < 2 || self.size_threshold.map_or(false, |limit| size > limit) {
                continue;
            }
            let contribution = match self.params.rating_function {
                RatingFunction::HeavyEdge => hg.edge_weight(*edge) as f64 / (size - 1) as f64,
                RatingFunction::EdgeFrequency => 1.0 / (size - 1) as f64,
            };
            for pin in hg.pins(*edge) {
                if *pin == u {
                    continue;
                }
                if self.scores[pin.index()] == 0.0 {
                    self.touched.push(*pin);
                }
                self.scores[pin.index()] += contribution;
            }
        }

        self.touched.sort_unstable();
        self.touched.dedup();
        let mut best: Option<(Candidate, NodeWeight, bool)> = None;
        let u_weight = hg.node_weight(u).max(1) as f64;
        for v in &self.touched {
            let raw = self.scores[v.index()];
            self.scores[v.index()] = 0.0;
            if !self.eligible(hg, u, *v) {
                continue;
            }
            let v_weight = hg.node_weight(*v).max(1) as f64;
            let score = match self.params.heavy_node_penalty {
                HeavyNodePenalty::NoPenalty => raw,
                HeavyNodePenalty::MultiplicativePenalty => raw / (u_weight * v_weight),
                HeavyNodePenalty::AdditivePenalty => raw / (u_weight + v_weight),
            };
            let candidate = Candidate {
                target: *v,
                rating: Rating(score),
            };
            let combined = hg.node_weight(u) + hg.node_weight(*v);
            let unmatched = !matched[v.index()];
            let replace = match &best {
                None => true,
                Some((current, current_combined, current_unmatched)) => {
                    match candidate.rating.cmp(&current.rating) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => match self.params.acceptance_policy {
                            AcceptancePolicy::Best => false,
                            AcceptancePolicy::BestPreferUnmatched => {
                                unmatched && !current_unmatched
                            }
                            AcceptancePolicy::LightestCombined => combined < *current_combined,
                        },
                    }
                }
            };
            if replace {
                best = Some((candidate, combined, unmatched));
            }
        }
        self.touched.clear();
        best.map(|(candidate, _, _)| candidate)
    }
}
