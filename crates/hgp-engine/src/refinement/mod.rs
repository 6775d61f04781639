//! Local search applied to every uncoarsening level.

pub mod flow;
mod fm;
mod gain_buckets;
mod stopping;

use hgp_config::{Context, RefinementAlgorithm};
use hgp_core::{BlockId, Gain, NodeId, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::Hypergraph;
use serde::{Deserialize, Serialize};

pub use flow::FlowRefiner;
pub use fm::{move_gain, FmRefiner};
pub use gain_buckets::GainBuckets;

/// Assigns `node` to `block` when both are known to be valid, e.g. to undo
/// a move.
pub(crate) fn place(hg: &mut Hypergraph, node: NodeId, block: BlockId) {
    let result = hg.set_block(node, block);
    debug_assert!(result.is_ok(), "{result:?}");
}

/// Lifecycle of a refiner on one level.
///
/// `Idle -> Searching -> (Improved | Exhausted) -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefinerState {
    /// Waiting for the next level.
    Idle,
    /// A pass is running.
    Searching,
    /// The last pass lowered the objective or the imbalance.
    Improved,
    /// The last pass kept the partition unchanged.
    Exhausted,
}

/// Result of one refinement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    /// Objective reduction; never negative.
    pub gain: Gain,
    /// Number of committed moves.
    pub moves: usize,
}

impl RefinementOutcome {
    /// Whether the pass changed the partition.
    pub fn changed(&self) -> bool {
        self.moves > 0
    }
}

/// Local search engine.
pub trait Refiner {
    /// Runs one pass.
    ///
    /// `seeds` restricts the starting candidates; an empty slice means every
    /// border node. The returned partition is never worse than the input
    /// and respects `caps` whenever the input did.
    fn refine(
        &mut self,
        hg: &mut Hypergraph,
        seeds: &[NodeId],
        caps: &[NodeWeight],
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> RefinementOutcome;

    /// Current state.
    fn state(&self) -> RefinerState;

    /// Returns to [`RefinerState::Idle`] before the next level.
    fn reset(&mut self);

    /// Configuration name of the engine.
    fn name(&self) -> &'static str;
}

/// Decides on which uncoarsening steps flow refinement runs.
///
/// Flows run after uncontraction `i` when `i` is a power of two and always
/// on the finest level.
#[derive(Debug, Clone, Copy)]
pub struct FlowExecutionPolicy {
    total_steps: usize,
}

impl FlowExecutionPolicy {
    /// Exponential schedule over `total_steps` uncontractions.
    pub fn exponential(total_steps: usize) -> Self {
        Self { total_steps }
    }

    /// Whether flows run after uncontraction number `step` (1-based).
    pub fn should_run(&self, step: usize) -> bool {
        step == self.total_steps || step.is_power_of_two()
    }
}

/// Configured combination of FM and flow engines.
pub struct LocalSearch {
    fm: Option<FmRefiner>,
    flow: Option<FlowRefiner>,
    max_passes: Option<u32>,
}

impl std::fmt::Debug for LocalSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSearch")
            .field("fm", &self.fm.as_ref().map(Refiner::name))
            .field("flow", &self.flow.as_ref().map(Refiner::name))
            .field("max_passes", &self.max_passes)
            .finish()
    }
}

impl LocalSearch {
    /// Builds the engines selected by the context for a `k`-way partition.
    ///
    /// Two-way engines fall back to their k-way counterparts when `k > 2`,
    /// which happens in recursive mode on the full hypergraph.
    pub fn from_context(ctx: &Context, k: u32) -> Self {
        let mut algorithm = ctx.local_search.algorithm;
        if algorithm.is_two_way() && k != 2 {
            algorithm = algorithm.kway_counterpart();
        }
        let objective = ctx.partition.objective;
        let fm = algorithm.uses_fm().then(|| {
            FmRefiner::new(
                ctx.local_search.fm.clone(),
                objective,
                algorithm == RefinementAlgorithm::TwowayFm,
            )
        });
        let flow = algorithm
            .uses_flow()
            .then(|| FlowRefiner::new(ctx.local_search.flow.clone(), objective));
        Self {
            fm,
            flow,
            max_passes: ctx.local_search.iterations_per_level,
        }
    }

    /// FM only, used to polish initial partitioning attempts.
    pub fn fm_only(ctx: &Context, k: u32) -> Self {
        Self {
            fm: Some(FmRefiner::new(
                ctx.local_search.fm.clone(),
                ctx.partition.objective,
                k == 2,
            )),
            flow: None,
            max_passes: ctx.local_search.iterations_per_level,
        }
    }

    /// Whether a flow engine is configured.
    pub fn uses_flow(&self) -> bool {
        self.flow.is_some()
    }

    /// Refines the current level and returns the total objective reduction.
    pub fn refine_level(
        &mut self,
        hg: &mut Hypergraph,
        seeds: &[NodeId],
        caps: &[NodeWeight],
        run_flow: bool,
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Gain {
        let mut total = 0;
        let mut pass = 0u32;
        loop {
            if budget.exhausted() || self.max_passes.map_or(false, |limit| pass >= limit) {
                break;
            }
            pass += 1;
            let mut changed = false;
            if run_flow {
                if let Some(flow) = self.flow.as_mut() {
                    let outcome = flow.refine(hg, &[], caps, rng, budget);
                    total += outcome.gain;
                    changed |= outcome.changed();
                    flow.reset();
                }
            }
            if let Some(fm) = self.fm.as_mut() {
                let outcome = fm.refine(hg, seeds, caps, rng, budget);
                total += outcome.gain;
                changed |= outcome.changed();
                fm.reset();
            }
            if !changed {
                break;
            }
        }
        total
    }
}
