//! Multilevel pipeline and V-cycles.

use hgp_config::{Context, Mode};
use hgp_core::{BlockId, EdgeWeight, ErrorInfo, HgpError, NodeWeight, RngHandle, TimeBudget};
use hgp_graph::{metrics, Hypergraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coarsening::{Coarsener, CoarseningStatus};
use crate::community::{Communities, CommunityDetector};
use crate::initial::InitialPartitioner;
use crate::recursive::partition_recursive;
use crate::refinement::{FlowExecutionPolicy, LocalSearch};

/// Final state of a partitioning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionResult {
    /// Value of the configured objective.
    pub objective: EdgeWeight,
    /// Cut metric.
    pub cut: EdgeWeight,
    /// Connectivity minus one metric.
    pub km1: EdgeWeight,
    /// Heaviest block relative to the average block weight, minus one.
    pub imbalance: f64,
    /// Block of every node.
    pub blocks: Vec<BlockId>,
    /// Weight of every block.
    pub block_weights: Vec<NodeWeight>,
    /// How the last coarsening phase ended.
    pub coarsening: CoarseningStatus,
    /// V-cycle rounds whose result was kept.
    pub accepted_vcycles: u32,
}

/// Runs the configured pipeline on a hypergraph.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner<'a> {
    ctx: &'a Context,
}

impl<'a> Partitioner<'a> {
    /// Creates a partitioner for a validated context.
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Partitions `hg` into `ctx.partition.k` blocks.
    ///
    /// The first round builds a partition from scratch unless
    /// `vcycle_refinement_for_input_partition` is set, in which case the
    /// partition already on `hg` is the starting point. Every further
    /// round is a V-cycle that is kept only if its objective is no worse
    /// than the best so far and its balance does not degrade.
    pub fn partition(&self, hg: &mut Hypergraph, rng: &mut RngHandle) -> Result<PartitionResult, HgpError> {
        let ctx = self.ctx;
        if hg.k() != ctx.partition.k {
            return Err(HgpError::Precondition(
                ErrorInfo::new("k-mismatch", "hypergraph and context disagree on k")
                    .with_context("hypergraph", hg.k())
                    .with_context("context", ctx.partition.k),
            ));
        }
        if ctx.preprocessing.enable_min_hash_sparsifier {
            warn!("min-hash sparsification is not available, continuing without it");
        }
        let budget = TimeBudget::from_secs(ctx.partition.time_limit_secs);
        let caps = metrics::block_weight_caps(ctx, hg);
        let mut communities: Option<Communities> = None;

        let warm_start = ctx.partition.vcycle_refinement_for_input_partition && hg.is_partitioned();
        let mut coarsening = CoarseningStatus::Reached;
        let mut accepted = 0u32;
        let mut rounds = ctx.partition.global_search_iterations;
        if !warm_start {
            coarsening = match ctx.partition.mode {
                Mode::DirectKway => self.multilevel(hg, &caps, &mut communities, rng, &budget)?,
                Mode::Recursive => partition_recursive(ctx, hg, &caps, rng, &budget)?,
            };
            rounds = rounds.saturating_sub(1);
        }

        let vcycle_ctx = self.vcycle_context();
        let vcycle = Partitioner::new(&vcycle_ctx);
        for round in 0..rounds {
            if budget.exhausted() {
                warn!(round, "time limit reached, skipping remaining v-cycles");
                break;
            }
            let before = metrics::objective(hg, ctx.partition.objective);
            let excess_before = metrics::max_cap_excess(hg, &caps);
            let snapshot = hg.blocks()?;
            if !ctx.preprocessing.community_detection.reuse_communities {
                communities = None;
            }
            let status = vcycle.multilevel(hg, &caps, &mut communities, rng, &budget)?;
            let after = metrics::objective(hg, ctx.partition.objective);
            let excess_after = metrics::max_cap_excess(hg, &caps);
            if after <= before && excess_after <= excess_before {
                accepted += 1;
                coarsening = status;
                debug!(round, before, after, "v-cycle accepted");
            } else {
                hg.assign_all(&snapshot)?;
                debug!(round, before, after, "v-cycle rejected");
            }
        }

        let result = PartitionResult {
            objective: metrics::objective(hg, ctx.partition.objective),
            cut: metrics::cut(hg),
            km1: metrics::km1(hg),
            imbalance: metrics::imbalance(hg),
            blocks: hg.blocks()?,
            block_weights: hg.block_weights().to_vec(),
            coarsening,
            accepted_vcycles: accepted,
        };
        info!(
            k = hg.k(),
            objective = result.objective,
            cut = result.cut,
            km1 = result.km1,
            imbalance = result.imbalance,
            heaviest = metrics::heaviest_block(hg).as_raw(),
            accepted_vcycles = accepted,
            "partitioning finished"
        );
        if !metrics::is_balanced(hg, &caps) {
            warn!(
                excess = metrics::max_cap_excess(hg, &caps),
                "final partition exceeds a block cap"
            );
        }
        Ok(result)
    }

    /// Context of V-cycle rounds: recursive mode refines with k-way engines.
    fn vcycle_context(&self) -> Context {
        let mut ctx = self.ctx.clone();
        ctx.partition.mode = Mode::DirectKway;
        ctx
    }

    /// One multilevel run: communities, coarsening, initial partitioning of
    /// the coarsest level unless `hg` is already partitioned, then
    /// uncoarsening with local search after every uncontraction.
    ///
    /// FM starts from the two nodes of each restored contraction; flows
    /// run on power-of-two steps and on the finest level. Once the budget
    /// is exhausted the remaining levels are only uncontracted.
    /// A failed initial partitioning undoes every contraction before the
    /// error is returned.
    pub(crate) fn multilevel(
        &self,
        hg: &mut Hypergraph,
        caps: &[NodeWeight],
        communities: &mut Option<Communities>,
        rng: &mut RngHandle,
        budget: &TimeBudget,
    ) -> Result<CoarseningStatus, HgpError> {
        let ctx = self.ctx;
        let k = hg.k();
        if ctx.preprocessing.enable_community_detection && communities.is_none() {
            let detector = CommunityDetector::new(
                &ctx.preprocessing.community_detection,
                ctx.partition.hyperedge_size_threshold,
            );
            *communities = Some(detector.detect(hg, rng));
        }
        let community_view = if ctx.preprocessing.enable_community_detection {
            communities.as_ref()
        } else {
            None
        };

        let outcome = Coarsener::new(ctx, community_view, k).coarsen(hg, rng, budget);
        let status = outcome.status;
        let mut history = outcome.history;

        let mut search = LocalSearch::from_context(ctx, k);
        if !hg.is_partitioned() {
            if let Err(err) = InitialPartitioner::new(ctx).partition(hg, caps, rng, budget) {
                while let Some(memento) = history.pop() {
                    hg.uncontract(&memento)?;
                }
                return Err(err);
            }
        }
        if !budget.exhausted() {
            search.refine_level(hg, &[], caps, search.uses_flow(), rng, budget);
        }

        let policy = FlowExecutionPolicy::exponential(history.len());
        let mut step = 0usize;
        while let Some(memento) = history.pop() {
            hg.uncontract(&memento)?;
            step += 1;
            if budget.exhausted() {
                continue;
            }
            let run_flow = search.uses_flow() && policy.should_run(step);
            search.refine_level(hg, &[memento.u, memento.v], caps, run_flow, rng, budget);
        }
        debug!(
            levels = step,
            objective = metrics::objective(hg, ctx.partition.objective),
            "uncoarsening finished"
        );
        Ok(status)
    }
}
