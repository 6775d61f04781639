//! Flat entry points taking the hypergraph in CSR form.

use hgp_config::{Context, Mode};
use hgp_core::{BlockId, EdgeWeight, ErrorInfo, HgpError, NodeWeight, RngHandle};
use hgp_graph::Hypergraph;
use serde::{Deserialize, Serialize};

use crate::partitioner::Partitioner;

/// Owned result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOutput {
    /// Value of the configured objective.
    pub objective: EdgeWeight,
    /// Block of every vertex.
    pub blocks: Vec<BlockId>,
}

/// CSR description of a hypergraph.
///
/// Hyperedge `e` has the pins `pins[offsets[e]..offsets[e + 1]]`. Missing
/// weights default to one.
#[derive(Debug, Clone, Copy)]
pub struct CsrHypergraph<'a> {
    /// Number of vertices.
    pub num_vertices: usize,
    /// Number of hyperedges.
    pub num_hyperedges: usize,
    /// Optional vertex weights.
    pub vertex_weights: Option<&'a [NodeWeight]>,
    /// Optional hyperedge weights.
    pub hyperedge_weights: Option<&'a [EdgeWeight]>,
    /// `num_hyperedges + 1` offsets into `pins`.
    pub offsets: &'a [usize],
    /// Concatenated pin lists.
    pub pins: &'a [u32],
}

impl CsrHypergraph<'_> {
    fn build(&self, k: u32) -> Result<Hypergraph, HgpError> {
        Hypergraph::from_csr(
            self.num_vertices,
            self.num_hyperedges,
            self.offsets,
            self.pins,
            self.vertex_weights,
            self.hyperedge_weights,
            k,
        )
    }
}

fn call_context(ctx: &Context, epsilon: f64, k: u32) -> Result<Context, HgpError> {
    let mut ctx = ctx.clone();
    ctx.partition.epsilon = epsilon;
    ctx.partition.k = k;
    ctx.validate()?;
    Ok(ctx)
}

/// Partitions a CSR hypergraph into `k` blocks.
///
/// `epsilon` and `k` override the values in `ctx`; the result is
/// validated against the merged context before anything runs.
pub fn partition(
    hypergraph: &CsrHypergraph<'_>,
    epsilon: f64,
    k: u32,
    ctx: &Context,
) -> Result<PartitionOutput, HgpError> {
    let ctx = call_context(ctx, epsilon, k)?;
    let mut hg = hypergraph.build(k)?;
    let mut rng = RngHandle::from_seed(ctx.partition.seed);
    let result = Partitioner::new(&ctx).partition(&mut hg, &mut rng)?;
    Ok(PartitionOutput {
        objective: result.objective,
        blocks: result.blocks,
    })
}

/// Improves `input_partition` with `num_improvement_iterations` V-cycles.
///
/// Requires direct k-way mode and an input that assigns every vertex a
/// block below `k` and uses every block at least once.
pub fn improve_partition(
    hypergraph: &CsrHypergraph<'_>,
    epsilon: f64,
    k: u32,
    input_partition: &[BlockId],
    num_improvement_iterations: u32,
    ctx: &Context,
) -> Result<PartitionOutput, HgpError> {
    if ctx.partition.mode != Mode::DirectKway {
        return Err(HgpError::Precondition(
            ErrorInfo::new("mode-mismatch", "improving a partition requires direct k-way mode")
                .with_context("mode", ctx.partition.mode),
        ));
    }
    if input_partition.len() != hypergraph.num_vertices {
        return Err(HgpError::Precondition(
            ErrorInfo::new("partition-length", "one block id per vertex is required")
                .with_context("expected", hypergraph.num_vertices)
                .with_context("actual", input_partition.len()),
        ));
    }
    let mut used = vec![false; k as usize];
    for (vertex, block) in input_partition.iter().enumerate() {
        if block.as_raw() >= k {
            return Err(HgpError::Precondition(
                ErrorInfo::new("block-out-of-range", "input block id must lie in [0, k)")
                    .with_context("vertex", vertex)
                    .with_context("block", block.as_raw())
                    .with_context("k", k),
            ));
        }
        used[block.index()] = true;
    }
    if let Some(missing) = used.iter().position(|used| !used) {
        return Err(HgpError::Precondition(
            ErrorInfo::new("missing-block", "input partition leaves a block empty")
                .with_context("block", missing)
                .with_hint("every block id in [0, k) must occur at least once"),
        ));
    }

    let mut ctx = call_context(ctx, epsilon, k)?;
    ctx.partition.global_search_iterations = num_improvement_iterations;
    ctx.partition.vcycle_refinement_for_input_partition = true;
    let mut hg = hypergraph.build(k)?;
    hg.assign_all(input_partition)?;
    let mut rng = RngHandle::from_seed(ctx.partition.seed);
    let result = Partitioner::new(&ctx).partition(&mut hg, &mut rng)?;
    Ok(PartitionOutput {
        objective: result.objective,
        blocks: result.blocks,
    })
}
