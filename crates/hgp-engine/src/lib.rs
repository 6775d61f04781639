#![deny(missing_docs)]
#![doc = "Multilevel k-way hypergraph partitioning: community detection, coarsening, \
initial partitioning, FM and flow refinement, V-cycles and the CSR entry points."]

/// CSR-level `partition` and `improve_partition`.
pub mod api;
/// Pair rating and contraction drivers.
pub mod coarsening;
/// Label propagation communities.
pub mod community;
/// Attempts on the coarsest hypergraph.
pub mod initial;
/// Pipeline facade and V-cycles.
pub mod partitioner;
/// Recursive bisection helpers and mode.
pub mod recursive;
/// FM and flow local search.
pub mod refinement;

pub use api::{improve_partition, partition, CsrHypergraph, PartitionOutput};
pub use coarsening::{Coarsener, CoarseningOutcome, CoarseningStatus};
pub use community::{Communities, CommunityDetector, LabelSample};
pub use initial::{InitialPartitioner, InitialSummary};
pub use partitioner::{PartitionResult, Partitioner};
pub use refinement::{
    FlowExecutionPolicy, FlowRefiner, FmRefiner, LocalSearch, RefinementOutcome, Refiner,
    RefinerState,
};
