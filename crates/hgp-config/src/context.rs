//! Parameter groups governing a partition run.

use hgp_core::{ErrorInfo, HgpError, NodeWeight};
use serde::{Deserialize, Serialize};

use crate::enums::{
    AcceptancePolicy, CoarseningAlgorithm, CommunityPolicy, EdgeWeightKind, FlowAlgorithm,
    FlowNetworkKind, HeavyNodePenalty, InitialPartitioningAlgorithm, Mode, Objective,
    RatingFunction, RefinementAlgorithm, StoppingRule,
};

/// Complete, validated configuration of a partition run.
///
/// Instances are produced by [`crate::ContextBuilder::build`] or
/// [`Context::from_yaml_str`]; both validate before returning.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    /// Problem definition and global search settings.
    #[serde(default)]
    pub partition: PartitionParams,
    /// Community detection and sparsification.
    #[serde(default)]
    pub preprocessing: PreprocessingParams,
    /// Contraction driver and rating.
    #[serde(default)]
    pub coarsening: CoarseningParams,
    /// Candidate generation on the coarsest hypergraph.
    #[serde(default)]
    pub initial_partitioning: InitialPartitioningParams,
    /// Refinement during uncoarsening.
    #[serde(default)]
    pub local_search: LocalSearchParams,
}

/// Problem definition and global search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionParams {
    /// Direct k-way or recursive bisection.
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Objective to minimise.
    #[serde(default = "default_objective")]
    pub objective: Objective,
    /// Number of blocks.
    #[serde(default = "default_k")]
    pub k: u32,
    /// Allowed relative deviation from a perfectly balanced block weight.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Master seed of the run.
    #[serde(default)]
    pub seed: u64,
    /// Number of V-cycle rounds including the first pipeline run.
    #[serde(default = "default_global_search_iterations")]
    pub global_search_iterations: u32,
    /// Cooperative wall-clock limit in seconds.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
    /// Explicit per-block weight caps; `epsilon` is ignored when set.
    #[serde(default)]
    pub max_part_weights: Option<Vec<NodeWeight>>,
    /// Hyperedges with more pins are ignored by rating and community detection.
    #[serde(default)]
    pub hyperedge_size_threshold: Option<usize>,
    /// Set by improve mode: the first round starts from the given partition.
    #[serde(skip)]
    pub vcycle_refinement_for_input_partition: bool,
}

fn default_mode() -> Mode {
    Mode::DirectKway
}

fn default_objective() -> Objective {
    Objective::Km1
}

fn default_k() -> u32 {
    2
}

fn default_epsilon() -> f64 {
    0.03
}

fn default_global_search_iterations() -> u32 {
    1
}

impl Default for PartitionParams {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            objective: default_objective(),
            k: default_k(),
            epsilon: default_epsilon(),
            seed: 0,
            global_search_iterations: default_global_search_iterations(),
            time_limit_secs: None,
            max_part_weights: None,
            hyperedge_size_threshold: None,
            vcycle_refinement_for_input_partition: false,
        }
    }
}

/// Preprocessing steps run before coarsening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingParams {
    /// Runs label propagation before coarsening.
    #[serde(default = "default_true")]
    pub enable_community_detection: bool,
    /// Requests min-hash sparsification; accepted and logged only.
    #[serde(default)]
    pub enable_min_hash_sparsifier: bool,
    /// Label propagation settings.
    #[serde(default)]
    pub community_detection: CommunityDetectionParams,
    /// Sparsifier bounds.
    #[serde(default)]
    pub min_hash_sparsifier: MinHashSparsifierParams,
}

impl Default for PreprocessingParams {
    fn default() -> Self {
        Self {
            enable_community_detection: true,
            enable_min_hash_sparsifier: false,
            community_detection: CommunityDetectionParams::default(),
            min_hash_sparsifier: MinHashSparsifierParams::default(),
        }
    }
}

/// Label propagation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityDetectionParams {
    /// Also detects communities in the bisection sub-runs of recursive mode.
    #[serde(default)]
    pub enable_in_initial_partitioning: bool,
    /// Keep the communities of the first V-cycle round.
    #[serde(default)]
    pub reuse_communities: bool,
    /// Hyperedge weighting in the local gain.
    #[serde(default = "default_edge_weight")]
    pub edge_weight: EdgeWeightKind,
    /// Upper bound on label propagation passes.
    #[serde(default = "default_max_pass_iterations")]
    pub max_pass_iterations: u32,
    /// Relative pass gain below which propagation stops.
    #[serde(default = "default_min_eps_improvement")]
    pub min_eps_improvement: f64,
    /// Hyperedges with at least this many pins use an owned label sample.
    #[serde(default = "default_sample_threshold")]
    pub sample_threshold: usize,
    /// Capacity of an owned label sample.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_edge_weight() -> EdgeWeightKind {
    EdgeWeightKind::Degree
}

fn default_max_pass_iterations() -> u32 {
    100
}

fn default_min_eps_improvement() -> f64 {
    0.0001
}

fn default_sample_threshold() -> usize {
    64
}

fn default_sample_size() -> usize {
    32
}

impl Default for CommunityDetectionParams {
    fn default() -> Self {
        Self {
            enable_in_initial_partitioning: false,
            reuse_communities: false,
            edge_weight: default_edge_weight(),
            max_pass_iterations: default_max_pass_iterations(),
            min_eps_improvement: default_min_eps_improvement(),
            sample_threshold: default_sample_threshold(),
            sample_size: default_sample_size(),
        }
    }
}

/// Bounds handed to the min-hash sparsifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinHashSparsifierParams {
    /// Largest hyperedge considered by the hash functions.
    pub max_hyperedge_size: usize,
    /// Largest cluster produced.
    pub max_cluster_size: usize,
    /// Smallest cluster produced.
    pub min_cluster_size: usize,
    /// Hash functions per round.
    pub num_hash_functions: usize,
    /// Hash functions combined into one signature.
    pub combined_num_hash_functions: usize,
    /// Median hyperedge size that enables the sparsifier.
    pub min_median_he_size: usize,
}

impl Default for MinHashSparsifierParams {
    fn default() -> Self {
        Self {
            max_hyperedge_size: 1200,
            max_cluster_size: 10,
            min_cluster_size: 2,
            num_hash_functions: 5,
            combined_num_hash_functions: 100,
            min_median_he_size: 28,
        }
    }
}

/// Contraction driver and rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseningParams {
    /// Contraction driver.
    #[serde(default = "default_coarsening_algorithm")]
    pub algorithm: CoarseningAlgorithm,
    /// Coarsening stops at `contraction_limit_multiplier * k` active nodes.
    #[serde(default = "default_contraction_limit_multiplier")]
    pub contraction_limit_multiplier: u32,
    /// Bounds the weight of any contracted node relative to the average.
    #[serde(default = "default_max_allowed_weight_multiplier")]
    pub max_allowed_weight_multiplier: f64,
    /// Rating of candidate pairs.
    #[serde(default)]
    pub rating: RatingParams,
}

fn default_coarsening_algorithm() -> CoarseningAlgorithm {
    CoarseningAlgorithm::MlStyle
}

fn default_contraction_limit_multiplier() -> u32 {
    160
}

fn default_max_allowed_weight_multiplier() -> f64 {
    3.25
}

impl Default for CoarseningParams {
    fn default() -> Self {
        Self {
            algorithm: default_coarsening_algorithm(),
            contraction_limit_multiplier: default_contraction_limit_multiplier(),
            max_allowed_weight_multiplier: default_max_allowed_weight_multiplier(),
            rating: RatingParams::default(),
        }
    }
}

/// Rating of candidate pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingParams {
    /// Score of a pair.
    pub rating_function: RatingFunction,
    /// Community restriction.
    pub community_policy: CommunityPolicy,
    /// Heavy node discount.
    pub heavy_node_penalty: HeavyNodePenalty,
    /// Tie breaking among equal ratings.
    pub acceptance_policy: AcceptancePolicy,
}

impl Default for RatingParams {
    fn default() -> Self {
        Self {
            rating_function: RatingFunction::HeavyEdge,
            community_policy: CommunityPolicy::UseCommunities,
            heavy_node_penalty: HeavyNodePenalty::MultiplicativePenalty,
            acceptance_policy: AcceptancePolicy::BestPreferUnmatched,
        }
    }
}

/// Candidate generation on the coarsest hypergraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialPartitioningParams {
    /// Direct k-way attempts or recursive bisection of the coarsest hypergraph.
    #[serde(default = "default_initial_mode")]
    pub mode: Mode,
    /// Technique of each attempt.
    #[serde(default = "default_initial_algorithm")]
    pub algorithm: InitialPartitioningAlgorithm,
    /// Attempts per technique.
    #[serde(default = "default_nruns")]
    pub nruns: u32,
    /// Runs FM on every attempt before comparing.
    #[serde(default = "default_true")]
    pub refine_attempts: bool,
}

fn default_initial_mode() -> Mode {
    Mode::Recursive
}

fn default_initial_algorithm() -> InitialPartitioningAlgorithm {
    InitialPartitioningAlgorithm::Pool
}

fn default_nruns() -> u32 {
    20
}

impl Default for InitialPartitioningParams {
    fn default() -> Self {
        Self {
            mode: default_initial_mode(),
            algorithm: default_initial_algorithm(),
            nruns: default_nruns(),
            refine_attempts: true,
        }
    }
}

/// Refinement during uncoarsening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchParams {
    /// Refinement engine.
    #[serde(default = "default_refinement_algorithm")]
    pub algorithm: RefinementAlgorithm,
    /// Passes per level; `None` repeats while passes improve.
    #[serde(default)]
    pub iterations_per_level: Option<u32>,
    /// FM settings.
    #[serde(default)]
    pub fm: FmParams,
    /// Flow settings.
    #[serde(default)]
    pub flow: FlowParams,
}

fn default_refinement_algorithm() -> RefinementAlgorithm {
    RefinementAlgorithm::KwayFmFlow
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        Self {
            algorithm: default_refinement_algorithm(),
            iterations_per_level: None,
            fm: FmParams::default(),
            flow: FlowParams::default(),
        }
    }
}

/// FM settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmParams {
    /// Consecutive moves without a new best before the pass stops.
    pub max_number_of_fruitless_moves: u32,
    /// Sensitivity of the adaptive stopping rule.
    pub adaptive_stopping_alpha: f64,
    /// Stopping rule.
    pub stopping_rule: StoppingRule,
}

impl Default for FmParams {
    fn default() -> Self {
        Self {
            max_number_of_fruitless_moves: 350,
            adaptive_stopping_alpha: 1.0,
            stopping_rule: StoppingRule::AdaptiveOpt,
        }
    }
}

/// Flow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Maximum flow solver.
    pub algorithm: FlowAlgorithm,
    /// Network model.
    pub network: FlowNetworkKind,
    /// Region weight relaxation: each side may grow to `alpha * eps * avg` weight.
    pub alpha: f64,
    /// Maximum BFS depth of region growth from the boundary.
    pub beta: u32,
    /// Picks the most balanced among minimum cuts.
    pub use_most_balanced_minimum_cut: bool,
    /// Stops halving alpha after the first non-improving round.
    pub use_adaptive_alpha_stopping_rule: bool,
    /// Leaves hyperedges below the size threshold out of the network.
    pub ignore_small_hyperedge_cut: bool,
    /// Size threshold for `ignore_small_hyperedge_cut`.
    pub small_hyperedge_threshold: usize,
    /// Orders block pairs by past improvement.
    pub use_improvement_history: bool,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            algorithm: FlowAlgorithm::Dinic,
            network: FlowNetworkKind::Hybrid,
            alpha: 16.0,
            beta: 128,
            use_most_balanced_minimum_cut: true,
            use_adaptive_alpha_stopping_rule: true,
            ignore_small_hyperedge_cut: true,
            small_hyperedge_threshold: 3,
            use_improvement_history: true,
        }
    }
}

impl Context {
    /// Checks every cross-field constraint of the parameter set.
    pub fn validate(&self) -> Result<(), HgpError> {
        let partition = &self.partition;
        if partition.k < 2 {
            return Err(invalid("k-too-small", "k must be at least 2").with_context("k", partition.k));
        }
        match &partition.max_part_weights {
            Some(caps) => {
                if caps.len() != partition.k as usize {
                    return Err(invalid(
                        "part-weights-length",
                        "max_part_weights must contain exactly k entries",
                    )
                    .with_context("k", partition.k)
                    .with_context("len", caps.len()));
                }
                if let Some((block, cap)) = caps.iter().enumerate().find(|(_, cap)| **cap <= 0) {
                    return Err(invalid("non-positive-part-weight", "block caps must be positive")
                        .with_context("block", block)
                        .with_context("cap", cap));
                }
            }
            None => {
                if !(partition.epsilon >= 0.0) {
                    return Err(invalid("negative-epsilon", "epsilon must be non-negative")
                        .with_context("epsilon", partition.epsilon));
                }
            }
        }
        if let Some(limit) = partition.time_limit_secs {
            if !(limit > 0.0) {
                return Err(invalid("non-positive-time-limit", "time limit must be positive")
                    .with_context("time_limit_secs", limit));
            }
        }
        if partition.global_search_iterations == 0 {
            return Err(invalid(
                "zero-global-search-iterations",
                "global_search_iterations must be at least 1",
            ));
        }

        let community = &self.preprocessing.community_detection;
        if community.max_pass_iterations == 0 {
            return Err(invalid(
                "zero-pass-iterations",
                "community detection needs at least one pass",
            ));
        }
        if !(community.min_eps_improvement >= 0.0) {
            return Err(invalid(
                "negative-min-eps-improvement",
                "min_eps_improvement must be non-negative",
            )
            .with_context("min_eps_improvement", community.min_eps_improvement));
        }
        if community.sample_size == 0 {
            return Err(invalid("zero-sample-size", "label samples need a positive capacity"));
        }

        let coarsening = &self.coarsening;
        if coarsening.contraction_limit_multiplier == 0 {
            return Err(invalid(
                "non-positive-multiplier",
                "contraction_limit_multiplier must be positive",
            ));
        }
        if !(coarsening.max_allowed_weight_multiplier > 0.0) {
            return Err(invalid(
                "non-positive-multiplier",
                "max_allowed_weight_multiplier must be positive",
            )
            .with_context("value", coarsening.max_allowed_weight_multiplier));
        }

        if self.initial_partitioning.nruns == 0 {
            return Err(invalid("zero-nruns", "nruns must be at least 1"));
        }

        let local_search = &self.local_search;
        if !(local_search.fm.adaptive_stopping_alpha > 0.0) {
            return Err(invalid(
                "non-positive-stopping-alpha",
                "adaptive_stopping_alpha must be positive",
            )
            .with_context("value", local_search.fm.adaptive_stopping_alpha));
        }
        if !(local_search.flow.alpha >= 1.0) {
            return Err(invalid("flow-alpha-too-small", "flow alpha must be at least 1")
                .with_context("value", local_search.flow.alpha));
        }
        if local_search.algorithm.is_two_way()
            && partition.mode == Mode::DirectKway
            && partition.k != 2
        {
            return Err(invalid(
                "two-way-refiner-kway",
                "two-way refinement in direct mode requires k = 2",
            )
            .with_context("algorithm", local_search.algorithm)
            .with_context("k", partition.k)
            .with_hint("use kway_fm or kway_flow"));
        }
        Ok(())
    }

    /// Per-block weight caps for a hypergraph of the given total weight.
    ///
    /// Explicit caps win; otherwise every block gets
    /// `floor((1 + epsilon) * ceil(total / k))`.
    pub fn block_weight_caps(&self, total_weight: NodeWeight) -> Vec<NodeWeight> {
        let k = self.partition.k.max(1) as usize;
        if let Some(caps) = &self.partition.max_part_weights {
            return caps.clone();
        }
        let perfect = (total_weight + k as NodeWeight - 1) / k as NodeWeight;
        let cap = ((1.0 + self.partition.epsilon) * perfect as f64).floor() as NodeWeight;
        vec![cap; k]
    }

    /// Whether explicit per-block caps are configured.
    pub fn uses_custom_caps(&self) -> bool {
        self.partition.max_part_weights.is_some()
    }
}

fn invalid(code: &str, message: &str) -> HgpError {
    HgpError::Configuration(ErrorInfo::new(code, message))
}
