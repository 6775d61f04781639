//! Validated construction of a [`Context`].

use std::str::FromStr;

use hgp_core::{ErrorInfo, HgpError, NodeWeight};

use crate::context::Context;
use crate::enums::{CoarseningAlgorithm, Mode, Objective, RefinementAlgorithm};

/// Mutable staging area for a [`Context`].
///
/// String values are parsed once, when they are set; an unrecognised value
/// fails immediately instead of falling back to a default. [`build`]
/// validates the combined parameter set.
///
/// [`build`]: ContextBuilder::build
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    context: Context,
}

impl ContextBuilder {
    /// Starts from the default parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing context.
    pub fn from_context(context: Context) -> Self {
        Self { context }
    }

    /// Sets the number of blocks.
    pub fn k(mut self, k: u32) -> Self {
        self.context.partition.k = k;
        self
    }

    /// Sets the allowed imbalance.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.context.partition.epsilon = epsilon;
        self
    }

    /// Sets the master seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.context.partition.seed = seed;
        self
    }

    /// Sets the partitioning mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.context.partition.mode = mode;
        self
    }

    /// Sets the objective.
    pub fn objective(mut self, objective: Objective) -> Self {
        self.context.partition.objective = objective;
        self
    }

    /// Sets the number of V-cycle rounds.
    pub fn global_search_iterations(mut self, rounds: u32) -> Self {
        self.context.partition.global_search_iterations = rounds;
        self
    }

    /// Sets the cooperative time limit.
    pub fn time_limit_secs(mut self, limit: f64) -> Self {
        self.context.partition.time_limit_secs = Some(limit);
        self
    }

    /// Sets explicit per-block caps.
    pub fn max_part_weights(mut self, caps: Vec<NodeWeight>) -> Self {
        self.context.partition.max_part_weights = Some(caps);
        self
    }

    /// Enables or disables community detection.
    pub fn community_detection(mut self, enabled: bool) -> Self {
        self.context.preprocessing.enable_community_detection = enabled;
        self
    }

    /// Sets the coarsening driver.
    pub fn coarsening_algorithm(mut self, algorithm: CoarseningAlgorithm) -> Self {
        self.context.coarsening.algorithm = algorithm;
        self
    }

    /// Sets the contraction limit multiplier.
    pub fn contraction_limit_multiplier(mut self, multiplier: u32) -> Self {
        self.context.coarsening.contraction_limit_multiplier = multiplier;
        self
    }

    /// Sets the number of initial partitioning attempts.
    pub fn nruns(mut self, nruns: u32) -> Self {
        self.context.initial_partitioning.nruns = nruns;
        self
    }

    /// Sets the refinement engine.
    pub fn refinement(mut self, algorithm: RefinementAlgorithm) -> Self {
        self.context.local_search.algorithm = algorithm;
        self
    }

    /// Read access to the staged context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Sets a parameter addressed by its dotted path, parsing `value`.
    ///
    /// Paths mirror the serialized layout, e.g. `partition.k`,
    /// `coarsening.rating.heavy_node_penalty` or `local_search.flow.network`.
    /// Optional numeric parameters accept `none` to clear them;
    /// `partition.max_part_weights` takes a JSON array.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self, HgpError> {
        let ctx = &mut self.context;
        match key {
            "partition.mode" => ctx.partition.mode = parse_enum(key, value)?,
            "partition.objective" => ctx.partition.objective = parse_enum(key, value)?,
            "partition.k" => ctx.partition.k = parse_value(key, value)?,
            "partition.epsilon" => ctx.partition.epsilon = parse_value(key, value)?,
            "partition.seed" => ctx.partition.seed = parse_value(key, value)?,
            "partition.global_search_iterations" => {
                ctx.partition.global_search_iterations = parse_value(key, value)?
            }
            "partition.time_limit_secs" => {
                ctx.partition.time_limit_secs = parse_optional(key, value)?
            }
            "partition.hyperedge_size_threshold" => {
                ctx.partition.hyperedge_size_threshold = parse_optional(key, value)?
            }
            "partition.max_part_weights" => {
                ctx.partition.max_part_weights = if value.trim() == "none" {
                    None
                } else {
                    Some(serde_json::from_str(value).map_err(|err| {
                        parse_error(key, value, err.to_string())
                    })?)
                }
            }
            "preprocessing.enable_community_detection" => {
                ctx.preprocessing.enable_community_detection = parse_value(key, value)?
            }
            "preprocessing.enable_min_hash_sparsifier" => {
                ctx.preprocessing.enable_min_hash_sparsifier = parse_value(key, value)?
            }
            "preprocessing.community_detection.enable_in_initial_partitioning" => {
                ctx.preprocessing
                    .community_detection
                    .enable_in_initial_partitioning = parse_value(key, value)?
            }
            "preprocessing.community_detection.reuse_communities" => {
                ctx.preprocessing.community_detection.reuse_communities =
                    parse_value(key, value)?
            }
            "preprocessing.community_detection.edge_weight" => {
                ctx.preprocessing.community_detection.edge_weight = parse_enum(key, value)?
            }
            "preprocessing.community_detection.max_pass_iterations" => {
                ctx.preprocessing.community_detection.max_pass_iterations =
                    parse_value(key, value)?
            }
            "preprocessing.community_detection.min_eps_improvement" => {
                ctx.preprocessing.community_detection.min_eps_improvement =
                    parse_value(key, value)?
            }
            "preprocessing.community_detection.sample_threshold" => {
                ctx.preprocessing.community_detection.sample_threshold = parse_value(key, value)?
            }
            "preprocessing.community_detection.sample_size" => {
                ctx.preprocessing.community_detection.sample_size = parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.max_hyperedge_size" => {
                ctx.preprocessing.min_hash_sparsifier.max_hyperedge_size =
                    parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.max_cluster_size" => {
                ctx.preprocessing.min_hash_sparsifier.max_cluster_size = parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.min_cluster_size" => {
                ctx.preprocessing.min_hash_sparsifier.min_cluster_size = parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.num_hash_functions" => {
                ctx.preprocessing.min_hash_sparsifier.num_hash_functions =
                    parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.combined_num_hash_functions" => {
                ctx.preprocessing
                    .min_hash_sparsifier
                    .combined_num_hash_functions = parse_value(key, value)?
            }
            "preprocessing.min_hash_sparsifier.min_median_he_size" => {
                ctx.preprocessing.min_hash_sparsifier.min_median_he_size =
                    parse_value(key, value)?
            }
            "coarsening.algorithm" => ctx.coarsening.algorithm = parse_enum(key, value)?,
            "coarsening.contraction_limit_multiplier" => {
                ctx.coarsening.contraction_limit_multiplier = parse_value(key, value)?
            }
            "coarsening.max_allowed_weight_multiplier" => {
                ctx.coarsening.max_allowed_weight_multiplier = parse_value(key, value)?
            }
            "coarsening.rating.rating_function" => {
                ctx.coarsening.rating.rating_function = parse_enum(key, value)?
            }
            "coarsening.rating.community_policy" => {
                ctx.coarsening.rating.community_policy = parse_enum(key, value)?
            }
            "coarsening.rating.heavy_node_penalty" => {
                ctx.coarsening.rating.heavy_node_penalty = parse_enum(key, value)?
            }
            "coarsening.rating.acceptance_policy" => {
                ctx.coarsening.rating.acceptance_policy = parse_enum(key, value)?
            }
            "initial_partitioning.mode" => ctx.initial_partitioning.mode = parse_enum(key, value)?,
            "initial_partitioning.algorithm" => {
                ctx.initial_partitioning.algorithm = parse_enum(key, value)?
            }
            "initial_partitioning.nruns" => {
                ctx.initial_partitioning.nruns = parse_value(key, value)?
            }
            "initial_partitioning.refine_attempts" => {
                ctx.initial_partitioning.refine_attempts = parse_value(key, value)?
            }
            "local_search.algorithm" => ctx.local_search.algorithm = parse_enum(key, value)?,
            "local_search.iterations_per_level" => {
                ctx.local_search.iterations_per_level = parse_optional(key, value)?
            }
            "local_search.fm.max_number_of_fruitless_moves" => {
                ctx.local_search.fm.max_number_of_fruitless_moves = parse_value(key, value)?
            }
            "local_search.fm.adaptive_stopping_alpha" => {
                ctx.local_search.fm.adaptive_stopping_alpha = parse_value(key, value)?
            }
            "local_search.fm.stopping_rule" => {
                ctx.local_search.fm.stopping_rule = parse_enum(key, value)?
            }
            "local_search.flow.algorithm" => {
                ctx.local_search.flow.algorithm = parse_enum(key, value)?
            }
            "local_search.flow.network" => ctx.local_search.flow.network = parse_enum(key, value)?,
            "local_search.flow.alpha" => ctx.local_search.flow.alpha = parse_value(key, value)?,
            "local_search.flow.beta" => ctx.local_search.flow.beta = parse_value(key, value)?,
            "local_search.flow.use_most_balanced_minimum_cut" => {
                ctx.local_search.flow.use_most_balanced_minimum_cut = parse_value(key, value)?
            }
            "local_search.flow.use_adaptive_alpha_stopping_rule" => {
                ctx.local_search.flow.use_adaptive_alpha_stopping_rule = parse_value(key, value)?
            }
            "local_search.flow.ignore_small_hyperedge_cut" => {
                ctx.local_search.flow.ignore_small_hyperedge_cut = parse_value(key, value)?
            }
            "local_search.flow.small_hyperedge_threshold" => {
                ctx.local_search.flow.small_hyperedge_threshold = parse_value(key, value)?
            }
            "local_search.flow.use_improvement_history" => {
                ctx.local_search.flow.use_improvement_history = parse_value(key, value)?
            }
            other => {
                return Err(HgpError::Configuration(
                    ErrorInfo::new("unknown-parameter", format!("unknown parameter '{other}'"))
                        .with_context("key", other),
                ))
            }
        }
        Ok(self)
    }

    /// Validates the staged parameters and freezes them.
    pub fn build(self) -> Result<Context, HgpError> {
        self.context.validate()?;
        Ok(self.context)
    }
}

fn parse_enum<T>(key: &str, value: &str) -> Result<T, HgpError>
where
    T: FromStr<Err = HgpError>,
{
    T::from_str(value.trim()).map_err(|err| err.with_context("key", key))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, HgpError>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| parse_error(key, value, err.to_string()))
}

fn parse_optional<T>(key: &str, value: &str) -> Result<Option<T>, HgpError>
where
    T: FromStr,
    T::Err: ToString,
{
    if value.trim() == "none" {
        Ok(None)
    } else {
        parse_value(key, value).map(Some)
    }
}

fn parse_error(key: &str, value: &str, reason: String) -> HgpError {
    HgpError::Configuration(
        ErrorInfo::new("invalid-parameter-value", reason)
            .with_context("key", key)
            .with_context("value", value),
    )
}
