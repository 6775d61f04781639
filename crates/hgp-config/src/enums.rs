//! Closed enumerations selected by string-valued parameters.

use std::fmt;
use std::str::FromStr;

use hgp_core::{ErrorInfo, HgpError};
use serde::{Deserialize, Serialize};

macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted spelling, in declaration order.
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            /// Canonical string form accepted by [`FromStr`].
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = HgpError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $text => Ok($name::$variant), )+
                    other => Err(unknown_value(stringify!($name), other, Self::VARIANTS)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

fn unknown_value(kind: &str, value: &str, accepted: &[&str]) -> HgpError {
    HgpError::Configuration(
        ErrorInfo::new(
            "unknown-enum-value",
            format!("unrecognised {kind} value '{value}'"),
        )
        .with_context("kind", kind)
        .with_context("value", value)
        .with_hint(format!("expected one of: {}", accepted.join(", "))),
    )
}

config_enum! {
    /// Whether k-way partitions are computed directly or by recursive bisection.
    Mode {
        /// Recursive bisection.
        Recursive => "recursive",
        /// Direct k-way partitioning.
        DirectKway => "direct",
    }
}

config_enum! {
    /// Objective minimised by the partitioner.
    Objective {
        /// Total weight of hyperedges spanning more than one block.
        Cut => "cut",
        /// Connectivity minus one, summed with hyperedge weights.
        Km1 => "km1",
    }
}

config_enum! {
    /// Hyperedge weighting used by community detection.
    EdgeWeightKind {
        /// Every hyperedge counts once.
        Uniform => "uniform",
        /// The hyperedge weight is used as is.
        NonUniform => "non_uniform",
        /// Weight divided by the hyperedge size.
        Degree => "degree",
    }
}

config_enum! {
    /// Coarsening driver.
    CoarseningAlgorithm {
        /// Pass based matching, every node contracted at most once per pass.
        MlStyle => "ml_style",
        /// Global priority queue, neighbours re-rated after each contraction.
        HeavyFull => "heavy_full",
        /// Global priority queue, stale ratings refreshed on extraction.
        HeavyLazy => "heavy_lazy",
    }
}

config_enum! {
    /// Rating score of a candidate contraction pair.
    RatingFunction {
        /// Sum of `w(e) / (|e| - 1)` over shared hyperedges.
        HeavyEdge => "heavy_edge",
        /// Number of shared hyperedges weighted by `1 / (|e| - 1)`.
        EdgeFrequency => "edge_frequency",
    }
}

config_enum! {
    /// Whether coarsening is restricted to same-community pairs.
    CommunityPolicy {
        /// Only pairs with equal community label are eligible.
        UseCommunities => "use_communities",
        /// Community labels are ignored.
        IgnoreCommunities => "ignore_communities",
    }
}

config_enum! {
    /// Discount applied to ratings between heavy nodes.
    HeavyNodePenalty {
        /// Ratings are used unchanged.
        NoPenalty => "no_penalty",
        /// Rating divided by the product of both node weights.
        MultiplicativePenalty => "multiplicative_penalty",
        /// Rating divided by the sum of both node weights.
        AdditivePenalty => "additive_penalty",
    }
}

config_enum! {
    /// Tie breaking among equally rated neighbours.
    AcceptancePolicy {
        /// First best-rated neighbour in visit order.
        Best => "best",
        /// Prefer neighbours that were not contracted yet.
        BestPreferUnmatched => "best_prefer_unmatched",
        /// Prefer the lightest combined weight.
        LightestCombined => "lightest_combined",
    }
}

config_enum! {
    /// Initial partitioning technique.
    InitialPartitioningAlgorithm {
        /// Uniformly random assignment under the caps.
        Random => "random",
        /// Breadth first growth from random seeds.
        Bfs => "bfs",
        /// Gain driven greedy growth from random seeds.
        GreedyGrowing => "greedy_growing",
        /// Every technique, `nruns` attempts each.
        Pool => "pool",
    }
}

config_enum! {
    /// Local search engine applied during uncoarsening.
    RefinementAlgorithm {
        /// Two-way FM; requires k = 2 in direct mode.
        TwowayFm => "twoway_fm",
        /// k-way FM.
        KwayFm => "kway_fm",
        /// Two-way flow refinement; requires k = 2 in direct mode.
        TwowayFlow => "twoway_flow",
        /// k-way flow refinement over adjacent block pairs.
        KwayFlow => "kway_flow",
        /// Flow refinement followed by k-way FM.
        KwayFmFlow => "kway_fm_flow",
        /// No refinement.
        DoNothing => "do_nothing",
    }
}

impl RefinementAlgorithm {
    /// Whether the engine runs FM passes.
    pub fn uses_fm(&self) -> bool {
        matches!(
            self,
            RefinementAlgorithm::TwowayFm
                | RefinementAlgorithm::KwayFm
                | RefinementAlgorithm::KwayFmFlow
        )
    }

    /// Whether the engine runs flow rounds.
    pub fn uses_flow(&self) -> bool {
        matches!(
            self,
            RefinementAlgorithm::TwowayFlow
                | RefinementAlgorithm::KwayFlow
                | RefinementAlgorithm::KwayFmFlow
        )
    }

    /// Whether the engine only supports bipartitions.
    pub fn is_two_way(&self) -> bool {
        matches!(
            self,
            RefinementAlgorithm::TwowayFm | RefinementAlgorithm::TwowayFlow
        )
    }

    /// k-way engine equivalent to a two-way engine.
    pub fn kway_counterpart(&self) -> Self {
        match self {
            RefinementAlgorithm::TwowayFm => RefinementAlgorithm::KwayFm,
            RefinementAlgorithm::TwowayFlow => RefinementAlgorithm::KwayFlow,
            other => *other,
        }
    }
}

config_enum! {
    /// FM stopping rule.
    StoppingRule {
        /// Stop after the fruitless move limit only.
        Simple => "simple",
        /// Random walk test on observed gains, plus the fruitless move limit.
        AdaptiveOpt => "adaptive_opt",
    }
}

config_enum! {
    /// Maximum flow solver used by flow refinement.
    FlowAlgorithm {
        /// Shortest augmenting paths.
        EdmondKarp => "edmond_karp",
        /// Blocking flows on BFS level graphs.
        Dinic => "dinic",
    }
}

config_enum! {
    /// Flow network model of a hypergraph region.
    FlowNetworkKind {
        /// Two auxiliary vertices per hyperedge.
        Lawler => "lawler",
        /// Two-pin hyperedges become direct arcs, larger ones use Lawler vertices.
        Hybrid => "hybrid",
    }
}
