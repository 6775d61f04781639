use hgp_config::{
    Context, ContextBuilder, HeavyNodePenalty, Mode, Objective, RefinementAlgorithm,
};
use hgp_core::{ErrorClass, HgpError};

#[test]
fn default_context_is_valid() {
    let context = ContextBuilder::new().build().unwrap();
    assert_eq!(context, Context::default());
    assert_eq!(context.partition.k, 2);
    assert_eq!(context.partition.objective, Objective::Km1);
}

#[test]
fn k_below_two_is_rejected() {
    let err = ContextBuilder::new().k(1).build().unwrap_err();
    assert_eq!(err.code(), "k-too-small");
    assert_eq!(err.class(), ErrorClass::ConfigurationError);
}

#[test]
fn negative_epsilon_rejected_without_custom_caps() {
    let err = ContextBuilder::new().epsilon(-0.1).build().unwrap_err();
    assert_eq!(err.code(), "negative-epsilon");

    let context = ContextBuilder::new()
        .epsilon(-0.1)
        .max_part_weights(vec![10, 12])
        .build()
        .unwrap();
    assert!(context.uses_custom_caps());
}

#[test]
fn custom_caps_must_match_k() {
    let err = ContextBuilder::new()
        .k(3)
        .max_part_weights(vec![10, 12])
        .build()
        .unwrap_err();
    assert_eq!(err.code(), "part-weights-length");

    let err = ContextBuilder::new()
        .max_part_weights(vec![10, 0])
        .build()
        .unwrap_err();
    assert_eq!(err.code(), "non-positive-part-weight");
}

#[test]
fn two_way_refiner_requires_bipartition_in_direct_mode() {
    let err = ContextBuilder::new()
        .k(4)
        .refinement(RefinementAlgorithm::TwowayFm)
        .build()
        .unwrap_err();
    assert_eq!(err.code(), "two-way-refiner-kway");
    assert_eq!(err.info().hint.as_deref(), Some("use kway_fm or kway_flow"));

    ContextBuilder::new()
        .k(4)
        .mode(Mode::Recursive)
        .refinement(RefinementAlgorithm::TwowayFm)
        .build()
        .unwrap();
}

#[test]
fn string_setters_parse_nested_paths() {
    let mut builder = ContextBuilder::new();
    builder
        .set("partition.k", "4")
        .unwrap()
        .set("partition.epsilon", "0.1")
        .unwrap()
        .set("coarsening.rating.heavy_node_penalty", "no_penalty")
        .unwrap()
        .set("local_search.iterations_per_level", "3")
        .unwrap()
        .set("partition.max_part_weights", "[5, 5, 6, 7]")
        .unwrap();
    let context = builder.build().unwrap();
    assert_eq!(context.partition.k, 4);
    assert_eq!(
        context.coarsening.rating.heavy_node_penalty,
        HeavyNodePenalty::NoPenalty
    );
    assert_eq!(context.local_search.iterations_per_level, Some(3));
    assert_eq!(context.block_weight_caps(100), vec![5, 5, 6, 7]);
}

#[test]
fn unrecognised_strings_fail_instead_of_defaulting() {
    let mut builder = ContextBuilder::new();
    let err = builder
        .set("coarsening.rating.acceptance_policy", "best_ever")
        .unwrap_err();
    assert!(matches!(err, HgpError::Configuration(_)));
    assert_eq!(err.code(), "unknown-enum-value");
    assert_eq!(
        err.info().context.get("key").map(String::as_str),
        Some("coarsening.rating.acceptance_policy")
    );

    let err = builder.set("partition.k", "two").unwrap_err();
    assert_eq!(err.code(), "invalid-parameter-value");

    let err = builder.set("partition.colour", "red").unwrap_err();
    assert_eq!(err.code(), "unknown-parameter");
}

#[test]
fn epsilon_caps_round_down() {
    let context = ContextBuilder::new().epsilon(0.03).build().unwrap();
    assert_eq!(context.block_weight_caps(100), vec![51, 51]);
    let context = ContextBuilder::new().epsilon(0.0).build().unwrap();
    assert_eq!(context.block_weight_caps(5), vec![3, 3]);
}
