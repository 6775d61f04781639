use hgp_core::errors::{ErrorClass, ErrorInfo, HgpError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("node", 3)
        .with_context("reason", "example")
}

#[test]
fn configuration_error_surface() {
    let err = HgpError::Configuration(sample_info("k-too-small", "k must be at least 2"));
    assert_eq!(err.code(), "k-too-small");
    assert_eq!(err.class(), ErrorClass::ConfigurationError);
    assert!(err.info().context.contains_key("node"));
}

#[test]
fn precondition_family_groups_structural_errors() {
    for err in [
        HgpError::Precondition(sample_info("missing-block", "block 1 unused")),
        HgpError::InvalidOperation(sample_info("inactive-node", "node inactive")),
        HgpError::HistoryViolation(sample_info("out-of-order-uncontraction", "not latest")),
        HgpError::OutOfRange(sample_info("block-out-of-range", "block >= k")),
    ] {
        assert_eq!(err.class(), ErrorClass::PreconditionViolation);
    }
}

#[test]
fn exhaustion_family_is_not_configuration() {
    let stalled = HgpError::CoarseningStalled(sample_info("no-eligible-pair", "stalled"));
    let infeasible = HgpError::NoFeasiblePartition(sample_info("no-feasible-attempt", "none"));
    assert_eq!(stalled.class(), ErrorClass::AlgorithmicExhaustion);
    assert_eq!(infeasible.class(), ErrorClass::AlgorithmicExhaustion);
}

#[test]
fn display_includes_context_and_hint() {
    let err = HgpError::precondition("malformed-offsets", "offsets must start at zero")
        .with_context("first", 2);
    let rendered = err.to_string();
    assert!(rendered.contains("malformed-offsets"));
    assert!(rendered.contains("first=2"));

    let hinted = ErrorInfo::new("negative-epsilon", "epsilon < 0").with_hint("use 0.03");
    assert!(hinted.to_string().ends_with("hint: use 0.03"));
}

#[test]
fn errors_round_trip_through_json() {
    let err = HgpError::OutOfRange(sample_info("block-out-of-range", "block 7 >= k"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"OutOfRange\""));
    let decoded: HgpError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}

#[test]
fn hints_attach_to_any_family() {
    let err = HgpError::configuration("two-way-refiner-kway", "two-way refinement requires k = 2")
        .with_context("k", 4)
        .with_hint("use kway_fm");
    assert_eq!(err.class(), ErrorClass::ConfigurationError);
    assert_eq!(err.info().hint.as_deref(), Some("use kway_fm"));
    assert!(err.to_string().ends_with("hint: use kway_fm"));
}
