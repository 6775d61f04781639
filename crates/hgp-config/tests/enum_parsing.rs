use std::str::FromStr;

use hgp_config::{
    AcceptancePolicy, CoarseningAlgorithm, FlowAlgorithm, FlowNetworkKind, Mode,
    RefinementAlgorithm, StoppingRule,
};

#[test]
fn every_variant_round_trips_through_its_string() {
    for text in RefinementAlgorithm::VARIANTS {
        let parsed = RefinementAlgorithm::from_str(text).unwrap();
        assert_eq!(parsed.as_str(), *text);
        assert_eq!(parsed.to_string(), *text);
    }
    for text in AcceptancePolicy::VARIANTS {
        assert_eq!(AcceptancePolicy::from_str(text).unwrap().as_str(), *text);
    }
}

#[test]
fn binding_layer_spellings_are_accepted() {
    assert_eq!(Mode::from_str("direct").unwrap(), Mode::DirectKway);
    assert_eq!(Mode::from_str("recursive").unwrap(), Mode::Recursive);
    assert_eq!(
        CoarseningAlgorithm::from_str("heavy_lazy").unwrap(),
        CoarseningAlgorithm::HeavyLazy
    );
    assert_eq!(
        StoppingRule::from_str("adaptive_opt").unwrap(),
        StoppingRule::AdaptiveOpt
    );
    assert_eq!(
        FlowAlgorithm::from_str("edmond_karp").unwrap(),
        FlowAlgorithm::EdmondKarp
    );
    assert_eq!(
        FlowNetworkKind::from_str("hybrid").unwrap(),
        FlowNetworkKind::Hybrid
    );
}

#[test]
fn unknown_strings_carry_a_hint() {
    let err = FlowNetworkKind::from_str("wong").unwrap_err();
    assert_eq!(err.code(), "unknown-enum-value");
    let hint = err.info().hint.clone().unwrap();
    assert!(hint.contains("lawler"));
    assert!(Mode::from_str("Direct").is_err());
}

#[test]
fn refinement_helpers() {
    assert!(RefinementAlgorithm::KwayFmFlow.uses_fm());
    assert!(RefinementAlgorithm::KwayFmFlow.uses_flow());
    assert!(!RefinementAlgorithm::DoNothing.uses_fm());
    assert!(RefinementAlgorithm::TwowayFlow.is_two_way());
    assert_eq!(
        RefinementAlgorithm::TwowayFm.kway_counterpart(),
        RefinementAlgorithm::KwayFm
    );
}
